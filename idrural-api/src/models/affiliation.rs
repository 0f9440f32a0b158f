use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Municipality {
    pub nome: String,
    pub uf: String,
    pub codigo_ibge: i64,
}

/// Role label attached to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub nome: String,
    #[serde(default)]
    pub descricao: Option<String>,
}

/// A user's link to exactly one municipality and one profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Affiliation {
    pub municipality: Municipality,
    pub profile: Profile,
}
