use serde::{Deserialize, Serialize};

use super::Affiliation;

/// User record as issued by the auth backend. Only the fields this service
/// reads are modelled.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Body of `GET /auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedIdentity {
    pub id: String,
    pub email: Option<String>,
    pub municipio: String,
    pub uf: String,
    pub codigo_ibge: i64,
    pub perfil: String,
}

impl EnrichedIdentity {
    pub fn compose(identity: Identity, affiliation: Affiliation) -> Self {
        Self {
            id: identity.id,
            email: identity.email,
            municipio: affiliation.municipality.nome,
            uf: affiliation.municipality.uf,
            codigo_ibge: affiliation.municipality.codigo_ibge,
            perfil: affiliation.profile.nome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Municipality, Profile};

    #[test]
    fn identity_ignores_extra_backend_fields() {
        let identity: Identity = serde_json::from_value(serde_json::json!({
            "id": "u1",
            "aud": "authenticated",
            "email": "a@b.com",
            "app_metadata": { "provider": "email" }
        }))
        .unwrap();

        assert_eq!(identity.id, "u1");
        assert_eq!(identity.email.as_deref(), Some("a@b.com"));
    }

    #[test]
    fn composed_identity_always_has_every_field() {
        let enriched = EnrichedIdentity::compose(
            Identity {
                id: "u2".into(),
                email: None,
            },
            Affiliation {
                municipality: Municipality {
                    nome: "Sobral".into(),
                    uf: "CE".into(),
                    codigo_ibge: 2312908,
                },
                profile: Profile {
                    nome: "tecnico".into(),
                    descricao: None,
                },
            },
        );

        assert_eq!(
            serde_json::to_value(&enriched).unwrap(),
            serde_json::json!({
                "id": "u2",
                "email": null,
                "municipio": "Sobral",
                "uf": "CE",
                "codigo_ibge": 2312908,
                "perfil": "tecnico"
            })
        );
    }
}
