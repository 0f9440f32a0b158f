use crate::error::AppError;
use config::{Config as Cfg, Environment, File};
use serde::Deserialize;

/// Settings every service shares, read from `configuration.*` and the
/// process environment (`PORT=8080` maps to `port`).
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    3000
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(
                Environment::default()
                    .try_parsing(true)
                    .ignore_empty(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
