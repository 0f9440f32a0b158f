use reqwest::Url;
use secrecy::{ExposeSecret, Secret};
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub common: core_config::Config,
    /// Free-form label reported by the health check (`NODE_ENV`).
    pub environment: String,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub supabase: SupabaseConfig,
}

/// Connection settings for the hosted identity and database backend.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: Url,
    pub service_role_key: Secret<String>,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Self::from_source(common, |key| env::var(key).ok())
    }

    fn from_source<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: Option<&str>| get_var(&lookup, key, default);

        let timeout_seconds: u64 = get("SUPABASE_TIMEOUT_SECONDS", Some("10"))?
            .parse()
            .map_err(|e: std::num::ParseIntError| {
                AppError::ConfigError(anyhow::anyhow!(
                    "SUPABASE_TIMEOUT_SECONDS is not a number: {}",
                    e
                ))
            })?;

        let raw_url = get("SUPABASE_URL", None)?;
        let url = Url::parse(raw_url.trim_end_matches('/')).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("SUPABASE_URL is not a valid URL: {}", e))
        })?;

        let config = ApiConfig {
            common,
            environment: get("NODE_ENV", Some("development"))?,
            service_name: get("SERVICE_NAME", Some("IDRural API"))?,
            service_version: get("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")))?,
            log_level: get("LOG_LEVEL", Some("info"))?,
            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|v| !v.is_empty()),
            supabase: SupabaseConfig {
                url,
                service_role_key: Secret::new(get("SUPABASE_SERVICE_ROLE_KEY", None)?),
                timeout: Duration::from_secs(timeout_seconds),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if !matches!(self.supabase.url.scheme(), "http" | "https") {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "SUPABASE_URL must use http or https, got '{}'",
                self.supabase.url.scheme()
            )));
        }

        if self.supabase.service_role_key.expose_secret().trim().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "SUPABASE_SERVICE_ROLE_KEY must not be empty"
            )));
        }

        if self.supabase.timeout.is_zero() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "SUPABASE_TIMEOUT_SECONDS must be positive"
            )));
        }

        Ok(())
    }
}

fn get_var<F>(lookup: &F, key: &str, default: Option<&str>) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).filter(|val| !val.is_empty()) {
        Some(val) => Ok(val),
        None => match default {
            Some(def) => Ok(def.to_string()),
            None => Err(AppError::ConfigError(anyhow::anyhow!(
                "{} is required but not set",
                key
            ))),
        },
    }
}
