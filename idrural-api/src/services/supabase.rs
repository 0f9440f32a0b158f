//! Client for the hosted backend: GoTrue for token validation and
//! PostgREST for the affiliation lookup, both behind one base URL and one
//! service key.

use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use service_core::error::AppError;
use service_core::observability::PropagateTraceExt;
use tracing::instrument;

use super::{AffiliationStore, AuthError, AuthProvider, Credential, StoreError};
use crate::config::SupabaseConfig;
use crate::models::{Affiliation, Identity, Municipality, Profile};

const USER_PATH: &str = "/auth/v1/user";
const AFFILIATION_PATH: &str = "/rest/v1/usuarios";
const AFFILIATION_SELECT: &str =
    "municipio:municipios(nome,uf,codigo_ibge),perfil:perfis(nome,descricao)";
/// Asks PostgREST for exactly one object instead of an array.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Built once at startup and shared read-only by every request.
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_role_key: Secret<String>,
}

#[derive(Debug, Deserialize)]
struct AffiliationRow {
    municipio: Option<Municipality>,
    perfil: Option<Profile>,
}

#[derive(Debug, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
}

impl SupabaseClient {
    pub fn new(config: &SupabaseConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.url.as_str().trim_end_matches('/').to_string(),
            service_role_key: config.service_role_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl AuthProvider for SupabaseClient {
    #[instrument(skip_all)]
    async fn get_user(
        &self,
        credential: &Credential,
        request_id: Option<&str>,
    ) -> Result<Identity, AuthError> {
        let response = self
            .client
            .get(self.endpoint(USER_PATH))
            .header("apikey", self.service_role_key.expose_secret())
            .bearer_auth(credential.token())
            .propagate_trace(request_id)
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(anyhow::Error::new(e.without_url())))?;

        let status = response.status();
        if status.is_server_error() {
            let message = error_message(response).await;
            return Err(AuthError::Unavailable(anyhow::anyhow!(
                "auth backend answered {}: {}",
                status,
                message
            )));
        }
        if !status.is_success() {
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                message: error_message(response).await,
            });
        }

        response
            .json::<Identity>()
            .await
            .map_err(|e| AuthError::Malformed(anyhow::Error::new(e.without_url())))
    }
}

#[async_trait]
impl AffiliationStore for SupabaseClient {
    #[instrument(skip(self, request_id))]
    async fn find_affiliation(
        &self,
        user_id: &str,
        request_id: Option<&str>,
    ) -> Result<Affiliation, StoreError> {
        let filter = format!("eq.{}", user_id);
        let response = self
            .client
            .get(self.endpoint(AFFILIATION_PATH))
            .query(&[("select", AFFILIATION_SELECT), ("id", filter.as_str())])
            .header("apikey", self.service_role_key.expose_secret())
            .bearer_auth(self.service_role_key.expose_secret())
            .header(header::ACCEPT, SINGLE_OBJECT)
            .propagate_trace(request_id)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(anyhow::Error::new(e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(query_error(status, response).await);
        }

        let row = response
            .json::<AffiliationRow>()
            .await
            .map_err(|e| StoreError::Malformed(anyhow::Error::new(e.without_url())))?;

        Ok(Affiliation {
            municipality: row.municipio.ok_or(StoreError::Incomplete("municipality"))?,
            profile: row.perfil.ok_or(StoreError::Incomplete("profile"))?,
        })
    }
}

/// Best human-readable message from a GoTrue error body.
async fn error_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|json| {
            ["msg", "message", "error_description", "error"]
                .iter()
                .find_map(|key| json.get(key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| status.to_string())
}

async fn query_error(status: StatusCode, response: Response) -> StoreError {
    let body = response.text().await.unwrap_or_default();

    match serde_json::from_str::<PostgrestError>(&body) {
        Ok(PostgrestError {
            code,
            message: Some(message),
        }) => StoreError::Query { code, message },
        _ => StoreError::Query {
            code: None,
            message: format!("affiliation query failed with status {}", status),
        },
    }
}
