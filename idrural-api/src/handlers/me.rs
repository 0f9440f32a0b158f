use axum::{
    extract::State,
    http::{header, HeaderMap},
    Extension, Json,
};
use service_core::error::AppError;
use service_core::middleware::tracing::RequestId;

use crate::{models::EnrichedIdentity, AppState};

/// `GET /auth/me`: who the bearer token belongs to, and where they work.
#[axum::debug_handler]
pub async fn get_me(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    headers: HeaderMap,
) -> Result<Json<EnrichedIdentity>, AppError> {
    let request_id = request_id.as_ref().map(|Extension(RequestId(id))| id.as_str());

    let identity = state
        .resolver
        .resolve(headers.get(header::AUTHORIZATION), request_id)
        .await?;

    Ok(Json(identity))
}
