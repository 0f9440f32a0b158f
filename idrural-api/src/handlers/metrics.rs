use axum::{extract::State, response::IntoResponse};
use service_core::error::AppError;

use crate::AppState;

pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let handle = state
        .metrics
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Metrics are not enabled".to_string()))?;

    Ok(handle.render())
}
