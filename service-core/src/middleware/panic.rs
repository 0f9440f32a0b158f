use crate::error::AppError;
use axum::response::{IntoResponse, Response};
use std::any::Any;

/// Response for a handler that panicked. Plug into
/// `tower_http::catch_panic::CatchPanicLayer::custom`.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    AppError::InternalError(anyhow::anyhow!("handler panicked: {}", detail)).into_response()
}
