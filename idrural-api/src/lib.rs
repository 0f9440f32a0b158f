pub mod config;
pub mod handlers;
pub mod models;
pub mod services;

use metrics_exporter_prometheus::PrometheusHandle;
use service_core::axum::{middleware::from_fn, routing::get, Router};
use service_core::middleware::{
    metrics::metrics_middleware, panic::handle_panic,
    security_headers::security_headers_middleware, tracing::request_id_middleware,
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::config::ApiConfig;
use crate::services::IdentityResolver;

#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub resolver: IdentityResolver,
    /// `None` when no Prometheus recorder is installed (tests).
    pub metrics: Option<PrometheusHandle>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health_check))
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        .route("/auth/me", get(handlers::get_me))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &service_core::axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
}
