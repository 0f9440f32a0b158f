//! Test helpers: in-memory backends, state builder, request runner.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use idrural_api::{
    build_router,
    config::{ApiConfig, SupabaseConfig},
    models::{Municipality, Profile},
    services::{
        AffiliationStore, AuthProvider, IdentityResolver, MockAffiliationStore, MockAuthProvider,
    },
    AppState,
};
use secrecy::Secret;
use service_core::config::Config;
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

pub fn test_config(supabase_url: &str) -> ApiConfig {
    ApiConfig {
        common: Config { port: 3000 },
        environment: "test".to_string(),
        service_name: "IDRural API".to_string(),
        service_version: "0.0.0-test".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        supabase: SupabaseConfig {
            url: supabase_url.parse().expect("valid test URL"),
            service_role_key: Secret::new("test-service-role-key".to_string()),
            timeout: Duration::from_secs(2),
        },
    }
}

pub fn campinas() -> Municipality {
    Municipality {
        nome: "Campinas".to_string(),
        uf: "SP".to_string(),
        codigo_ibge: 3509502,
    }
}

pub fn gestor() -> Profile {
    Profile {
        nome: "gestor".to_string(),
        descricao: Some("Gestor municipal".to_string()),
    }
}

/// The `abc123` → `u1` → Campinas/gestor fixture.
pub fn seeded_backends() -> (Arc<MockAuthProvider>, Arc<MockAffiliationStore>) {
    let auth = MockAuthProvider::new()
        .with_user("abc123", "u1", Some("a@b.com"))
        .with_user("orphan-token", "u2", Some("orphan@b.com"));
    let store = MockAffiliationStore::new().with_affiliation("u1", campinas(), gestor());
    (Arc::new(auth), Arc::new(store))
}

pub fn app_with(auth: Arc<dyn AuthProvider>, store: Arc<dyn AffiliationStore>) -> Router {
    build_router(AppState {
        config: test_config("http://127.0.0.1:9"),
        resolver: IdentityResolver::new(auth, store),
        metrics: None,
    })
}

pub async fn send(app: &Router, uri: &str, authorization: Option<&str>) -> Response<Body> {
    let mut request = Request::builder().uri(uri);
    if let Some(value) = authorization {
        request = request.header("authorization", value);
    }

    app.clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn json_body(response: Response<Body>) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).expect("response body is JSON");
    (status, body)
}
