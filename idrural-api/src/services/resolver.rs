use axum::http::HeaderValue;
use metrics::counter;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{AffiliationStore, AuthError, AuthProvider, Credential, ResolutionError};
use crate::models::EnrichedIdentity;

/// Turns an `Authorization` header into the caller's identity plus
/// municipality and profile. Holds no per-request state; clones share the
/// same backend clients.
#[derive(Clone)]
pub struct IdentityResolver {
    auth: Arc<dyn AuthProvider>,
    store: Arc<dyn AffiliationStore>,
}

impl IdentityResolver {
    pub fn new(auth: Arc<dyn AuthProvider>, store: Arc<dyn AffiliationStore>) -> Self {
        Self { auth, store }
    }

    #[instrument(skip_all, fields(user_id = tracing::field::Empty))]
    pub async fn resolve(
        &self,
        authorization: Option<&HeaderValue>,
        request_id: Option<&str>,
    ) -> Result<EnrichedIdentity, ResolutionError> {
        let result = self.resolve_inner(authorization, request_id).await;

        let outcome = match &result {
            Ok(_) => "resolved",
            Err(e) => e.outcome(),
        };
        counter!("identity_resolutions_total", "outcome" => outcome).increment(1);

        result
    }

    async fn resolve_inner(
        &self,
        authorization: Option<&HeaderValue>,
        request_id: Option<&str>,
    ) -> Result<EnrichedIdentity, ResolutionError> {
        let credential = Credential::from_authorization(authorization)?;

        let identity = match self.auth.get_user(&credential, request_id).await {
            Ok(identity) => identity,
            Err(AuthError::Malformed(e)) => {
                return Err(ResolutionError::InternalFailure(
                    e.context("auth backend answered with an unreadable user"),
                ));
            }
            Err(e) => {
                warn!(error = %e, "Token validation failed");
                return Err(ResolutionError::InvalidCredential);
            }
        };

        tracing::Span::current().record("user_id", identity.id.as_str());

        let affiliation = self
            .store
            .find_affiliation(&identity.id, request_id)
            .await
            .map_err(|e| {
                warn!(error = %e, "No affiliation found for user");
                ResolutionError::NotAffiliated {
                    details: e.to_string(),
                }
            })?;

        info!(
            municipio = %affiliation.municipality.nome,
            perfil = %affiliation.profile.nome,
            "Identity resolved"
        );

        Ok(EnrichedIdentity::compose(identity, affiliation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Municipality, Profile};
    use crate::services::{MockAffiliationStore, MockAuthProvider};

    fn campinas() -> (Municipality, Profile) {
        (
            Municipality {
                nome: "Campinas".into(),
                uf: "SP".into(),
                codigo_ibge: 3509502,
            },
            Profile {
                nome: "gestor".into(),
                descricao: Some("Gestor municipal".into()),
            },
        )
    }

    fn bearer(token: &str) -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
    }

    fn resolver(
        auth: MockAuthProvider,
        store: MockAffiliationStore,
    ) -> (IdentityResolver, Arc<MockAuthProvider>, Arc<MockAffiliationStore>) {
        let auth = Arc::new(auth);
        let store = Arc::new(store);
        (
            IdentityResolver::new(auth.clone(), store.clone()),
            auth,
            store,
        )
    }

    #[tokio::test]
    async fn resolves_affiliated_user() {
        let (municipality, profile) = campinas();
        let (resolver, _, _) = resolver(
            MockAuthProvider::new().with_user("abc123", "u1", Some("a@b.com")),
            MockAffiliationStore::new().with_affiliation("u1", municipality, profile),
        );

        let enriched = resolver
            .resolve(Some(&bearer("abc123")), None)
            .await
            .unwrap();

        assert_eq!(
            enriched,
            EnrichedIdentity {
                id: "u1".into(),
                email: Some("a@b.com".into()),
                municipio: "Campinas".into(),
                uf: "SP".into(),
                codigo_ibge: 3509502,
                perfil: "gestor".into(),
            }
        );
    }

    #[tokio::test]
    async fn missing_header_skips_backend() {
        let (resolver, auth, store) =
            resolver(MockAuthProvider::new(), MockAffiliationStore::new());

        let err = resolver.resolve(None, None).await.unwrap_err();

        assert!(matches!(err, ResolutionError::MissingCredential));
        assert_eq!(auth.calls(), 0);
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn malformed_scheme_skips_backend() {
        let (resolver, auth, _) = resolver(
            MockAuthProvider::new().with_user("abc123", "u1", None),
            MockAffiliationStore::new(),
        );

        let header = HeaderValue::from_static("abc123");
        let err = resolver.resolve(Some(&header), None).await.unwrap_err();

        assert!(matches!(err, ResolutionError::InvalidCredential));
        assert_eq!(auth.calls(), 0);
    }

    #[tokio::test]
    async fn rejected_token_is_invalid_credential() {
        let (resolver, _, store) =
            resolver(MockAuthProvider::new(), MockAffiliationStore::new());

        let err = resolver
            .resolve(Some(&bearer("expired")), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ResolutionError::InvalidCredential));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn unreachable_auth_backend_is_invalid_credential() {
        let (resolver, _, _) =
            resolver(MockAuthProvider::unavailable(), MockAffiliationStore::new());

        let err = resolver
            .resolve(Some(&bearer("abc123")), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ResolutionError::InvalidCredential));
    }

    #[tokio::test]
    async fn unreadable_user_is_internal_failure() {
        let (resolver, _, _) =
            resolver(MockAuthProvider::malformed(), MockAffiliationStore::new());

        let err = resolver
            .resolve(Some(&bearer("abc123")), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ResolutionError::InternalFailure(_)));
    }

    #[tokio::test]
    async fn unaffiliated_user_carries_store_message() {
        let (resolver, _, _) = resolver(
            MockAuthProvider::new().with_user("abc123", "u1", Some("a@b.com")),
            MockAffiliationStore::new(),
        );

        let err = resolver
            .resolve(Some(&bearer("abc123")), None)
            .await
            .unwrap_err();

        match err {
            ResolutionError::NotAffiliated { details } => {
                assert_eq!(details, crate::services::affiliation::NO_SINGLE_ROW_MESSAGE)
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn outcomes_are_counted_by_label() {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();

        let (municipality, profile) = campinas();
        let (resolver, _, _) = resolver(
            MockAuthProvider::new()
                .with_user("abc123", "u1", None)
                .with_user("orphan", "u2", None),
            MockAffiliationStore::new().with_affiliation("u1", municipality, profile),
        );

        metrics::with_local_recorder(&recorder, || {
            runtime.block_on(async {
                let _ = resolver.resolve(Some(&bearer("abc123")), None).await;
                let _ = resolver.resolve(Some(&bearer("abc123")), None).await;
                let _ = resolver.resolve(None, None).await;
                let _ = resolver.resolve(Some(&bearer("expired")), None).await;
                let _ = resolver.resolve(Some(&bearer("orphan")), None).await;
            })
        });

        let rendered = handle.render();
        assert!(rendered.contains(r#"identity_resolutions_total{outcome="resolved"} 2"#));
        assert!(rendered.contains(r#"identity_resolutions_total{outcome="missing_credential"} 1"#));
        assert!(rendered.contains(r#"identity_resolutions_total{outcome="invalid_credential"} 1"#));
        assert!(rendered.contains(r#"identity_resolutions_total{outcome="not_affiliated"} 1"#));
    }
}
