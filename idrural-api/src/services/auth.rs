use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

use super::Credential;
use crate::models::Identity;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("auth backend rejected the token ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("auth backend unavailable: {0}")]
    Unavailable(anyhow::Error),

    #[error("auth backend returned an unreadable user: {0}")]
    Malformed(anyhow::Error),
}

/// Validates a bearer token and returns the user it was issued to.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn get_user(
        &self,
        credential: &Credential,
        request_id: Option<&str>,
    ) -> Result<Identity, AuthError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MockAuthMode {
    Normal,
    Unavailable,
    Malformed,
}

/// In-memory token table.
pub struct MockAuthProvider {
    users: HashMap<String, Identity>,
    mode: MockAuthMode,
    calls: AtomicUsize,
}

impl Default for MockAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAuthProvider {
    pub fn new() -> Self {
        Self {
            users: HashMap::new(),
            mode: MockAuthMode::Normal,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_user(mut self, token: &str, id: &str, email: Option<&str>) -> Self {
        self.users.insert(
            token.to_string(),
            Identity {
                id: id.to_string(),
                email: email.map(str::to_string),
            },
        );
        self
    }

    /// Every call fails as if the backend could not be reached.
    pub fn unavailable() -> Self {
        Self {
            mode: MockAuthMode::Unavailable,
            ..Self::new()
        }
    }

    /// Every call answers with a body that is not a user.
    pub fn malformed() -> Self {
        Self {
            mode: MockAuthMode::Malformed,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthProvider for MockAuthProvider {
    async fn get_user(
        &self,
        credential: &Credential,
        _request_id: Option<&str>,
    ) -> Result<Identity, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match self.mode {
            MockAuthMode::Unavailable => Err(AuthError::Unavailable(anyhow::anyhow!(
                "connection refused"
            ))),
            MockAuthMode::Malformed => Err(AuthError::Malformed(anyhow::anyhow!(
                "missing field `id`"
            ))),
            MockAuthMode::Normal => self
                .users
                .get(credential.token())
                .cloned()
                .ok_or_else(|| AuthError::Rejected {
                    status: 401,
                    message: "invalid JWT: unable to parse or verify signature".to_string(),
                }),
        }
    }
}
