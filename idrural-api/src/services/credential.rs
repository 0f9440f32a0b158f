use axum::http::HeaderValue;
use secrecy::{ExposeSecret, Secret};

use super::ResolutionError;

const BEARER_PREFIX: &str = "Bearer ";

/// Bearer token presented by the caller. Lives for one request and never
/// shows up in `Debug` output.
#[derive(Debug, Clone)]
pub struct Credential(Secret<String>);

impl Credential {
    /// Parse an `Authorization` header value.
    ///
    /// The scheme match is case-sensitive and the token is the remainder
    /// after `Bearer `, taken as is. A header without the prefix, with a
    /// blank remainder, or with non-ASCII bytes is an invalid credential; it
    /// is never forwarded to the auth backend.
    pub fn from_authorization(header: Option<&HeaderValue>) -> Result<Self, ResolutionError> {
        let header = header.ok_or(ResolutionError::MissingCredential)?;

        let token = header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
            .filter(|token| !token.trim().is_empty())
            .ok_or(ResolutionError::InvalidCredential)?;

        Ok(Self(Secret::new(token.to_string())))
    }

    pub fn token(&self) -> &str {
        self.0.expose_secret()
    }
}
