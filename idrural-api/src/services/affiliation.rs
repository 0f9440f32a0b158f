use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

use crate::models::{Affiliation, Municipality, Profile};

/// PostgREST code for a single-object request that matched zero or many rows.
pub const NO_SINGLE_ROW_CODE: &str = "PGRST116";
pub const NO_SINGLE_ROW_MESSAGE: &str = "JSON object requested, multiple (or no) rows returned";

/// Display strings are what callers see in the `details` of a 403.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{message}")]
    Query {
        code: Option<String>,
        message: String,
    },

    #[error("{0}")]
    Unavailable(anyhow::Error),

    #[error("{0}")]
    Malformed(anyhow::Error),

    #[error("affiliation has no {0}")]
    Incomplete(&'static str),
}

impl StoreError {
    pub fn no_single_row() -> Self {
        StoreError::Query {
            code: Some(NO_SINGLE_ROW_CODE.to_string()),
            message: NO_SINGLE_ROW_MESSAGE.to_string(),
        }
    }
}

/// Looks up the municipality and profile a user belongs to.
#[async_trait]
pub trait AffiliationStore: Send + Sync {
    /// Exactly one row must match `user_id`.
    async fn find_affiliation(
        &self,
        user_id: &str,
        request_id: Option<&str>,
    ) -> Result<Affiliation, StoreError>;
}

pub struct MockAffiliationStore {
    rows: HashMap<String, Affiliation>,
    calls: AtomicUsize,
}

impl Default for MockAffiliationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAffiliationStore {
    pub fn new() -> Self {
        Self {
            rows: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_affiliation(
        mut self,
        user_id: &str,
        municipality: Municipality,
        profile: Profile,
    ) -> Self {
        self.rows.insert(
            user_id.to_string(),
            Affiliation {
                municipality,
                profile,
            },
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AffiliationStore for MockAffiliationStore {
    async fn find_affiliation(
        &self,
        user_id: &str,
        _request_id: Option<&str>,
    ) -> Result<Affiliation, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.rows
            .get(user_id)
            .cloned()
            .ok_or_else(StoreError::no_single_row)
    }
}
