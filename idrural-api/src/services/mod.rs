pub mod affiliation;
pub mod auth;
pub mod credential;
pub mod error;
pub mod resolver;
pub mod supabase;

pub use affiliation::{AffiliationStore, MockAffiliationStore, StoreError};
pub use auth::{AuthError, AuthProvider, MockAuthProvider};
pub use credential::Credential;
pub use error::ResolutionError;
pub use resolver::IdentityResolver;
pub use supabase::SupabaseClient;
