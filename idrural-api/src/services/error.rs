use service_core::error::AppError;
use thiserror::Error;

/// Why a bearer token could not be turned into an affiliated identity.
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("Missing Authorization header")]
    MissingCredential,

    #[error("Invalid or expired token")]
    InvalidCredential,

    #[error("User not linked to municipality")]
    NotAffiliated { details: String },

    #[error("Internal failure: {0}")]
    InternalFailure(#[from] anyhow::Error),
}

impl ResolutionError {
    /// Metric label for the outcome.
    pub fn outcome(&self) -> &'static str {
        match self {
            ResolutionError::MissingCredential => "missing_credential",
            ResolutionError::InvalidCredential => "invalid_credential",
            ResolutionError::NotAffiliated { .. } => "not_affiliated",
            ResolutionError::InternalFailure(_) => "internal_failure",
        }
    }
}

impl From<ResolutionError> for AppError {
    fn from(err: ResolutionError) -> Self {
        let message = err.to_string();
        match err {
            ResolutionError::MissingCredential | ResolutionError::InvalidCredential => {
                AppError::Unauthorized(message)
            }
            ResolutionError::NotAffiliated { details } => AppError::Forbidden {
                message,
                details: Some(details),
            },
            ResolutionError::InternalFailure(e) => AppError::InternalError(e),
        }
    }
}
