pub mod health;
pub mod me;
pub mod metrics;

pub use health::health_check;
pub use me::get_me;
pub use self::metrics::metrics;

use service_core::error::AppError;

pub async fn not_found() -> AppError {
    AppError::NotFound("Not found".to_string())
}
