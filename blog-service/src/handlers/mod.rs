pub mod auth;
pub mod authors;
pub mod categories;
pub mod comments;
pub mod health;
pub mod metrics;
pub mod posts;

use service_core::error::AppError;

pub async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}
