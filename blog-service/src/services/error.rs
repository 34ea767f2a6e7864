use service_core::error::AppError;
use thiserror::Error;

use super::store::StoreError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid or expired verification code")]
    InvalidOrExpiredCode,

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Category already exists")]
    CategoryExists,

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Email error: {0}")]
    Email(String),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => AppError::bad_request("validation_error", msg),
            ServiceError::InvalidOrExpiredCode => AppError::bad_request(
                "invalid_or_expired_code",
                "Invalid or expired verification code",
            ),
            ServiceError::EmailAlreadyRegistered => {
                AppError::bad_request("email_already_registered", "Email already registered")
            }
            ServiceError::InvalidCredentials => {
                AppError::bad_request("invalid_credentials", "Invalid email or password")
            }
            ServiceError::InvalidToken => {
                AppError::unauthorized("invalid_token", "Invalid or expired token")
            }
            ServiceError::Forbidden(msg) => AppError::Forbidden(msg),
            ServiceError::NotFound(what) => AppError::NotFound(format!("{} not found", what)),
            ServiceError::CategoryExists => {
                AppError::bad_request("category_exists", "Category already exists")
            }
            ServiceError::Store(StoreError::UniqueViolation(constraint)) => {
                AppError::DatabaseError(anyhow::anyhow!("Unhandled unique violation: {}", constraint))
            }
            ServiceError::Store(StoreError::Backend(e)) => AppError::DatabaseError(e),
            ServiceError::Internal(e) => AppError::InternalError(e),
            ServiceError::Email(e) => AppError::EmailError(e),
        }
    }
}
