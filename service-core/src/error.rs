use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::any::Any;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("{message}")]
    BadRequest { code: &'static str, message: String },

    #[error("{message}")]
    Unauthorized { code: &'static str, message: String },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Too many requests: {0}")]
    TooManyRequests(String, Option<u64>),

    #[error("Service Unavailable")]
    ServiceUnavailable,

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("Email error: {0}")]
    EmailError(String),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        AppError::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized(code: &'static str, message: impl Into<String>) -> Self {
        AppError::Unauthorized {
            code,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::TooManyRequests(..) => StatusCode::TOO_MANY_REQUESTS,
            AppError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InternalError(_)
            | AppError::DatabaseError(_)
            | AppError::EmailError(_)
            | AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code carried in the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation_error",
            AppError::BadRequest { code, .. } | AppError::Unauthorized { code, .. } => *code,
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::PayloadTooLarge(_) => "payload_too_large",
            AppError::TooManyRequests(..) => "rate_limited",
            AppError::ServiceUnavailable => "service_unavailable",
            AppError::InternalError(_)
            | AppError::DatabaseError(_)
            | AppError::EmailError(_)
            | AppError::ConfigError(_) => "internal_error",
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, code: &'static str) -> Self {
        Self {
            success: false,
            error: error.into(),
            code: Some(code),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let (error_message, retry_after) = match &self {
            AppError::ValidationError(err) => (describe_validation(err), None),
            AppError::BadRequest { message, .. } | AppError::Unauthorized { message, .. } => {
                (message.clone(), None)
            }
            AppError::Forbidden(msg) | AppError::NotFound(msg) | AppError::PayloadTooLarge(msg) => {
                (msg.clone(), None)
            }
            AppError::TooManyRequests(msg, retry) => (msg.clone(), *retry),
            AppError::ServiceUnavailable => ("Service unavailable".to_string(), None),
            AppError::InternalError(err)
            | AppError::DatabaseError(err)
            | AppError::ConfigError(err) => {
                tracing::error!(error = %format!("{:#}", err), "Request failed with internal error");
                ("Internal server error".to_string(), None)
            }
            AppError::EmailError(msg) => {
                tracing::error!(error = %msg, "Request failed with email error");
                ("Internal server error".to_string(), None)
            }
        };

        let mut res = (status, Json(ErrorBody::new(error_message, code))).into_response();

        if let Some(retry) = retry_after {
            res.headers_mut().insert(header::RETRY_AFTER, retry.into());
        }

        res
    }
}

fn describe_validation(errors: &validator::ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => msg.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect();

    if messages.is_empty() {
        return "Validation error".to_string();
    }

    messages.sort();
    messages.join("; ")
}

/// Response used by `CatchPanicLayer::custom`.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    tracing::error!(panic = %detail, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::new("Internal server error", "internal_error")),
    )
        .into_response()
}
