use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::SelfAuthor;
use crate::services::{AuthSession, CodeRequested};

// Missing fields deserialize as empty so the service reports them as
// validation errors rather than JSON errors.

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RequestCodeRequest {
    #[serde(default)]
    #[validate(length(max = 255, message = "Email must be at most 255 characters"))]
    #[schema(example = "ada@example.com")]
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RequestCodeResponse {
    #[schema(example = true)]
    pub sent: bool,
    /// Present only when development code echo is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "042917")]
    pub dev_code: Option<String>,
}

impl From<CodeRequested> for RequestCodeResponse {
    fn from(requested: CodeRequested) -> Self {
        Self {
            sent: true,
            dev_code: requested.dev_code,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VerifyRequest {
    #[serde(default)]
    #[validate(length(max = 255, message = "Email must be at most 255 characters"))]
    #[schema(example = "ada@example.com")]
    pub email: String,

    #[serde(default)]
    #[validate(length(max = 10, message = "Code must be at most 10 characters"))]
    #[schema(example = "042917")]
    pub code: String,

    #[serde(default)]
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    #[schema(example = "Ada Lovelace")]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 128, message = "Password must be at most 128 characters"))]
    #[schema(example = "correct horse battery", min_length = 8, max_length = 128)]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(max = 255, message = "Email must be at most 255 characters"))]
    #[schema(example = "ada@example.com")]
    pub email: String,

    #[serde(default)]
    #[validate(length(max = 128, message = "Password must be at most 128 characters"))]
    #[schema(example = "correct horse battery")]
    pub password: String,
}

/// Returned by registration and login. The token is also sent in the
/// `Authorization` response header.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub author: SelfAuthor,
    #[schema(example = "eyJhbGciOiJIUzI1NiJ9...")]
    pub token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
}

impl From<AuthSession> for AuthResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            author: SelfAuthor::from(session.author),
            token: session.token,
            token_type: "Bearer".to_string(),
        }
    }
}
