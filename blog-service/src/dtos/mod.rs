pub mod auth;
pub mod authors;
pub mod categories;
pub mod comments;
pub mod posts;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error envelope.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = false)]
    pub success: bool,
    #[schema(example = "Invalid email or password")]
    pub error: String,
    #[schema(example = "invalid_credentials")]
    pub code: Option<String>,
}
