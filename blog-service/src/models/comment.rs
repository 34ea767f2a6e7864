//! Comment model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct Comment {
    #[schema(example = 7)]
    pub id: i64,
    #[schema(example = 3)]
    pub post_id: i64,
    #[schema(example = "Great write-up!")]
    pub body: String,
    /// Owning author. `None` for legacy anonymous comments.
    pub author_id: Option<i64>,
    #[schema(example = "Ada Lovelace")]
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i64,
    pub body: String,
    pub author_id: Option<i64>,
    pub author_name: String,
}
