//! Media model - files attached to a post.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Media kind codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct Media {
    pub id: i64,
    pub post_id: i64,
    /// `image` or `video`.
    #[serde(rename = "type")]
    #[schema(example = "image")]
    pub media_type: String,
    #[schema(example = "posts/3/1718000000000_3.png")]
    pub path: String,
    #[schema(example = "diagram.png")]
    pub filename: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMedia {
    pub post_id: i64,
    pub kind: MediaKind,
    pub path: String,
    pub filename: String,
}
