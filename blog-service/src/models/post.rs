//! Post model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use super::{Category, Media, PublicAuthor};

/// Row as stored in `posts`.
#[derive(Debug, Clone, FromRow)]
pub struct PostRow {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub banner_path: Option<String>,
    pub author_id: Option<i64>,
    pub category_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Post with its author, category, and media resolved.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Post {
    #[schema(example = 3)]
    pub id: i64,
    #[schema(example = "Shipping the blog API")]
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner_path: Option<String>,
    /// Owning author. `None` for legacy anonymous posts.
    pub author_id: Option<i64>,
    pub category_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<PublicAuthor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    pub media: Vec<Media>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn assemble(
        row: PostRow,
        author: Option<PublicAuthor>,
        category: Option<Category>,
        media: Vec<Media>,
    ) -> Self {
        Self {
            id: row.id,
            title: row.title,
            body: row.body,
            banner_path: row.banner_path,
            author_id: row.author_id,
            category_id: row.category_id,
            author,
            category,
            media,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub body: String,
    pub author_id: Option<i64>,
    pub category_id: Option<i64>,
}

/// Partial update. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub body: Option<String>,
    pub category_id: Option<i64>,
    pub banner_path: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct PostListQuery {
    pub limit: i64,
    pub offset: i64,
    pub category_id: Option<i64>,
}
