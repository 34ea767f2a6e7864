//! Storage contracts.
//!
//! `Database` implements these on PostgreSQL, `MemoryDatabase` in process.
//! Lookups return `Ok(None)` for missing or soft-deleted rows; callers decide
//! whether that is a `NotFound`.

use async_trait::async_trait;
use chrono::Duration;
use thiserror::Error;

use crate::models::{
    Author, AuthorChanges, Category, Comment, Media, NewAuthor, NewComment, NewMedia, NewPost,
    PostChanges, PostListQuery, PostRow, VerificationCode,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Storage backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                StoreError::UniqueViolation(
                    db_err
                        .constraint()
                        .map(str::to_string)
                        .unwrap_or_else(|| db_err.message().to_string()),
                )
            }
            other => StoreError::Backend(anyhow::anyhow!(other)),
        }
    }
}

#[async_trait]
pub trait AuthorStore: Send + Sync {
    /// Fails with `UniqueViolation` when the email belongs to a live author.
    async fn insert_author(&self, author: NewAuthor) -> Result<Author, StoreError>;
    async fn find_author(&self, id: i64) -> Result<Option<Author>, StoreError>;
    async fn find_author_by_email(&self, email: &str) -> Result<Option<Author>, StoreError>;
    async fn list_authors(&self) -> Result<Vec<Author>, StoreError>;
    async fn update_author(
        &self,
        id: i64,
        changes: AuthorChanges,
    ) -> Result<Option<Author>, StoreError>;
    /// Returns false when no live author has this id.
    async fn soft_delete_author(&self, id: i64) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait VerificationCodeStore: Send + Sync {
    /// Replace any outstanding code for `email` with `code`, valid for `ttl`.
    async fn put_code(&self, email: &str, code: &str, ttl: Duration) -> Result<(), StoreError>;
    /// Matches only when email and code agree and the entry has not expired.
    async fn find_valid_code(
        &self,
        email: &str,
        code: &str,
    ) -> Result<Option<VerificationCode>, StoreError>;
    /// Idempotent. Returns the number of rows removed.
    async fn delete_codes_for(&self, email: &str) -> Result<u64, StoreError>;
    async fn delete_expired_codes(&self) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Fails with `UniqueViolation` on a duplicate name.
    async fn insert_category(&self, name: &str) -> Result<Category, StoreError>;
    async fn find_category(&self, id: i64) -> Result<Option<Category>, StoreError>;
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;
    async fn rename_category(&self, id: i64, name: &str) -> Result<Option<Category>, StoreError>;
    async fn delete_category(&self, id: i64) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert_post(&self, post: NewPost) -> Result<PostRow, StoreError>;
    async fn find_post(&self, id: i64) -> Result<Option<PostRow>, StoreError>;
    /// Newest first.
    async fn list_posts(&self, query: PostListQuery) -> Result<Vec<PostRow>, StoreError>;
    async fn update_post(&self, id: i64, changes: PostChanges)
    -> Result<Option<PostRow>, StoreError>;
    async fn soft_delete_post(&self, id: i64) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn insert_media(&self, media: NewMedia) -> Result<Media, StoreError>;
    /// Media for each of `post_ids`, in insertion order.
    async fn list_media_for_posts(&self, post_ids: &[i64]) -> Result<Vec<Media>, StoreError>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, StoreError>;
    async fn find_comment(&self, id: i64) -> Result<Option<Comment>, StoreError>;
    /// Oldest first.
    async fn list_comments_for_post(&self, post_id: i64) -> Result<Vec<Comment>, StoreError>;
    async fn update_comment_body(&self, id: i64, body: &str)
    -> Result<Option<Comment>, StoreError>;
    async fn delete_comment(&self, id: i64) -> Result<bool, StoreError>;
}

/// Connectivity probe used by `/health`.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Everything the blog needs from persistence.
pub trait BlogStore:
    AuthorStore
    + VerificationCodeStore
    + CategoryStore
    + PostStore
    + MediaStore
    + CommentStore
    + HealthCheck
{
}

impl<T> BlogStore for T where
    T: AuthorStore
        + VerificationCodeStore
        + CategoryStore
        + PostStore
        + MediaStore
        + CommentStore
        + HealthCheck
{
}
