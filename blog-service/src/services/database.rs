//! PostgreSQL store for blog-service.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::postgres::PgPool;
use tracing::instrument;

use super::store::{
    AuthorStore, CategoryStore, CommentStore, HealthCheck, MediaStore, PostStore, StoreError,
    VerificationCodeStore,
};
use crate::models::{
    Author, AuthorChanges, Category, Comment, Media, NewAuthor, NewComment, NewMedia, NewPost,
    PostChanges, PostListQuery, PostRow, VerificationCode,
};

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database wrapper from a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl HealthCheck for Database {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// ==================== Author Operations ====================

#[async_trait]
impl AuthorStore for Database {
    #[instrument(skip(self, author), fields(name = %author.name))]
    async fn insert_author(&self, author: NewAuthor) -> Result<Author, StoreError> {
        let created = sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (name, email, password_hash, avatar_path, email_verified_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, password_hash, avatar_path, email_verified_at, created_at, updated_at
            "#,
        )
        .bind(&author.name)
        .bind(&author.email)
        .bind(&author.password_hash)
        .bind(&author.avatar_path)
        .bind(author.email_verified_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_author(&self, id: i64) -> Result<Option<Author>, StoreError> {
        sqlx::query_as::<_, Author>(
            r#"
            SELECT id, name, email, password_hash, avatar_path, email_verified_at, created_at, updated_at
            FROM authors
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from)
    }

    async fn find_author_by_email(&self, email: &str) -> Result<Option<Author>, StoreError> {
        sqlx::query_as::<_, Author>(
            r#"
            SELECT id, name, email, password_hash, avatar_path, email_verified_at, created_at, updated_at
            FROM authors
            WHERE email = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from)
    }

    async fn list_authors(&self) -> Result<Vec<Author>, StoreError> {
        sqlx::query_as::<_, Author>(
            r#"
            SELECT id, name, email, password_hash, avatar_path, email_verified_at, created_at, updated_at
            FROM authors
            WHERE deleted_at IS NULL
            ORDER BY name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)
    }

    async fn update_author(
        &self,
        id: i64,
        changes: AuthorChanges,
    ) -> Result<Option<Author>, StoreError> {
        sqlx::query_as::<_, Author>(
            r#"
            UPDATE authors
            SET name = COALESCE($2, name),
                avatar_path = COALESCE($3, avatar_path),
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, name, email, password_hash, avatar_path, email_verified_at, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.avatar_path)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from)
    }

    async fn soft_delete_author(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE authors SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

// ==================== Verification Code Operations ====================

#[async_trait]
impl VerificationCodeStore for Database {
    #[instrument(skip(self, code))]
    async fn put_code(&self, email: &str, code: &str, ttl: Duration) -> Result<(), StoreError> {
        let now = Utc::now();

        // Single statement: the unique email key makes "replace the outstanding code" atomic
        sqlx::query(
            r#"
            INSERT INTO email_verifications (email, code, expires_at, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO UPDATE
            SET code = EXCLUDED.code,
                expires_at = EXCLUDED.expires_at,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(email)
        .bind(code)
        .bind(now + ttl)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_valid_code(
        &self,
        email: &str,
        code: &str,
    ) -> Result<Option<VerificationCode>, StoreError> {
        sqlx::query_as::<_, VerificationCode>(
            r#"
            SELECT id, email, code, expires_at, created_at
            FROM email_verifications
            WHERE email = $1 AND code = $2 AND expires_at > $3
            "#,
        )
        .bind(email)
        .bind(code)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from)
    }

    async fn delete_codes_for(&self, email: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM email_verifications WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_expired_codes(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM email_verifications WHERE expires_at <= $1")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

// ==================== Category Operations ====================

#[async_trait]
impl CategoryStore for Database {
    async fn insert_category(&self, name: &str) -> Result<Category, StoreError> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name)
            VALUES ($1)
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(category)
    }

    async fn find_category(&self, id: i64) -> Result<Option<Category>, StoreError> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, created_at, updated_at FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, created_at, updated_at FROM categories ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)
    }

    async fn rename_category(&self, id: i64, name: &str) -> Result<Option<Category>, StoreError> {
        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from)
    }

    async fn delete_category(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// ==================== Post Operations ====================

#[async_trait]
impl PostStore for Database {
    #[instrument(skip(self, post), fields(author_id = ?post.author_id))]
    async fn insert_post(&self, post: NewPost) -> Result<PostRow, StoreError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (title, body, author_id, category_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, body, banner_path, author_id, category_id, created_at, updated_at
            "#,
        )
        .bind(&post.title)
        .bind(&post.body)
        .bind(post.author_id)
        .bind(post.category_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_post(&self, id: i64) -> Result<Option<PostRow>, StoreError> {
        sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, title, body, banner_path, author_id, category_id, created_at, updated_at
            FROM posts
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from)
    }

    async fn list_posts(&self, query: PostListQuery) -> Result<Vec<PostRow>, StoreError> {
        sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, title, body, banner_path, author_id, category_id, created_at, updated_at
            FROM posts
            WHERE deleted_at IS NULL
              AND ($1::BIGINT IS NULL OR category_id = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(query.category_id)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)
    }

    async fn update_post(
        &self,
        id: i64,
        changes: PostChanges,
    ) -> Result<Option<PostRow>, StoreError> {
        sqlx::query_as::<_, PostRow>(
            r#"
            UPDATE posts
            SET title = COALESCE($2, title),
                body = COALESCE($3, body),
                category_id = COALESCE($4, category_id),
                banner_path = COALESCE($5, banner_path),
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, title, body, banner_path, author_id, category_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.body)
        .bind(changes.category_id)
        .bind(&changes.banner_path)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from)
    }

    async fn soft_delete_post(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE posts SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

// ==================== Media Operations ====================

#[async_trait]
impl MediaStore for Database {
    async fn insert_media(&self, media: NewMedia) -> Result<Media, StoreError> {
        let created = sqlx::query_as::<_, Media>(
            r#"
            INSERT INTO media (post_id, media_type, path, filename)
            VALUES ($1, $2, $3, $4)
            RETURNING id, post_id, media_type, path, filename, created_at
            "#,
        )
        .bind(media.post_id)
        .bind(media.kind.as_str())
        .bind(&media.path)
        .bind(&media.filename)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn list_media_for_posts(&self, post_ids: &[i64]) -> Result<Vec<Media>, StoreError> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, Media>(
            r#"
            SELECT id, post_id, media_type, path, filename, created_at
            FROM media
            WHERE post_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)
    }
}

// ==================== Comment Operations ====================

#[async_trait]
impl CommentStore for Database {
    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
        let created = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (post_id, body, author_id, author_name)
            VALUES ($1, $2, $3, $4)
            RETURNING id, post_id, body, author_id, author_name, created_at, updated_at
            "#,
        )
        .bind(comment.post_id)
        .bind(&comment.body)
        .bind(comment.author_id)
        .bind(&comment.author_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_comment(&self, id: i64) -> Result<Option<Comment>, StoreError> {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, post_id, body, author_id, author_name, created_at, updated_at
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from)
    }

    async fn list_comments_for_post(&self, post_id: i64) -> Result<Vec<Comment>, StoreError> {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, post_id, body, author_id, author_name, created_at, updated_at
            FROM comments
            WHERE post_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)
    }

    async fn update_comment_body(
        &self,
        id: i64,
        body: &str,
    ) -> Result<Option<Comment>, StoreError> {
        sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments
            SET body = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, post_id, body, author_id, author_name, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(body)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from)
    }

    async fn delete_comment(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
