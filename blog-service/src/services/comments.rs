use std::sync::Arc;

use super::{
    error::ServiceError,
    ownership::{ensure_can_mutate, Caller},
    store::BlogStore,
};
use crate::models::{Comment, NewComment};

pub const MAX_COMMENT_CHARS: usize = 2000;
pub const MAX_AUTHOR_NAME_CHARS: usize = 255;

#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn BlogStore>,
}

impl CommentService {
    pub fn new(store: Arc<dyn BlogStore>) -> Self {
        Self { store }
    }

    /// Oldest first. The post must exist.
    pub async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>, ServiceError> {
        self.ensure_post_exists(post_id).await?;
        Ok(self.store.list_comments_for_post(post_id).await?)
    }

    pub async fn get(&self, id: i64) -> Result<Comment, ServiceError> {
        self.store
            .find_comment(id)
            .await?
            .ok_or(ServiceError::NotFound("Comment"))
    }

    /// `author_name` defaults to the caller's name.
    pub async fn create(
        &self,
        caller: Caller,
        post_id: i64,
        body: Option<&str>,
        author_name: Option<&str>,
    ) -> Result<Comment, ServiceError> {
        let body = validate_body(body)?.ok_or_else(|| ServiceError::validation("body is required"))?;
        self.ensure_post_exists(post_id).await?;

        let author_name = match author_name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) if name.chars().count() > MAX_AUTHOR_NAME_CHARS => {
                return Err(ServiceError::validation(format!(
                    "author_name must be at most {} characters",
                    MAX_AUTHOR_NAME_CHARS
                )));
            }
            Some(name) => name.to_string(),
            None => self
                .store
                .find_author(caller.author_id)
                .await?
                // Token outlived its author
                .ok_or(ServiceError::InvalidToken)?
                .name,
        };

        let comment = self
            .store
            .insert_comment(NewComment {
                post_id,
                body,
                author_id: Some(caller.author_id),
                author_name,
            })
            .await?;

        tracing::info!(
            comment_id = comment.id,
            post_id,
            author_id = caller.author_id,
            "Comment created"
        );

        Ok(comment)
    }

    /// A blank body keeps the current one.
    pub async fn update(
        &self,
        caller: Caller,
        id: i64,
        body: Option<&str>,
    ) -> Result<Comment, ServiceError> {
        let existing = self.get(id).await?;
        ensure_can_mutate(existing.author_id, caller, "comments")?;

        let Some(body) = validate_body(body)? else {
            return Ok(existing);
        };

        let comment = self
            .store
            .update_comment_body(id, &body)
            .await?
            .ok_or(ServiceError::NotFound("Comment"))?;

        tracing::info!(comment_id = id, author_id = caller.author_id, "Comment updated");
        Ok(comment)
    }

    pub async fn delete(&self, caller: Caller, id: i64) -> Result<(), ServiceError> {
        let existing = self.get(id).await?;
        ensure_can_mutate(existing.author_id, caller, "comments")?;

        if !self.store.delete_comment(id).await? {
            return Err(ServiceError::NotFound("Comment"));
        }

        tracing::info!(comment_id = id, author_id = caller.author_id, "Comment deleted");
        Ok(())
    }

    async fn ensure_post_exists(&self, post_id: i64) -> Result<(), ServiceError> {
        match self.store.find_post(post_id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::NotFound("Post")),
        }
    }
}

fn validate_body(body: Option<&str>) -> Result<Option<String>, ServiceError> {
    match body.map(str::trim).filter(|b| !b.is_empty()) {
        None => Ok(None),
        Some(b) if b.chars().count() > MAX_COMMENT_CHARS => Err(ServiceError::validation(format!(
            "body must be at most {} characters",
            MAX_COMMENT_CHARS
        ))),
        Some(b) => Ok(Some(b.to_string())),
    }
}
