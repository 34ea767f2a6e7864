use std::sync::Arc;

use super::{
    auth::validate_name,
    error::ServiceError,
    ownership::{ensure_self, Caller},
    storage::{Accept, Uploads},
    store::BlogStore,
};
use crate::{
    models::{Author, AuthorChanges, NewAuthor},
    utils::UploadedFile,
};

#[derive(Clone)]
pub struct AuthorService {
    store: Arc<dyn BlogStore>,
    uploads: Uploads,
}

impl AuthorService {
    pub fn new(store: Arc<dyn BlogStore>, uploads: Uploads) -> Self {
        Self { store, uploads }
    }

    /// Sorted by name.
    pub async fn list(&self) -> Result<Vec<Author>, ServiceError> {
        Ok(self.store.list_authors().await?)
    }

    pub async fn get(&self, id: i64) -> Result<Author, ServiceError> {
        self.store
            .find_author(id)
            .await?
            .ok_or(ServiceError::NotFound("Author"))
    }

    /// Author without email or password. Such an author cannot log in.
    pub async fn create_anonymous(
        &self,
        name: Option<&str>,
        avatar: Option<UploadedFile>,
    ) -> Result<Author, ServiceError> {
        let name = name.map(str::trim).unwrap_or_default();
        validate_name(name)?;

        let avatar = avatar
            .map(|f| self.uploads.validate(f, Accept::Images))
            .transpose()?;
        let avatar_path = match avatar {
            Some(upload) => Some(self.uploads.store(&upload, "avatars").await?),
            None => None,
        };

        let author = self
            .store
            .insert_author(NewAuthor {
                name: name.to_string(),
                avatar_path,
                ..Default::default()
            })
            .await?;

        tracing::info!(author_id = author.id, "Anonymous author created");
        Ok(author)
    }

    /// Self only. Checked before existence, so a stranger always gets 403.
    pub async fn update(
        &self,
        caller: Caller,
        id: i64,
        name: Option<&str>,
        avatar: Option<UploadedFile>,
    ) -> Result<Author, ServiceError> {
        ensure_self(id, caller)?;
        let existing = self.get(id).await?;

        let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(n) => {
                validate_name(n)?;
                Some(n.to_string())
            }
            None => None,
        };

        let avatar = avatar
            .map(|f| self.uploads.validate(f, Accept::Images))
            .transpose()?;

        let mut changes = AuthorChanges {
            name,
            avatar_path: None,
        };
        if let Some(upload) = avatar {
            changes.avatar_path = Some(self.uploads.store(&upload, "avatars").await?);
        }

        if changes.is_empty() {
            return Ok(existing);
        }

        let replaced_avatar = changes.avatar_path.is_some();
        let author = self
            .store
            .update_author(id, changes)
            .await?
            .ok_or(ServiceError::NotFound("Author"))?;

        if replaced_avatar {
            if let Some(previous) = existing.avatar_path {
                self.uploads.discard(&previous).await;
            }
        }

        tracing::info!(author_id = id, "Author updated");
        Ok(author)
    }

    /// Soft delete. Outstanding tokens keep parsing but the author is gone.
    pub async fn delete(&self, caller: Caller, id: i64) -> Result<(), ServiceError> {
        ensure_self(id, caller)?;

        if !self.store.soft_delete_author(id).await? {
            return Err(ServiceError::NotFound("Author"));
        }

        tracing::info!(author_id = id, "Author deleted");
        Ok(())
    }
}
