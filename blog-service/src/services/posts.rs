use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::{
    error::ServiceError,
    ownership::{ensure_can_mutate, Caller},
    storage::{Accept, Uploads, ValidatedUpload},
    store::BlogStore,
};
use crate::{
    models::{Category, Media, NewMedia, NewPost, Post, PostChanges, PostListQuery, PostRow, PublicAuthor},
    utils::UploadedFile,
};

pub const MAX_TITLE_CHARS: usize = 255;
pub const MAX_BODY_CHARS: usize = 10_000;
pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Fields of a new post.
#[derive(Debug, Default)]
pub struct PostDraft {
    pub title: Option<String>,
    pub body: Option<String>,
    pub category_id: Option<i64>,
    pub banner: Option<UploadedFile>,
    pub files: Vec<UploadedFile>,
}

/// Partial update. Absent fields keep their value; files are appended.
#[derive(Debug, Default)]
pub struct PostEdit {
    pub title: Option<String>,
    pub body: Option<String>,
    pub category_id: Option<i64>,
    pub banner: Option<UploadedFile>,
    pub files: Vec<UploadedFile>,
}

#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn BlogStore>,
    uploads: Uploads,
}

impl PostService {
    pub fn new(store: Arc<dyn BlogStore>, uploads: Uploads) -> Self {
        Self { store, uploads }
    }

    /// Newest first. `limit` outside 1..=100 falls back to the default.
    pub async fn list(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
        category_id: Option<i64>,
    ) -> Result<Vec<Post>, ServiceError> {
        let query = PostListQuery {
            limit: match limit {
                Some(l) if (1..=MAX_PAGE_SIZE).contains(&l) => l,
                _ => DEFAULT_PAGE_SIZE,
            },
            offset: offset.unwrap_or(0).max(0),
            category_id,
        };

        let rows = self.store.list_posts(query).await?;
        self.assemble(rows).await
    }

    pub async fn get(&self, id: i64) -> Result<Post, ServiceError> {
        let row = self.find_row(id).await?;
        self.assemble_one(row).await
    }

    pub async fn create(&self, caller: Caller, draft: PostDraft) -> Result<Post, ServiceError> {
        let title = validate_title(draft.title.as_deref())?
            .ok_or_else(|| ServiceError::validation("title is required"))?;
        let body = normalize_body(draft.body.as_deref().unwrap_or_default());
        self.ensure_category_exists(draft.category_id).await?;

        // Reject the request before anything is written if any file is bad
        let banner = draft
            .banner
            .map(|f| self.uploads.validate(f, Accept::Images))
            .transpose()?;
        let files = self.validate_media(draft.files)?;

        let row = self
            .store
            .insert_post(NewPost {
                title,
                body,
                author_id: Some(caller.author_id),
                category_id: draft.category_id,
            })
            .await?;

        tracing::info!(post_id = row.id, author_id = caller.author_id, "Post created");

        let row = self.attach_files(row, banner, files).await?;
        self.assemble_one(row).await
    }

    pub async fn update(&self, caller: Caller, id: i64, edit: PostEdit) -> Result<Post, ServiceError> {
        let existing = self.find_row(id).await?;
        ensure_can_mutate(existing.author_id, caller, "posts")?;

        let title = validate_title(edit.title.as_deref())?;
        let body = edit
            .body
            .as_deref()
            .map(normalize_body)
            .filter(|b| !b.is_empty());
        self.ensure_category_exists(edit.category_id).await?;

        let banner = edit
            .banner
            .map(|f| self.uploads.validate(f, Accept::Images))
            .transpose()?;
        let files = self.validate_media(edit.files)?;

        let changes = PostChanges {
            title,
            body,
            category_id: edit.category_id,
            banner_path: None,
        };

        let row = self
            .store
            .update_post(id, changes)
            .await?
            .ok_or(ServiceError::NotFound("Post"))?;

        tracing::info!(post_id = id, author_id = caller.author_id, "Post updated");

        let row = self.attach_files(row, banner, files).await?;
        self.assemble_one(row).await
    }

    pub async fn delete(&self, caller: Caller, id: i64) -> Result<(), ServiceError> {
        let existing = self.find_row(id).await?;
        ensure_can_mutate(existing.author_id, caller, "posts")?;

        if !self.store.soft_delete_post(id).await? {
            return Err(ServiceError::NotFound("Post"));
        }

        tracing::info!(post_id = id, author_id = caller.author_id, "Post deleted");
        Ok(())
    }

    async fn find_row(&self, id: i64) -> Result<PostRow, ServiceError> {
        self.store
            .find_post(id)
            .await?
            .ok_or(ServiceError::NotFound("Post"))
    }

    async fn ensure_category_exists(&self, category_id: Option<i64>) -> Result<(), ServiceError> {
        if let Some(id) = category_id {
            if self.store.find_category(id).await?.is_none() {
                return Err(ServiceError::validation(format!("category {} does not exist", id)));
            }
        }
        Ok(())
    }

    fn validate_media(&self, files: Vec<UploadedFile>) -> Result<Vec<ValidatedUpload>, ServiceError> {
        files
            .into_iter()
            .map(|f| self.uploads.validate(f, Accept::ImagesAndVideos))
            .collect()
    }

    async fn attach_files(
        &self,
        mut row: PostRow,
        banner: Option<ValidatedUpload>,
        files: Vec<ValidatedUpload>,
    ) -> Result<PostRow, ServiceError> {
        if let Some(banner) = banner {
            let path = self.uploads.store(&banner, "banners").await?;
            let previous = row.banner_path.clone();
            row = self
                .store
                .update_post(
                    row.id,
                    PostChanges {
                        banner_path: Some(path),
                        ..Default::default()
                    },
                )
                .await?
                .ok_or(ServiceError::NotFound("Post"))?;
            if let Some(previous) = previous {
                self.uploads.discard(&previous).await;
            }
        }

        let dir = format!("posts/{}", row.id);
        for file in files {
            let path = self.uploads.store(&file, &dir).await?;
            self.store
                .insert_media(NewMedia {
                    post_id: row.id,
                    kind: file.kind,
                    path,
                    filename: file.file_name.clone(),
                })
                .await?;
        }

        Ok(row)
    }

    async fn assemble_one(&self, row: PostRow) -> Result<Post, ServiceError> {
        let mut posts = self.assemble(vec![row]).await?;
        posts.pop().ok_or(ServiceError::NotFound("Post"))
    }

    /// Resolve authors, categories, and media for a page of rows.
    async fn assemble(&self, rows: Vec<PostRow>) -> Result<Vec<Post>, ServiceError> {
        let post_ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

        let mut media_by_post: HashMap<i64, Vec<Media>> = HashMap::new();
        if !post_ids.is_empty() {
            for media in self.store.list_media_for_posts(&post_ids).await? {
                media_by_post.entry(media.post_id).or_default().push(media);
            }
        }

        let mut authors: HashMap<i64, PublicAuthor> = HashMap::new();
        let author_ids: HashSet<i64> = rows.iter().filter_map(|r| r.author_id).collect();
        for id in author_ids {
            if let Some(author) = self.store.find_author(id).await? {
                authors.insert(id, PublicAuthor::from(author));
            }
        }

        let mut categories: HashMap<i64, Category> = HashMap::new();
        let category_ids: HashSet<i64> = rows.iter().filter_map(|r| r.category_id).collect();
        for id in category_ids {
            if let Some(category) = self.store.find_category(id).await? {
                categories.insert(id, category);
            }
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let author = row.author_id.and_then(|id| authors.get(&id).cloned());
                let category = row.category_id.and_then(|id| categories.get(&id).cloned());
                let media = media_by_post.remove(&row.id).unwrap_or_default();
                Post::assemble(row, author, category, media)
            })
            .collect())
    }
}

/// `Ok(None)` for a missing or blank title.
fn validate_title(title: Option<&str>) -> Result<Option<String>, ServiceError> {
    match title.map(str::trim).filter(|t| !t.is_empty()) {
        None => Ok(None),
        Some(t) if t.chars().count() > MAX_TITLE_CHARS => Err(ServiceError::validation(format!(
            "title must be at most {} characters",
            MAX_TITLE_CHARS
        ))),
        Some(t) => Ok(Some(t.to_string())),
    }
}

/// Trim, then cap at [`MAX_BODY_CHARS`] characters.
pub fn normalize_body(body: &str) -> String {
    body.trim().chars().take(MAX_BODY_CHARS).collect()
}
