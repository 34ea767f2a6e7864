//! In-process store with the same semantics as the PostgreSQL one.
//!
//! Used by the integration tests and for running the API without a database.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::store::{
    AuthorStore, CategoryStore, CommentStore, HealthCheck, MediaStore, PostStore, StoreError,
    VerificationCodeStore,
};
use crate::models::{
    Author, AuthorChanges, Category, Comment, Media, NewAuthor, NewComment, NewMedia, NewPost,
    PostChanges, PostListQuery, PostRow, VerificationCode,
};

/// Per-table id sequences, like one BIGSERIAL per table.
#[derive(Default)]
struct Sequences {
    authors: i64,
    codes: i64,
    categories: i64,
    posts: i64,
    media: i64,
    comments: i64,
}

fn next_id(sequence: &mut i64) -> i64 {
    *sequence += 1;
    *sequence
}

#[derive(Default)]
struct Tables {
    ids: Sequences,
    authors: BTreeMap<i64, (Author, Option<DateTime<Utc>>)>,
    codes: BTreeMap<String, VerificationCode>,
    categories: BTreeMap<i64, Category>,
    posts: BTreeMap<i64, (PostRow, Option<DateTime<Utc>>)>,
    media: BTreeMap<i64, Media>,
    comments: BTreeMap<i64, Comment>,
}

impl Tables {
    fn live_author(&self, id: i64) -> Option<&Author> {
        match self.authors.get(&id) {
            Some((author, None)) => Some(author),
            _ => None,
        }
    }

    fn live_post(&self, id: i64) -> Option<&PostRow> {
        match self.posts.get(&id) {
            Some((post, None)) => Some(post),
            _ => None,
        }
    }
}

/// Mutex-guarded tables. The lock is never held across an await point.
#[derive(Default)]
pub struct MemoryDatabase {
    tables: Mutex<Tables>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Backend(anyhow::anyhow!("memory store lock poisoned")))
    }
}

#[async_trait]
impl HealthCheck for MemoryDatabase {
    async fn ping(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }
}

#[async_trait]
impl AuthorStore for MemoryDatabase {
    async fn insert_author(&self, author: NewAuthor) -> Result<Author, StoreError> {
        let mut tables = self.lock()?;

        if let Some(email) = &author.email {
            let taken = tables
                .authors
                .values()
                .any(|(a, deleted)| deleted.is_none() && a.email.as_deref() == Some(email.as_str()));
            if taken {
                return Err(StoreError::UniqueViolation("idx_authors_email_live".to_string()));
            }
        }

        let now = Utc::now();
        let id = next_id(&mut tables.ids.authors);
        let created = Author {
            id,
            name: author.name,
            email: author.email,
            password_hash: author.password_hash,
            avatar_path: author.avatar_path,
            email_verified_at: author.email_verified_at,
            created_at: now,
            updated_at: now,
        };
        tables.authors.insert(id, (created.clone(), None));
        Ok(created)
    }

    async fn find_author(&self, id: i64) -> Result<Option<Author>, StoreError> {
        Ok(self.lock()?.live_author(id).cloned())
    }

    async fn find_author_by_email(&self, email: &str) -> Result<Option<Author>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .authors
            .values()
            .find(|(a, deleted)| deleted.is_none() && a.email.as_deref() == Some(email))
            .map(|(a, _)| a.clone()))
    }

    async fn list_authors(&self) -> Result<Vec<Author>, StoreError> {
        let tables = self.lock()?;
        let mut authors: Vec<Author> = tables
            .authors
            .values()
            .filter(|(_, deleted)| deleted.is_none())
            .map(|(a, _)| a.clone())
            .collect();
        authors.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(authors)
    }

    async fn update_author(
        &self,
        id: i64,
        changes: AuthorChanges,
    ) -> Result<Option<Author>, StoreError> {
        let mut tables = self.lock()?;
        match tables.authors.get_mut(&id) {
            Some((author, None)) => {
                if let Some(name) = changes.name {
                    author.name = name;
                }
                if let Some(avatar_path) = changes.avatar_path {
                    author.avatar_path = Some(avatar_path);
                }
                author.updated_at = Utc::now();
                Ok(Some(author.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn soft_delete_author(&self, id: i64) -> Result<bool, StoreError> {
        let mut tables = self.lock()?;
        match tables.authors.get_mut(&id) {
            Some((_, deleted @ None)) => {
                *deleted = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl VerificationCodeStore for MemoryDatabase {
    async fn put_code(&self, email: &str, code: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        let now = Utc::now();
        let id = next_id(&mut tables.ids.codes);
        tables.codes.insert(
            email.to_string(),
            VerificationCode {
                id,
                email: email.to_string(),
                code: code.to_string(),
                expires_at: now + ttl,
                created_at: now,
            },
        );
        Ok(())
    }

    async fn find_valid_code(
        &self,
        email: &str,
        code: &str,
    ) -> Result<Option<VerificationCode>, StoreError> {
        let tables = self.lock()?;
        let now = Utc::now();
        Ok(tables
            .codes
            .get(email)
            .filter(|entry| entry.matches(email, code, now))
            .cloned())
    }

    async fn delete_codes_for(&self, email: &str) -> Result<u64, StoreError> {
        Ok(self.lock()?.codes.remove(email).map_or(0, |_| 1))
    }

    async fn delete_expired_codes(&self) -> Result<u64, StoreError> {
        let mut tables = self.lock()?;
        let now = Utc::now();
        let before = tables.codes.len();
        tables.codes.retain(|_, entry| !entry.is_expired_at(now));
        Ok((before - tables.codes.len()) as u64)
    }
}

#[async_trait]
impl CategoryStore for MemoryDatabase {
    async fn insert_category(&self, name: &str) -> Result<Category, StoreError> {
        let mut tables = self.lock()?;
        if tables.categories.values().any(|c| c.name == name) {
            return Err(StoreError::UniqueViolation("categories_name_key".to_string()));
        }

        let now = Utc::now();
        let id = next_id(&mut tables.ids.categories);
        let category = Category {
            id,
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn find_category(&self, id: i64) -> Result<Option<Category>, StoreError> {
        Ok(self.lock()?.categories.get(&id).cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let mut categories: Vec<Category> = self.lock()?.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(categories)
    }

    async fn rename_category(&self, id: i64, name: &str) -> Result<Option<Category>, StoreError> {
        let mut tables = self.lock()?;
        if tables
            .categories
            .values()
            .any(|c| c.id != id && c.name == name)
        {
            return Err(StoreError::UniqueViolation("categories_name_key".to_string()));
        }

        Ok(tables.categories.get_mut(&id).map(|category| {
            category.name = name.to_string();
            category.updated_at = Utc::now();
            category.clone()
        }))
    }

    async fn delete_category(&self, id: i64) -> Result<bool, StoreError> {
        let mut tables = self.lock()?;
        if tables.categories.remove(&id).is_none() {
            return Ok(false);
        }
        // ON DELETE SET NULL
        for (post, _) in tables.posts.values_mut() {
            if post.category_id == Some(id) {
                post.category_id = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl PostStore for MemoryDatabase {
    async fn insert_post(&self, post: NewPost) -> Result<PostRow, StoreError> {
        let mut tables = self.lock()?;
        let now = Utc::now();
        let id = next_id(&mut tables.ids.posts);
        let row = PostRow {
            id,
            title: post.title,
            body: post.body,
            banner_path: None,
            author_id: post.author_id,
            category_id: post.category_id,
            created_at: now,
            updated_at: now,
        };
        tables.posts.insert(id, (row.clone(), None));
        Ok(row)
    }

    async fn find_post(&self, id: i64) -> Result<Option<PostRow>, StoreError> {
        Ok(self.lock()?.live_post(id).cloned())
    }

    async fn list_posts(&self, query: PostListQuery) -> Result<Vec<PostRow>, StoreError> {
        let tables = self.lock()?;
        let mut posts: Vec<PostRow> = tables
            .posts
            .values()
            .filter(|(_, deleted)| deleted.is_none())
            .map(|(p, _)| p)
            .filter(|p| query.category_id.map_or(true, |c| p.category_id == Some(c)))
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(posts
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .collect())
    }

    async fn update_post(
        &self,
        id: i64,
        changes: PostChanges,
    ) -> Result<Option<PostRow>, StoreError> {
        let mut tables = self.lock()?;
        match tables.posts.get_mut(&id) {
            Some((post, None)) => {
                if let Some(title) = changes.title {
                    post.title = title;
                }
                if let Some(body) = changes.body {
                    post.body = body;
                }
                if let Some(category_id) = changes.category_id {
                    post.category_id = Some(category_id);
                }
                if let Some(banner_path) = changes.banner_path {
                    post.banner_path = Some(banner_path);
                }
                post.updated_at = Utc::now();
                Ok(Some(post.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn soft_delete_post(&self, id: i64) -> Result<bool, StoreError> {
        let mut tables = self.lock()?;
        match tables.posts.get_mut(&id) {
            Some((_, deleted @ None)) => {
                *deleted = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl MediaStore for MemoryDatabase {
    async fn insert_media(&self, media: NewMedia) -> Result<Media, StoreError> {
        let mut tables = self.lock()?;
        let id = next_id(&mut tables.ids.media);
        let created = Media {
            id,
            post_id: media.post_id,
            media_type: media.kind.as_str().to_string(),
            path: media.path,
            filename: media.filename,
            created_at: Utc::now(),
        };
        tables.media.insert(id, created.clone());
        Ok(created)
    }

    async fn list_media_for_posts(&self, post_ids: &[i64]) -> Result<Vec<Media>, StoreError> {
        Ok(self
            .lock()?
            .media
            .values()
            .filter(|m| post_ids.contains(&m.post_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CommentStore for MemoryDatabase {
    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
        let mut tables = self.lock()?;
        let now = Utc::now();
        let id = next_id(&mut tables.ids.comments);
        let created = Comment {
            id,
            post_id: comment.post_id,
            body: comment.body,
            author_id: comment.author_id,
            author_name: comment.author_name,
            created_at: now,
            updated_at: now,
        };
        tables.comments.insert(id, created.clone());
        Ok(created)
    }

    async fn find_comment(&self, id: i64) -> Result<Option<Comment>, StoreError> {
        Ok(self.lock()?.comments.get(&id).cloned())
    }

    async fn list_comments_for_post(&self, post_id: i64) -> Result<Vec<Comment>, StoreError> {
        let mut comments: Vec<Comment> = self
            .lock()?
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn update_comment_body(
        &self,
        id: i64,
        body: &str,
    ) -> Result<Option<Comment>, StoreError> {
        Ok(self.lock()?.comments.get_mut(&id).map(|comment| {
            comment.body = body.to_string();
            comment.updated_at = Utc::now();
            comment.clone()
        }))
    }

    async fn delete_comment(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.lock()?.comments.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_author(name: &str, email: Option<&str>) -> NewAuthor {
        NewAuthor {
            name: name.to_string(),
            email: email.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_put_code_replaces_previous_code() {
        let store = MemoryDatabase::new();
        store
            .put_code("ada@example.com", "111111", Duration::minutes(15))
            .await
            .unwrap();
        store
            .put_code("ada@example.com", "222222", Duration::minutes(15))
            .await
            .unwrap();

        assert!(store
            .find_valid_code("ada@example.com", "111111")
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_valid_code("ada@example.com", "222222")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_each_table_numbers_its_own_rows() {
        let store = MemoryDatabase::new();
        store
            .put_code("ada@example.com", "111111", Duration::minutes(15))
            .await
            .unwrap();

        let author = store
            .insert_author(new_author("Ada", Some("ada@example.com")))
            .await
            .unwrap();
        let category = store.insert_category("Rust").await.unwrap();
        let post = store
            .insert_post(NewPost {
                title: "Hello".to_string(),
                body: String::new(),
                author_id: Some(author.id),
                category_id: Some(category.id),
            })
            .await
            .unwrap();

        assert_eq!(author.id, 1);
        assert_eq!(category.id, 1);
        assert_eq!(post.id, 1);
    }

    #[tokio::test]
    async fn test_expired_code_is_invisible_but_kept_until_reaped() {
        let store = MemoryDatabase::new();
        store
            .put_code("ada@example.com", "123456", Duration::minutes(-1))
            .await
            .unwrap();

        assert!(store
            .find_valid_code("ada@example.com", "123456")
            .await
            .unwrap()
            .is_none());
        assert_eq!(store.delete_expired_codes().await.unwrap(), 1);
        assert_eq!(store.delete_codes_for("ada@example.com").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_email_unique_among_live_authors() {
        let store = MemoryDatabase::new();
        let first = store
            .insert_author(new_author("Ada", Some("ada@example.com")))
            .await
            .unwrap();

        let dup = store
            .insert_author(new_author("Ada Again", Some("ada@example.com")))
            .await;
        assert!(matches!(dup, Err(StoreError::UniqueViolation(_))));

        assert!(store.soft_delete_author(first.id).await.unwrap());
        assert!(store.find_author(first.id).await.unwrap().is_none());
        assert!(store
            .insert_author(new_author("Ada Returns", Some("ada@example.com")))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_anonymous_authors_have_no_email_conflict() {
        let store = MemoryDatabase::new();
        store.insert_author(new_author("Anon", None)).await.unwrap();
        store.insert_author(new_author("Anon", None)).await.unwrap();
        assert_eq!(store.list_authors().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_posts_filters_and_pages() {
        let store = MemoryDatabase::new();
        let category = store.insert_category("Rust").await.unwrap();
        for i in 0..5 {
            store
                .insert_post(NewPost {
                    title: format!("post {}", i),
                    body: String::new(),
                    author_id: None,
                    category_id: (i % 2 == 0).then_some(category.id),
                })
                .await
                .unwrap();
        }

        let in_category = store
            .list_posts(PostListQuery {
                limit: 10,
                offset: 0,
                category_id: Some(category.id),
            })
            .await
            .unwrap();
        assert_eq!(in_category.len(), 3);

        let page = store
            .list_posts(PostListQuery {
                limit: 2,
                offset: 1,
                category_id: None,
            })
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
        // newest first
        assert!(page[0].id > page[1].id);
    }

    #[tokio::test]
    async fn test_deleting_category_detaches_posts() {
        let store = MemoryDatabase::new();
        let category = store.insert_category("Rust").await.unwrap();
        let post = store
            .insert_post(NewPost {
                title: "t".to_string(),
                body: String::new(),
                author_id: None,
                category_id: Some(category.id),
            })
            .await
            .unwrap();

        assert!(store.delete_category(category.id).await.unwrap());
        let post = store.find_post(post.id).await.unwrap().unwrap();
        assert_eq!(post.category_id, None);
    }
}
