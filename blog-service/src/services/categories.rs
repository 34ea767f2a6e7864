use std::sync::Arc;

use super::{error::ServiceError, store::{BlogStore, StoreError}};
use crate::models::Category;

pub const MAX_CATEGORY_NAME_CHARS: usize = 200;

#[derive(Clone)]
pub struct CategoryService {
    store: Arc<dyn BlogStore>,
}

impl CategoryService {
    pub fn new(store: Arc<dyn BlogStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Category>, ServiceError> {
        Ok(self.store.list_categories().await?)
    }

    pub async fn get(&self, id: i64) -> Result<Category, ServiceError> {
        self.store
            .find_category(id)
            .await?
            .ok_or(ServiceError::NotFound("Category"))
    }

    pub async fn create(&self, name: Option<&str>) -> Result<Category, ServiceError> {
        let name = validate_name(name)?;
        let category = self
            .store
            .insert_category(&name)
            .await
            .map_err(map_duplicate)?;

        tracing::info!(category_id = category.id, name = %category.name, "Category created");
        Ok(category)
    }

    pub async fn rename(&self, id: i64, name: Option<&str>) -> Result<Category, ServiceError> {
        let name = validate_name(name)?;
        let category = self
            .store
            .rename_category(id, &name)
            .await
            .map_err(map_duplicate)?
            .ok_or(ServiceError::NotFound("Category"))?;

        tracing::info!(category_id = id, name = %category.name, "Category renamed");
        Ok(category)
    }

    /// Posts in the category become uncategorized.
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !self.store.delete_category(id).await? {
            return Err(ServiceError::NotFound("Category"));
        }
        tracing::info!(category_id = id, "Category deleted");
        Ok(())
    }
}

fn validate_name(name: Option<&str>) -> Result<String, ServiceError> {
    let name = name.map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(ServiceError::validation("name is required"));
    }
    if name.chars().count() > MAX_CATEGORY_NAME_CHARS {
        return Err(ServiceError::validation(format!(
            "name must be at most {} characters",
            MAX_CATEGORY_NAME_CHARS
        )));
    }
    Ok(name.to_string())
}

fn map_duplicate(err: StoreError) -> ServiceError {
    match err {
        StoreError::UniqueViolation(_) => ServiceError::CategoryExists,
        other => ServiceError::Store(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewPost;
    use crate::services::memory::MemoryDatabase;
    use crate::services::store::PostStore;

    #[tokio::test]
    async fn test_names_are_trimmed_bounded_and_unique() {
        let service = CategoryService::new(Arc::new(MemoryDatabase::new()));

        let rust = service.create(Some("  Rust ")).await.unwrap();
        assert_eq!(rust.name, "Rust");

        assert!(matches!(service.create(Some("Rust")).await, Err(ServiceError::CategoryExists)));
        assert!(matches!(service.create(Some(" ")).await, Err(ServiceError::Validation(_))));
        let long = "n".repeat(MAX_CATEGORY_NAME_CHARS + 1);
        assert!(matches!(service.create(Some(&long)).await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_rename_and_missing() {
        let service = CategoryService::new(Arc::new(MemoryDatabase::new()));
        let rust = service.create(Some("Rust")).await.unwrap();
        service.create(Some("Go")).await.unwrap();

        assert!(matches!(
            service.rename(rust.id, Some("Go")).await,
            Err(ServiceError::CategoryExists)
        ));
        assert_eq!(service.rename(rust.id, Some("Rustlang")).await.unwrap().name, "Rustlang");
        assert!(matches!(
            service.rename(999, Some("Zig")).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_uncategorizes_posts() {
        let store = Arc::new(MemoryDatabase::new());
        let service = CategoryService::new(store.clone());
        let rust = service.create(Some("Rust")).await.unwrap();
        let post = store
            .insert_post(NewPost {
                title: "Hello".to_string(),
                body: String::new(),
                author_id: None,
                category_id: Some(rust.id),
            })
            .await
            .unwrap();

        service.delete(rust.id).await.unwrap();

        assert_eq!(store.find_post(post.id).await.unwrap().unwrap().category_id, None);
        assert!(matches!(service.delete(rust.id).await, Err(ServiceError::NotFound(_))));
    }
}
