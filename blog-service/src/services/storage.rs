//! Upload sink and the rules uploads must pass before being written.

use async_trait::async_trait;
use axum::body::Bytes;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use uuid::Uuid;

use super::error::ServiceError;
use crate::models::MediaKind;
use crate::utils::UploadedFile;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov"];
const MAX_FILENAME_CHARS: usize = 255;

#[async_trait]
pub trait Storage: Send + Sync {
    async fn upload(&self, key: &str, data: Bytes) -> Result<(), ServiceError>;
    async fn delete(&self, key: &str) -> Result<(), ServiceError>;
}

/// Files under a base directory. Keys are relative paths.
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub async fn new(base_path: impl Into<PathBuf>) -> Result<Self, ServiceError> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)
            .await
            .map_err(|e| ServiceError::Internal(e.into()))?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(&self, key: &str, data: Bytes) -> Result<(), ServiceError> {
        let path = self.base_path.join(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ServiceError::Internal(e.into()))?;
        }
        fs::write(&path, data)
            .await
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Failed to write {}: {}", key, e)))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), ServiceError> {
        let path = self.base_path.join(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ServiceError::Internal(e.into())),
        }
    }
}

/// Which kinds of file a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accept {
    Images,
    ImagesAndVideos,
}

/// A file that passed the allow-list and size checks.
#[derive(Debug, Clone)]
pub struct ValidatedUpload {
    pub kind: MediaKind,
    pub extension: String,
    pub file_name: String,
    data: Bytes,
}

pub fn media_kind_for(extension: &str) -> Option<MediaKind> {
    let ext = extension.to_ascii_lowercase();
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Image)
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Video)
    } else {
        None
    }
}

/// Validates and stores uploads under generated keys.
#[derive(Clone)]
pub struct Uploads {
    storage: Arc<dyn Storage>,
    max_file_bytes: u64,
}

impl Uploads {
    pub fn new(storage: Arc<dyn Storage>, max_file_bytes: u64) -> Self {
        Self {
            storage,
            max_file_bytes,
        }
    }

    pub fn validate(
        &self,
        file: UploadedFile,
        accept: Accept,
    ) -> Result<ValidatedUpload, ServiceError> {
        let file_name = Path::new(&file.file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.chars().take(MAX_FILENAME_CHARS).collect::<String>())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ServiceError::validation(format!("{}: file name is missing", file.field)))?;

        let extension = Path::new(&file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let kind = match (media_kind_for(&extension), accept) {
            (Some(MediaKind::Image), _) => MediaKind::Image,
            (Some(MediaKind::Video), Accept::ImagesAndVideos) => MediaKind::Video,
            _ => {
                let allowed = match accept {
                    Accept::Images => IMAGE_EXTENSIONS.join(", "),
                    Accept::ImagesAndVideos => {
                        [IMAGE_EXTENSIONS, VIDEO_EXTENSIONS].concat().join(", ")
                    }
                };
                return Err(ServiceError::validation(format!(
                    "{}: unsupported file type '{}' (allowed: {})",
                    file.field, file_name, allowed
                )));
            }
        };

        if file.size() == 0 {
            return Err(ServiceError::validation(format!(
                "{}: '{}' is empty",
                file.field, file_name
            )));
        }

        if file.size() > self.max_file_bytes {
            return Err(ServiceError::validation(format!(
                "{}: '{}' exceeds the {} MB limit",
                file.field,
                file_name,
                self.max_file_bytes / (1024 * 1024)
            )));
        }

        Ok(ValidatedUpload {
            kind,
            extension,
            file_name,
            data: file.data,
        })
    }

    /// Write under `dir` and return the storage key.
    pub async fn store(&self, upload: &ValidatedUpload, dir: &str) -> Result<String, ServiceError> {
        let key = format!(
            "{}/{}_{}.{}",
            dir.trim_end_matches('/'),
            Utc::now().timestamp_millis(),
            &Uuid::new_v4().simple().to_string()[..8],
            upload.extension
        );

        self.storage.upload(&key, upload.data.clone()).await?;

        tracing::debug!(key = %key, bytes = upload.data.len(), "Upload stored");
        Ok(key)
    }

    /// Best effort; a failure is logged.
    pub async fn discard(&self, key: &str) {
        if let Err(e) = self.storage.delete(key).await {
            tracing::warn!(key = %key, error = %e, "Failed to remove upload");
        }
    }
}
