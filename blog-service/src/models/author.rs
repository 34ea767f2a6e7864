//! Author model - blog identity, optionally holding login credentials.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Author entity. Never serialized directly; see [`PublicAuthor`].
#[derive(Debug, Clone, FromRow)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub avatar_path: Option<String>,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Author {
    /// Authors created without a password (legacy mode) cannot log in.
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    pub fn is_verified(&self) -> bool {
        self.email_verified_at.is_some()
    }
}

/// Fields for a new author row.
#[derive(Debug, Clone, Default)]
pub struct NewAuthor {
    pub name: String,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub avatar_path: Option<String>,
    pub email_verified_at: Option<DateTime<Utc>>,
}

/// Self-service profile changes. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct AuthorChanges {
    pub name: Option<String>,
    pub avatar_path: Option<String>,
}

impl AuthorChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.avatar_path.is_none()
    }
}

/// Author as shown to other users: no email, no credential material.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PublicAuthor {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "avatars/1718000000000_ada.png")]
    pub avatar_path: Option<String>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Author> for PublicAuthor {
    fn from(author: &Author) -> Self {
        Self {
            id: author.id,
            name: author.name.clone(),
            avatar_path: author.avatar_path.clone(),
            verified: author.is_verified(),
            created_at: author.created_at,
            updated_at: author.updated_at,
        }
    }
}

impl From<Author> for PublicAuthor {
    fn from(author: Author) -> Self {
        PublicAuthor::from(&author)
    }
}

/// The signed-in author's view of their own profile, email included.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SelfAuthor {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[schema(example = "ada@example.com")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_path: Option<String>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Author> for SelfAuthor {
    fn from(author: Author) -> Self {
        Self {
            verified: author.is_verified(),
            id: author.id,
            name: author.name,
            email: author.email,
            avatar_path: author.avatar_path,
            created_at: author.created_at,
            updated_at: author.updated_at,
        }
    }
}
