//! Services layer for blog-service.
//!
//! Business rules live here; handlers only translate HTTP to these calls.

pub mod auth;
pub mod authors;
pub mod categories;
pub mod comments;
mod database;
mod email;
pub mod error;
mod jwt;
pub mod memory;
pub mod ownership;
pub mod posts;
mod reaper;
pub mod storage;
pub mod store;

pub use auth::{AuthService, AuthSession, CodeDelivery, CodeRequested};
pub use authors::AuthorService;
pub use categories::CategoryService;
pub use comments::CommentService;
pub use database::Database;
pub use email::{EmailProvider, EmailService, MockEmailService};
pub use error::ServiceError;
pub use jwt::{AuthorClaims, InvalidToken, JwtService};
pub use memory::MemoryDatabase;
pub use ownership::{can_mutate, Caller};
pub use posts::{PostDraft, PostEdit, PostService};
pub use reaper::spawn_code_reaper;
pub use storage::{LocalStorage, Storage, Uploads};
pub use store::{BlogStore, StoreError};
