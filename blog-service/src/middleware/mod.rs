pub mod auth;

pub use auth::AuthAuthor;
