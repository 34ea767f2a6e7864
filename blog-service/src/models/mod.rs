//! Domain models for blog-service.

mod author;
mod category;
mod comment;
mod media;
mod post;
mod verification_code;

pub use author::{Author, AuthorChanges, NewAuthor, PublicAuthor, SelfAuthor};
pub use category::Category;
pub use comment::{Comment, NewComment};
pub use media::{Media, MediaKind, NewMedia};
pub use post::{NewPost, Post, PostChanges, PostListQuery, PostRow};
pub use verification_code::VerificationCode;
