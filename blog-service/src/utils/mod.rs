pub mod form;
pub mod password;
pub mod validation;

pub use form::{FormData, UploadedFile};
pub use password::{hash_password, verify_password, Password, PasswordHashString};
pub use validation::{PathParam, QueryParams, ValidatedJson};
