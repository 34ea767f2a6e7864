use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::services::{PostDraft, PostEdit};
use crate::utils::FormData;
use service_core::error::AppError;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListPostsQuery {
    /// Page size, 1 to 100. Default 20.
    pub limit: Option<i64>,
    /// Rows to skip. Default 0.
    pub offset: Option<i64>,
    /// Only posts in this category.
    pub category_id: Option<i64>,
}

/// Multipart body for creating or updating a post. On update every field is
/// optional and blank fields keep the current value.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct PostForm {
    #[schema(example = "Shipping the blog API")]
    pub title: String,
    #[schema(example = "It went well.")]
    pub body: Option<String>,
    #[schema(example = 1)]
    pub category_id: Option<i64>,
    /// Banner image.
    #[schema(format = Binary)]
    pub banner: Option<String>,
    /// Image or video files, repeated.
    #[schema(value_type = Option<Vec<String>>)]
    pub files: Option<Vec<String>>,
}

impl PostDraft {
    pub fn from_form(mut form: FormData) -> Result<Self, AppError> {
        Ok(Self {
            title: form.owned_text("title"),
            body: form.owned_text("body"),
            category_id: form.i64_field("category_id")?,
            banner: form.take_file("banner"),
            files: form.take_files("files"),
        })
    }
}

impl PostEdit {
    pub fn from_form(mut form: FormData) -> Result<Self, AppError> {
        Ok(Self {
            title: form.owned_text("title"),
            body: form.owned_text("body"),
            category_id: form.i64_field("category_id")?,
            banner: form.take_file("banner"),
            files: form.take_files("files"),
        })
    }
}
