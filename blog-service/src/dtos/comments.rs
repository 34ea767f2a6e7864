use utoipa::ToSchema;

/// Form body for creating a comment. `post_id` is required on `POST /comments`
/// and ignored on `POST /posts/{post_id}/comments`.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct CommentForm {
    #[schema(example = 3)]
    pub post_id: Option<i64>,
    #[schema(example = "Great write-up!", max_length = 2000)]
    pub body: String,
    /// Display name. Defaults to the caller's author name.
    #[schema(example = "Ada")]
    pub author_name: Option<String>,
}

#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct CommentUpdateForm {
    #[schema(example = "Edited: great write-up!", max_length = 2000)]
    pub body: Option<String>,
}
