use utoipa::ToSchema;

/// Multipart body for creating or updating an author.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct AuthorForm {
    #[schema(example = "Ada Lovelace", max_length = 255)]
    pub name: Option<String>,
    /// Avatar image.
    #[schema(format = Binary)]
    pub avatar: Option<String>,
}
