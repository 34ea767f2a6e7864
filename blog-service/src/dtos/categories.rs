use utoipa::ToSchema;

#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct CategoryForm {
    #[schema(example = "Engineering", max_length = 200)]
    pub name: String,
}
