use axum::{extract::State, http::StatusCode, response::IntoResponse};
use service_core::{
    error::AppError,
    response::{created, ok, ApiResponse},
};

use crate::{
    middleware::AuthAuthor,
    models::PublicAuthor,
    utils::{FormData, PathParam},
    AppState,
};

/// List authors by name
#[utoipa::path(
    get,
    path = "/authors",
    responses((status = 200, description = "Authors", body = Vec<PublicAuthor>)),
    tag = "Authors"
)]
pub async fn list_authors(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<PublicAuthor>>, AppError> {
    let authors = state.authors.list().await?;
    Ok(ok(authors.into_iter().map(PublicAuthor::from).collect()))
}

/// Get an author
#[utoipa::path(
    get,
    path = "/authors/{id}",
    params(("id" = i64, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author", body = PublicAuthor),
        (status = 404, description = "Author not found", body = crate::dtos::ErrorResponse)
    ),
    tag = "Authors"
)]
pub async fn get_author(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> Result<ApiResponse<PublicAuthor>, AppError> {
    Ok(ok(PublicAuthor::from(state.authors.get(id).await?)))
}

/// Create an author without login credentials
#[utoipa::path(
    post,
    path = "/authors",
    request_body(content = crate::dtos::authors::AuthorForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Author created", body = PublicAuthor),
        (status = 400, description = "Validation error", body = crate::dtos::ErrorResponse)
    ),
    tag = "Authors"
)]
pub async fn create_author(
    State(state): State<AppState>,
    mut form: FormData,
) -> Result<impl IntoResponse, AppError> {
    let avatar = form.take_file("avatar");
    let author = state
        .authors
        .create_anonymous(form.text("name"), avatar)
        .await?;
    Ok(created(PublicAuthor::from(author)))
}

/// Update your own profile
#[utoipa::path(
    put,
    path = "/authors/{id}",
    params(("id" = i64, Path, description = "Author ID; must be the caller")),
    request_body(content = crate::dtos::authors::AuthorForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Author updated", body = PublicAuthor),
        (status = 400, description = "Validation error", body = crate::dtos::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::dtos::ErrorResponse),
        (status = 403, description = "Not the caller's own profile", body = crate::dtos::ErrorResponse),
        (status = 404, description = "Author not found", body = crate::dtos::ErrorResponse)
    ),
    tag = "Authors",
    security(("bearer_auth" = []))
)]
pub async fn update_author(
    State(state): State<AppState>,
    AuthAuthor(caller): AuthAuthor,
    PathParam(id): PathParam<i64>,
    mut form: FormData,
) -> Result<ApiResponse<PublicAuthor>, AppError> {
    let avatar = form.take_file("avatar");
    let author = state
        .authors
        .update(caller, id, form.text("name"), avatar)
        .await?;
    Ok(ok(PublicAuthor::from(author)))
}

/// Delete your own profile
#[utoipa::path(
    delete,
    path = "/authors/{id}",
    params(("id" = i64, Path, description = "Author ID; must be the caller")),
    responses(
        (status = 204, description = "Author deleted"),
        (status = 401, description = "Missing or invalid token", body = crate::dtos::ErrorResponse),
        (status = 403, description = "Not the caller's own profile", body = crate::dtos::ErrorResponse),
        (status = 404, description = "Author not found", body = crate::dtos::ErrorResponse)
    ),
    tag = "Authors",
    security(("bearer_auth" = []))
)]
pub async fn delete_author(
    State(state): State<AppState>,
    AuthAuthor(caller): AuthAuthor,
    PathParam(id): PathParam<i64>,
) -> Result<StatusCode, AppError> {
    state.authors.delete(caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
