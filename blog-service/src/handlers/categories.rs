use axum::{extract::State, http::StatusCode, response::IntoResponse};
use service_core::{
    error::AppError,
    response::{created, ok, ApiResponse},
};

use crate::{
    middleware::AuthAuthor,
    models::Category,
    utils::{FormData, PathParam},
    AppState,
};

/// List categories by name
#[utoipa::path(
    get,
    path = "/categories",
    responses((status = 200, description = "Categories", body = Vec<Category>)),
    tag = "Categories"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<Category>>, AppError> {
    Ok(ok(state.categories.list().await?))
}

/// Get a category
#[utoipa::path(
    get,
    path = "/categories/{id}",
    params(("id" = i64, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category", body = Category),
        (status = 404, description = "Category not found", body = crate::dtos::ErrorResponse)
    ),
    tag = "Categories"
)]
pub async fn get_category(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> Result<ApiResponse<Category>, AppError> {
    Ok(ok(state.categories.get(id).await?))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/categories",
    request_body(content = crate::dtos::categories::CategoryForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Invalid or duplicate name", body = crate::dtos::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::dtos::ErrorResponse)
    ),
    tag = "Categories",
    security(("bearer_auth" = []))
)]
pub async fn create_category(
    State(state): State<AppState>,
    AuthAuthor(caller): AuthAuthor,
    form: FormData,
) -> Result<impl IntoResponse, AppError> {
    let category = state.categories.create(form.text("name")).await?;
    tracing::debug!(author_id = caller.author_id, category_id = category.id, "Category added by author");
    Ok(created(category))
}

/// Rename a category
#[utoipa::path(
    put,
    path = "/categories/{id}",
    params(("id" = i64, Path, description = "Category ID")),
    request_body(content = crate::dtos::categories::CategoryForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Category renamed", body = Category),
        (status = 400, description = "Invalid or duplicate name", body = crate::dtos::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::dtos::ErrorResponse),
        (status = 404, description = "Category not found", body = crate::dtos::ErrorResponse)
    ),
    tag = "Categories",
    security(("bearer_auth" = []))
)]
pub async fn update_category(
    State(state): State<AppState>,
    AuthAuthor(_caller): AuthAuthor,
    PathParam(id): PathParam<i64>,
    form: FormData,
) -> Result<ApiResponse<Category>, AppError> {
    Ok(ok(state.categories.rename(id, form.text("name")).await?))
}

/// Delete a category; its posts become uncategorized
#[utoipa::path(
    delete,
    path = "/categories/{id}",
    params(("id" = i64, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 401, description = "Missing or invalid token", body = crate::dtos::ErrorResponse),
        (status = 404, description = "Category not found", body = crate::dtos::ErrorResponse)
    ),
    tag = "Categories",
    security(("bearer_auth" = []))
)]
pub async fn delete_category(
    State(state): State<AppState>,
    AuthAuthor(_caller): AuthAuthor,
    PathParam(id): PathParam<i64>,
) -> Result<StatusCode, AppError> {
    state.categories.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
