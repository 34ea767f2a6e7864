use axum::{extract::State, http::StatusCode, response::IntoResponse};
use service_core::{
    error::AppError,
    response::{created, ok, ApiResponse},
};

use crate::{
    middleware::AuthAuthor,
    models::Comment,
    utils::{FormData, PathParam},
    AppState,
};

/// List a post's comments, oldest first
#[utoipa::path(
    get,
    path = "/posts/{post_id}/comments",
    params(("post_id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Comments", body = Vec<Comment>),
        (status = 404, description = "Post not found", body = crate::dtos::ErrorResponse)
    ),
    tag = "Comments"
)]
pub async fn list_for_post(
    State(state): State<AppState>,
    PathParam(post_id): PathParam<i64>,
) -> Result<ApiResponse<Vec<Comment>>, AppError> {
    Ok(ok(state.comments.list_for_post(post_id).await?))
}

/// Comment on a post
#[utoipa::path(
    post,
    path = "/posts/{post_id}/comments",
    params(("post_id" = i64, Path, description = "Post ID")),
    request_body(content = crate::dtos::comments::CommentForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 201, description = "Comment created", body = Comment),
        (status = 400, description = "Validation error", body = crate::dtos::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::dtos::ErrorResponse),
        (status = 404, description = "Post not found", body = crate::dtos::ErrorResponse)
    ),
    tag = "Comments",
    security(("bearer_auth" = []))
)]
pub async fn create_for_post(
    State(state): State<AppState>,
    AuthAuthor(caller): AuthAuthor,
    PathParam(post_id): PathParam<i64>,
    form: FormData,
) -> Result<impl IntoResponse, AppError> {
    let comment = state
        .comments
        .create(caller, post_id, form.text("body"), form.text("author_name"))
        .await?;
    Ok(created(comment))
}

/// Comment on the post named by `post_id`
#[utoipa::path(
    post,
    path = "/comments",
    request_body(content = crate::dtos::comments::CommentForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 201, description = "Comment created", body = Comment),
        (status = 400, description = "Validation error", body = crate::dtos::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::dtos::ErrorResponse),
        (status = 404, description = "Post not found", body = crate::dtos::ErrorResponse)
    ),
    tag = "Comments",
    security(("bearer_auth" = []))
)]
pub async fn create_comment(
    State(state): State<AppState>,
    AuthAuthor(caller): AuthAuthor,
    form: FormData,
) -> Result<impl IntoResponse, AppError> {
    let post_id = form
        .i64_field("post_id")?
        .ok_or_else(|| AppError::bad_request("validation_error", "post_id is required"))?;

    let comment = state
        .comments
        .create(caller, post_id, form.text("body"), form.text("author_name"))
        .await?;
    Ok(created(comment))
}

/// Get a comment
#[utoipa::path(
    get,
    path = "/comments/{id}",
    params(("id" = i64, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment", body = Comment),
        (status = 404, description = "Comment not found", body = crate::dtos::ErrorResponse)
    ),
    tag = "Comments"
)]
pub async fn get_comment(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> Result<ApiResponse<Comment>, AppError> {
    Ok(ok(state.comments.get(id).await?))
}

/// Edit a comment. Comment author only
#[utoipa::path(
    put,
    path = "/comments/{id}",
    params(("id" = i64, Path, description = "Comment ID")),
    request_body(content = crate::dtos::comments::CommentUpdateForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Comment updated", body = Comment),
        (status = 400, description = "Validation error", body = crate::dtos::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::dtos::ErrorResponse),
        (status = 403, description = "Not the comment's author", body = crate::dtos::ErrorResponse),
        (status = 404, description = "Comment not found", body = crate::dtos::ErrorResponse)
    ),
    tag = "Comments",
    security(("bearer_auth" = []))
)]
pub async fn update_comment(
    State(state): State<AppState>,
    AuthAuthor(caller): AuthAuthor,
    PathParam(id): PathParam<i64>,
    form: FormData,
) -> Result<ApiResponse<Comment>, AppError> {
    Ok(ok(state.comments.update(caller, id, form.text("body")).await?))
}

/// Delete a comment. Comment author only
#[utoipa::path(
    delete,
    path = "/comments/{id}",
    params(("id" = i64, Path, description = "Comment ID")),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 401, description = "Missing or invalid token", body = crate::dtos::ErrorResponse),
        (status = 403, description = "Not the comment's author", body = crate::dtos::ErrorResponse),
        (status = 404, description = "Comment not found", body = crate::dtos::ErrorResponse)
    ),
    tag = "Comments",
    security(("bearer_auth" = []))
)]
pub async fn delete_comment(
    State(state): State<AppState>,
    AuthAuthor(caller): AuthAuthor,
    PathParam(id): PathParam<i64>,
) -> Result<StatusCode, AppError> {
    state.comments.delete(caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
