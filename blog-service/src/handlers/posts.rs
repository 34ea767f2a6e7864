use axum::{extract::State, http::StatusCode, response::IntoResponse};
use service_core::{
    error::AppError,
    response::{created, ok, ApiResponse},
};

use crate::{
    dtos::posts::ListPostsQuery,
    middleware::AuthAuthor,
    models::Post,
    services::{PostDraft, PostEdit},
    utils::{FormData, PathParam, QueryParams},
    AppState,
};

/// List posts, newest first
#[utoipa::path(
    get,
    path = "/posts",
    params(ListPostsQuery),
    responses(
        (status = 200, description = "Page of posts", body = Vec<Post>),
        (status = 400, description = "Malformed query", body = crate::dtos::ErrorResponse)
    ),
    tag = "Posts"
)]
pub async fn list_posts(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListPostsQuery>,
) -> Result<ApiResponse<Vec<Post>>, AppError> {
    let posts = state
        .posts
        .list(query.limit, query.offset, query.category_id)
        .await?;
    Ok(ok(posts))
}

/// Get a post
#[utoipa::path(
    get,
    path = "/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post", body = Post),
        (status = 404, description = "Post not found", body = crate::dtos::ErrorResponse)
    ),
    tag = "Posts"
)]
pub async fn get_post(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> Result<ApiResponse<Post>, AppError> {
    Ok(ok(state.posts.get(id).await?))
}

/// Create a post owned by the caller
#[utoipa::path(
    post,
    path = "/posts",
    request_body(content = crate::dtos::posts::PostForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Post created", body = Post),
        (status = 400, description = "Validation error", body = crate::dtos::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::dtos::ErrorResponse)
    ),
    tag = "Posts",
    security(("bearer_auth" = []))
)]
pub async fn create_post(
    State(state): State<AppState>,
    AuthAuthor(caller): AuthAuthor,
    form: FormData,
) -> Result<impl IntoResponse, AppError> {
    let draft = PostDraft::from_form(form)?;
    let post = state.posts.create(caller, draft).await?;
    Ok(created(post))
}

/// Update a post. Owner only; blank fields keep their value
#[utoipa::path(
    put,
    path = "/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    request_body(content = crate::dtos::posts::PostForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Post updated", body = Post),
        (status = 400, description = "Validation error", body = crate::dtos::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::dtos::ErrorResponse),
        (status = 403, description = "Not the post's author", body = crate::dtos::ErrorResponse),
        (status = 404, description = "Post not found", body = crate::dtos::ErrorResponse)
    ),
    tag = "Posts",
    security(("bearer_auth" = []))
)]
pub async fn update_post(
    State(state): State<AppState>,
    AuthAuthor(caller): AuthAuthor,
    PathParam(id): PathParam<i64>,
    form: FormData,
) -> Result<ApiResponse<Post>, AppError> {
    let edit = PostEdit::from_form(form)?;
    Ok(ok(state.posts.update(caller, id, edit).await?))
}

/// Delete a post. Owner only
#[utoipa::path(
    delete,
    path = "/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 401, description = "Missing or invalid token", body = crate::dtos::ErrorResponse),
        (status = 403, description = "Not the post's author", body = crate::dtos::ErrorResponse),
        (status = 404, description = "Post not found", body = crate::dtos::ErrorResponse)
    ),
    tag = "Posts",
    security(("bearer_auth" = []))
)]
pub async fn delete_post(
    State(state): State<AppState>,
    AuthAuthor(caller): AuthAuthor,
    PathParam(id): PathParam<i64>,
) -> Result<StatusCode, AppError> {
    state.posts.delete(caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
