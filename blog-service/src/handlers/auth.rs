//! Registration by emailed code, and login.
//!
//! All routes here sit behind the auth rate limiter.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};
use service_core::{
    error::AppError,
    response::{ok, ApiResponse},
};

use crate::{
    dtos::auth::{AuthResponse, LoginRequest, RequestCodeRequest, RequestCodeResponse, VerifyRequest},
    utils::{Password, ValidatedJson},
    AppState,
};

/// Request a registration code
#[utoipa::path(
    post,
    path = "/auth/register/request",
    request_body = RequestCodeRequest,
    responses(
        (status = 200, description = "Code issued", body = RequestCodeResponse),
        (status = 400, description = "Invalid email", body = crate::dtos::ErrorResponse),
        (status = 429, description = "Too many requests", body = crate::dtos::ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn request_code(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RequestCodeRequest>,
) -> Result<ApiResponse<RequestCodeResponse>, AppError> {
    let requested = state.auth.request_verification(&req.email).await?;
    Ok(ok(RequestCodeResponse::from(requested)))
}

/// Redeem a registration code and create the account
#[utoipa::path(
    post,
    path = "/auth/register/verify",
    request_body = VerifyRequest,
    responses(
        (status = 201, description = "Author registered", body = AuthResponse),
        (status = 400, description = "Invalid or expired code, email taken, or weak password", body = crate::dtos::ErrorResponse),
        (status = 429, description = "Too many requests", body = crate::dtos::ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn verify(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<VerifyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = state
        .auth
        .verify_and_register(&req.email, &req.code, &req.name, Password::new(req.password))
        .await?;

    let bearer = format!("Bearer {}", session.token);
    Ok((
        StatusCode::CREATED,
        [(header::AUTHORIZATION, bearer)],
        ok(AuthResponse::from(session)),
    ))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 400, description = "Invalid credentials", body = crate::dtos::ErrorResponse),
        (status = 429, description = "Too many requests", body = crate::dtos::ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = state
        .auth
        .login(&req.email, Password::new(req.password))
        .await?;

    let bearer = format!("Bearer {}", session.token);
    Ok(([(header::AUTHORIZATION, bearer)], ok(AuthResponse::from(session))))
}
