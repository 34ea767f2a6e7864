use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use service_core::error::AppError;

use crate::services::{Caller, JwtService};

/// Extractor for routes that require a bearer token.
///
/// Yields the caller's identity; handlers pass it on to the services
/// explicitly.
#[derive(Debug, Clone, Copy)]
pub struct AuthAuthor(pub Caller);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthAuthor
where
    S: Send + Sync,
    JwtService: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::unauthorized("auth_required", "Authorization required"))?;

        let token = header_value
            .to_str()
            .ok()
            .and_then(bearer_token)
            .ok_or_else(|| {
                AppError::unauthorized(
                    "invalid_header",
                    "Authorization header must be: Bearer <token>",
                )
            })?;

        let jwt = JwtService::from_ref(state);
        let claims = jwt
            .parse_token(token)
            .map_err(|_| AppError::unauthorized("invalid_token", "Invalid or expired token"))?;

        Ok(AuthAuthor(Caller::new(claims.author_id)))
    }
}

fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
