use axum::extract::State;
use serde::Serialize;
use service_core::{
    error::AppError,
    response::{ok, ApiResponse},
};
use utoipa::ToSchema;

use crate::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    #[schema(example = "healthy")]
    pub status: &'static str,
    #[schema(example = "blog-service")]
    pub service: String,
    #[schema(example = "1.0.0")]
    pub version: String,
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthStatus),
        (status = 503, description = "Store unreachable")
    ),
    tag = "Observability"
)]
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<ApiResponse<HealthStatus>, AppError> {
    state.store.ping().await.map_err(|e| {
        tracing::error!(error = %e, "Store health check failed");
        AppError::ServiceUnavailable
    })?;

    Ok(ok(HealthStatus {
        status: "healthy",
        service: state.config.service_name.clone(),
        version: state.config.service_version.clone(),
    }))
}
