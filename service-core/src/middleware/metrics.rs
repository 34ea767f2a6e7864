use crate::error::AppError;
use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Install the process-wide Prometheus recorder. Call once at start-up.
pub fn install_recorder() -> Result<PrometheusHandle, AppError> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Failed to install metrics recorder: {}", e)))
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    // Route template keeps label cardinality bounded (`/posts/:id`, not `/posts/42`)
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;

    let duration = start.elapsed();
    let status = response.status().as_u16().to_string();

    let labels = [
        ("method", method),
        ("path", path),
        ("status", status),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());

    response
}
