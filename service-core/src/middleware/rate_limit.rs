//! Fixed-window request limiter keyed by client address.
//!
//! Every key shares one window. When the window rolls over the whole table is
//! cleared, so a burst at the end of one window may be followed by a full
//! quota at the start of the next.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use crate::error::AppError;
use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

pub const X_RATELIMIT_LIMIT: &str = "x-ratelimit-limit";
pub const X_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";

/// Key used when no client address can be determined.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Limiter shared between the router layers that use it.
pub type SharedRateLimiter = Arc<FixedWindowRateLimiter>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed { remaining: usize },
    Limited { retry_after: Duration },
}

#[derive(Debug)]
pub struct FixedWindowRateLimiter {
    max_requests: usize,
    window: Duration,
    state: Mutex<WindowState>,
}

#[derive(Debug)]
struct WindowState {
    rolls_over_at: Instant,
    hits: HashMap<String, Vec<Instant>>,
}

impl FixedWindowRateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1) as usize,
            window,
            state: Mutex::new(WindowState {
                rolls_over_at: Instant::now() + window,
                hits: HashMap::new(),
            }),
        }
    }

    pub fn shared(max_requests: u32, window: Duration) -> SharedRateLimiter {
        Arc::new(Self::new(max_requests, window))
    }

    pub fn limit(&self) -> usize {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record a request for `key` and decide whether it may proceed.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, Instant::now())
    }

    pub fn check_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let state = &mut *guard;

        if now >= state.rolls_over_at {
            state.hits.clear();
            state.rolls_over_at = now + self.window;
        }

        let window = self.window;
        let hits = state.hits.entry(key.to_string()).or_default();
        hits.retain(|t| now.saturating_duration_since(*t) < window);

        if hits.len() >= self.max_requests {
            return RateLimitDecision::Limited {
                retry_after: state.rolls_over_at.saturating_duration_since(now),
            };
        }

        hits.push(now);
        RateLimitDecision::Allowed {
            remaining: self.max_requests - hits.len(),
        }
    }

    /// Number of keys with recorded requests in the current window.
    pub fn tracked_clients(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .hits
            .len()
    }
}

/// Client address: first `X-Forwarded-For` entry, then `X-Real-IP`, then the
/// transport peer.
pub fn client_address(request: &Request) -> Option<String> {
    let headers = request.headers();

    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok());
    if let Some(ip) = forwarded {
        return Some(ip.to_string());
    }

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<IpAddr>().ok());
    if let Some(ip) = real_ip {
        return Some(ip.to_string());
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
}

/// Middleware for IP-based rate limiting
pub async fn ip_rate_limit_middleware(
    State(limiter): State<SharedRateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = client_address(&request).unwrap_or_else(|| {
        tracing::warn!("Could not determine client address for rate limiting");
        UNKNOWN_CLIENT.to_string()
    });

    let limit = HeaderValue::from(limiter.limit());

    match limiter.check(&key) {
        RateLimitDecision::Allowed { remaining } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert(X_RATELIMIT_LIMIT, limit);
            headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(remaining));
            Ok(response)
        }
        RateLimitDecision::Limited { retry_after } => {
            tracing::warn!(client = %key, path = %request.uri().path(), "Rate limit exceeded");

            let retry_secs = retry_after.as_secs().max(1);
            let mut response = AppError::TooManyRequests(
                "Too many requests. Please try again later.".to_string(),
                Some(retry_secs),
            )
            .into_response();
            let headers = response.headers_mut();
            headers.insert(X_RATELIMIT_LIMIT, limit);
            headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(0u32));
            Ok(response)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::StatusCode, middleware::from_fn_with_state, routing::post};
    use axum::http::Request as HttpRequest;
    use tower::util::ServiceExt;

    #[test]
    fn test_allows_up_to_limit_then_rejects() {
        let limiter = FixedWindowRateLimiter::new(3, Duration::from_secs(60));
        let now = Instant::now();

        for expected_remaining in [2, 1, 0] {
            assert_eq!(
                limiter.check_at("10.0.0.1", now),
                RateLimitDecision::Allowed {
                    remaining: expected_remaining
                }
            );
        }

        assert!(matches!(
            limiter.check_at("10.0.0.1", now),
            RateLimitDecision::Limited { .. }
        ));
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = FixedWindowRateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(matches!(
            limiter.check_at("10.0.0.1", now),
            RateLimitDecision::Allowed { .. }
        ));
        assert!(matches!(
            limiter.check_at("10.0.0.2", now),
            RateLimitDecision::Allowed { .. }
        ));
        assert!(matches!(
            limiter.check_at("10.0.0.1", now),
            RateLimitDecision::Limited { .. }
        ));
    }

    #[test]
    fn test_rollover_clears_whole_table() {
        let window = Duration::from_secs(60);
        let limiter = FixedWindowRateLimiter::new(2, window);
        let now = Instant::now();

        limiter.check_at("10.0.0.1", now);
        limiter.check_at("10.0.0.1", now);
        limiter.check_at("10.0.0.2", now);
        assert!(matches!(
            limiter.check_at("10.0.0.1", now),
            RateLimitDecision::Limited { .. }
        ));
        assert_eq!(limiter.tracked_clients(), 2);

        let later = now + window + Duration::from_millis(1);
        assert_eq!(
            limiter.check_at("10.0.0.1", later),
            RateLimitDecision::Allowed { remaining: 1 }
        );
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn test_retry_after_points_at_rollover() {
        let window = Duration::from_secs(60);
        let limiter = FixedWindowRateLimiter::new(1, window);
        let now = Instant::now();

        limiter.check_at("10.0.0.1", now);
        match limiter.check_at("10.0.0.1", now) {
            RateLimitDecision::Limited { retry_after } => assert!(retry_after <= window),
            other => panic!("expected limited, got {:?}", other),
        }
    }

    #[test]
    fn test_client_address_prefers_forwarded_for() {
        let request = HttpRequest::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .header("x-real-ip", "198.51.100.2")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_address(&request).as_deref(), Some("203.0.113.7"));

        let request = HttpRequest::builder()
            .header("x-real-ip", "198.51.100.2")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_address(&request).as_deref(), Some("198.51.100.2"));

        let mut request = HttpRequest::builder().body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 9], 4242))));
        assert_eq!(client_address(&request).as_deref(), Some("192.0.2.9"));

        let request = HttpRequest::builder()
            .header("x-forwarded-for", "not-an-ip")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_address(&request), None);
    }

    #[tokio::test]
    async fn test_middleware_short_circuits_with_429() {
        let limiter = FixedWindowRateLimiter::shared(1, Duration::from_secs(60));
        let app = Router::new()
            .route("/login", post(|| async { "ok" }))
            .layer(from_fn_with_state(limiter, ip_rate_limit_middleware));

        let request = || {
            HttpRequest::builder()
                .method("POST")
                .uri("/login")
                .header("x-forwarded-for", "203.0.113.50")
                .body(Body::empty())
                .unwrap()
        };

        let first = app.clone().oneshot(request()).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(first.headers().get(X_RATELIMIT_LIMIT).unwrap(), "1");

        let second = app.oneshot(request()).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(second.headers().contains_key("retry-after"));
    }
}
