//! Test helpers for blog-service integration tests.
//!
//! Builds the real router over the in-memory store, dev code echo, and a
//! temporary upload directory. Requests go through `oneshot`; no socket is
//! bound.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use blog_service::{
    build_router,
    config::{
        BlogConfig, DatabaseConfig, Environment, JwtConfig, RateLimitConfig, SecretString,
        SecurityConfig, UploadConfig, VerificationConfig,
    },
    services::{CodeDelivery, EmailProvider, LocalStorage, MemoryDatabase},
    AppState,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

pub const TEST_PASSWORD: &str = "correct horse battery";
pub const BOUNDARY: &str = "blog-test-boundary";

pub fn test_config(upload_dir: &str) -> BlogConfig {
    BlogConfig {
        common: service_core::config::Config::default(),
        environment: Environment::Dev,
        service_name: "blog-service".to_string(),
        service_version: "test".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        jwt: JwtConfig {
            secret: SecretString::new("integration-test-secret".to_string()),
            expiry_hours: 1,
        },
        verification: VerificationConfig {
            code_ttl_minutes: 15,
            expose_dev_codes: true,
            reap_interval_seconds: 600,
        },
        uploads: UploadConfig {
            dir: upload_dir.to_string(),
            max_file_mb: 1,
            body_limit_bytes: 4 * 1024 * 1024,
        },
        rate_limit: RateLimitConfig {
            auth_attempts: 100,
            auth_window_seconds: 60,
        },
        security: SecurityConfig {
            allowed_origins: vec!["*".to_string()],
        },
        smtp: None,
        swagger_enabled: false,
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryDatabase>,
    pub upload_dir: TempDir,
}

/// A registered author and their bearer token.
pub struct Registered {
    pub id: i64,
    pub email: String,
    pub token: String,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    pub async fn spawn_with(customize: impl FnOnce(&mut BlogConfig)) -> Self {
        Self::build(customize, CodeDelivery::Echo).await
    }

    /// Deliver codes through `provider` instead of echoing them.
    pub async fn spawn_with_email(provider: Arc<dyn EmailProvider>) -> Self {
        Self::build(
            |config| config.verification.expose_dev_codes = false,
            CodeDelivery::Email(provider),
        )
        .await
    }

    async fn build(customize: impl FnOnce(&mut BlogConfig), delivery: CodeDelivery) -> Self {
        let upload_dir = tempfile::tempdir().expect("Failed to create upload dir");
        let mut config = test_config(upload_dir.path().to_str().expect("utf-8 temp path"));
        customize(&mut config);

        let store = Arc::new(MemoryDatabase::new());
        let storage = Arc::new(
            LocalStorage::new(upload_dir.path())
                .await
                .expect("Failed to create storage"),
        );

        let state = AppState::new(config, store.clone(), delivery, storage, None);
        let router = build_router(state.clone()).expect("Failed to build router");

        TestApp {
            router,
            state,
            store,
            upload_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn send_json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.send(request).await;
        let status = response.status();
        (status, body_json(response).await)
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send_json(json_request("POST", uri, &body, None)).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send_json(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("request"),
        )
        .await
    }

    /// Request a code, redeem it, and return the new account.
    pub async fn register(&self, email: &str, name: &str) -> Registered {
        let (status, body) = self
            .post_json("/auth/register/request", json!({ "email": email }))
            .await;
        assert_eq!(status, StatusCode::OK, "request code failed: {}", body);
        let code = body["data"]["dev_code"]
            .as_str()
            .expect("dev code echoed")
            .to_string();

        let (status, body) = self
            .post_json(
                "/auth/register/verify",
                json!({
                    "email": email,
                    "code": code,
                    "name": name,
                    "password": TEST_PASSWORD,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "verify failed: {}", body);

        Registered {
            id: body["data"]["author"]["id"].as_i64().expect("author id"),
            email: email.to_string(),
            token: body["data"]["token"].as_str().expect("token").to_string(),
        }
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("JSON body")
}

pub fn json_request(method: &str, uri: &str, body: &Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn form_request(
    method: &str,
    uri: &str,
    fields: &[(&str, &str)],
    token: Option<&str>,
) -> Request<Body> {
    let encoded = fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencode(v)))
        .collect::<Vec<_>>()
        .join("&");
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(encoded)).expect("request")
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).expect("request")
}

/// One part of a multipart body: `(field, Some(file_name), contents)` for files,
/// `(field, None, text)` for plain fields.
pub type Part<'a> = (&'a str, Option<&'a str>, &'a str);

pub fn multipart_request(
    method: &str,
    uri: &str,
    parts: &[Part<'_>],
    token: Option<&str>,
) -> Request<Body> {
    let mut body = Vec::new();
    for (field, file_name, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match file_name {
            Some(file_name) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                        field, file_name
                    )
                    .as_bytes(),
                );
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", field)
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(data.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    let mut builder = Request::builder().method(method).uri(uri).header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={}", BOUNDARY),
    );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body)).expect("request")
}

fn urlencode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            b' ' => "+".to_string(),
            _ => format!("%{:02X}", b),
        })
        .collect()
}

pub fn assert_error(status: StatusCode, body: &Value, expected: StatusCode, code: &str) {
    assert_eq!(status, expected, "unexpected status, body: {}", body);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], code, "unexpected code, body: {}", body);
    assert!(body["error"].is_string());
}
