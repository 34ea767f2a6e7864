mod common;

use axum::http::{header, StatusCode};
use blog_service::services::MockEmailService;
use common::{assert_error, json_request, TestApp, TEST_PASSWORD};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_request_code_echoes_code_in_dev() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .post_json("/auth/register/request", json!({ "email": "  Ada@Example.COM " }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["sent"], true);
    let code = body["data"]["dev_code"].as_str().unwrap();
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_digit()));
}

#[tokio::test]
async fn test_request_code_rejects_invalid_email() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .post_json("/auth/register/request", json!({ "email": "not-an-email" }))
        .await;
    assert_error(status, &body, StatusCode::BAD_REQUEST, "validation_error");

    let (status, body) = app.post_json("/auth/register/request", json!({})).await;
    assert_error(status, &body, StatusCode::BAD_REQUEST, "validation_error");
}

#[tokio::test]
async fn test_verify_registers_author_and_returns_token() {
    let app = TestApp::spawn().await;

    let (_, body) = app
        .post_json("/auth/register/request", json!({ "email": "ada@example.com" }))
        .await;
    let code = body["data"]["dev_code"].as_str().unwrap().to_string();

    let response = app
        .send(json_request(
            "POST",
            "/auth/register/verify",
            &json!({
                "email": "ADA@example.com",
                "code": code,
                "name": "Ada Lovelace",
                "password": TEST_PASSWORD,
            }),
            None,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let authorization = response
        .headers()
        .get(header::AUTHORIZATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(authorization.starts_with("Bearer "));

    let body = common::body_json(response).await;
    assert_eq!(body["data"]["author"]["name"], "Ada Lovelace");
    assert_eq!(body["data"]["author"]["verified"], true);
    assert_eq!(body["data"]["author"]["email"], "ada@example.com");
    assert!(body["data"]["author"].get("password_hash").is_none());
    assert_eq!(body["data"]["token_type"], "Bearer");
    assert_eq!(
        authorization,
        format!("Bearer {}", body["data"]["token"].as_str().unwrap())
    );
}

#[tokio::test]
async fn test_code_is_single_use() {
    let app = TestApp::spawn().await;

    let (_, body) = app
        .post_json("/auth/register/request", json!({ "email": "ada@example.com" }))
        .await;
    let code = body["data"]["dev_code"].as_str().unwrap().to_string();
    let verify = json!({
        "email": "ada@example.com",
        "code": code,
        "name": "Ada",
        "password": TEST_PASSWORD,
    });

    let (status, _) = app.post_json("/auth/register/verify", verify.clone()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.post_json("/auth/register/verify", verify).await;
    assert_error(status, &body, StatusCode::BAD_REQUEST, "invalid_or_expired_code");
}

#[tokio::test]
async fn test_newer_code_supersedes_older_one() {
    let app = TestApp::spawn().await;

    let (_, first) = app
        .post_json("/auth/register/request", json!({ "email": "ada@example.com" }))
        .await;
    let first_code = first["data"]["dev_code"].as_str().unwrap().to_string();

    let mut second_code = first_code.clone();
    // Codes are random; retry until the replacement differs
    while second_code == first_code {
        let (_, second) = app
            .post_json("/auth/register/request", json!({ "email": "ada@example.com" }))
            .await;
        second_code = second["data"]["dev_code"].as_str().unwrap().to_string();
    }

    let (status, body) = app
        .post_json(
            "/auth/register/verify",
            json!({
                "email": "ada@example.com",
                "code": first_code,
                "name": "Ada",
                "password": TEST_PASSWORD,
            }),
        )
        .await;
    assert_error(status, &body, StatusCode::BAD_REQUEST, "invalid_or_expired_code");
}

#[tokio::test]
async fn test_registering_a_taken_email_fails() {
    let app = TestApp::spawn().await;
    app.register("ada@example.com", "Ada").await;

    let (_, body) = app
        .post_json("/auth/register/request", json!({ "email": "ada@example.com" }))
        .await;
    let code = body["data"]["dev_code"].as_str().unwrap().to_string();

    let (status, body) = app
        .post_json(
            "/auth/register/verify",
            json!({
                "email": "ada@example.com",
                "code": code,
                "name": "Ada Again",
                "password": TEST_PASSWORD,
            }),
        )
        .await;
    assert_error(status, &body, StatusCode::BAD_REQUEST, "email_already_registered");
}

#[tokio::test]
async fn test_short_password_is_rejected() {
    let app = TestApp::spawn().await;

    let (_, body) = app
        .post_json("/auth/register/request", json!({ "email": "ada@example.com" }))
        .await;
    let code = body["data"]["dev_code"].as_str().unwrap().to_string();

    let (status, body) = app
        .post_json(
            "/auth/register/verify",
            json!({
                "email": "ada@example.com",
                "code": code,
                "name": "Ada",
                "password": "short",
            }),
        )
        .await;
    assert_error(status, &body, StatusCode::BAD_REQUEST, "validation_error");
}

#[tokio::test]
async fn test_login_succeeds_with_registered_credentials() {
    let app = TestApp::spawn().await;
    let registered = app.register("ada@example.com", "Ada").await;

    let response = app
        .send(json_request(
            "POST",
            "/auth/login",
            &json!({ "email": " ADA@example.com", "password": TEST_PASSWORD }),
            None,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(header::AUTHORIZATION));
    let body = common::body_json(response).await;
    assert_eq!(body["data"]["author"]["id"], registered.id);
    assert_eq!(body["data"]["author"]["email"], "ada@example.com");
    assert!(body["data"]["token"].as_str().is_some());

    // Other users still see the public profile only
    let (_, profile) = app.get(&format!("/authors/{}", registered.id)).await;
    assert!(profile["data"].get("email").is_none());
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = TestApp::spawn().await;
    app.register("ada@example.com", "Ada").await;

    let (status, wrong_password) = app
        .post_json(
            "/auth/login",
            json!({ "email": "ada@example.com", "password": "wrong password" }),
        )
        .await;
    assert_error(status, &wrong_password, StatusCode::BAD_REQUEST, "invalid_credentials");

    let (status, unknown_email) = app
        .post_json(
            "/auth/login",
            json!({ "email": "nobody@example.com", "password": TEST_PASSWORD }),
        )
        .await;
    assert_error(status, &unknown_email, StatusCode::BAD_REQUEST, "invalid_credentials");

    assert_eq!(wrong_password, unknown_email);
}

#[tokio::test]
async fn test_login_requires_email_and_password() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .post_json("/auth/login", json!({ "email": "", "password": "" }))
        .await;
    assert_error(status, &body, StatusCode::BAD_REQUEST, "validation_error");
}

#[tokio::test]
async fn test_malformed_json_body_is_rejected() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .send_json(
            axum::http::Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from("{not json"))
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_email_delivery_hides_code_from_response() {
    let mailer = Arc::new(MockEmailService::new());
    let app = TestApp::spawn_with_email(mailer.clone()).await;

    let (status, body) = app
        .post_json("/auth/register/request", json!({ "email": "Ada@Example.com" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["sent"], true);
    assert!(body["data"].get("dev_code").is_none());

    let code = mailer.last_code_for("ada@example.com").expect("code mailed");
    let (status, body) = app
        .post_json(
            "/auth/register/verify",
            json!({
                "email": "ada@example.com",
                "code": code,
                "name": "Ada",
                "password": TEST_PASSWORD,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
}

#[tokio::test]
async fn test_delivery_failure_is_not_reported_to_caller() {
    let app = TestApp::spawn_with_email(Arc::new(MockEmailService::failing())).await;

    let (status, body) = app
        .post_json("/auth/register/request", json!({ "email": "ada@example.com" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["sent"], true);
}
