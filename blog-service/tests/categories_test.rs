mod common;

use axum::http::StatusCode;
use common::{assert_error, empty_request, form_request, TestApp};

#[tokio::test]
async fn test_category_mutations_require_token() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .send_json(form_request("POST", "/categories", &[("name", "Rust")], None))
        .await;
    assert_error(status, &body, StatusCode::UNAUTHORIZED, "auth_required");

    let (status, body) = app.get("/categories").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_category_lifecycle() {
    let app = TestApp::spawn().await;
    let ada = app.register("ada@example.com", "Ada").await;
    let token = Some(ada.token.as_str());

    let (status, body) = app
        .send_json(form_request("POST", "/categories", &[("name", " Systems ")], token))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["name"], "Systems");
    let uri = format!("/categories/{}", body["data"]["id"].as_i64().unwrap());

    let (status, body) = app
        .send_json(form_request("POST", "/categories", &[("name", "Systems")], token))
        .await;
    assert_error(status, &body, StatusCode::BAD_REQUEST, "category_exists");

    let (status, body) = app
        .send_json(form_request("PUT", &uri, &[("name", "Systems Programming")], token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Systems Programming");

    let (status, body) = app.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Systems Programming");

    let response = app.send(empty_request("DELETE", &uri, token)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (status, body) = app.get(&uri).await;
    assert_error(status, &body, StatusCode::NOT_FOUND, "not_found");
}

#[tokio::test]
async fn test_category_name_rules() {
    let app = TestApp::spawn().await;
    let ada = app.register("ada@example.com", "Ada").await;
    let token = Some(ada.token.as_str());

    let (status, body) = app
        .send_json(form_request("POST", "/categories", &[("name", "")], token))
        .await;
    assert_error(status, &body, StatusCode::BAD_REQUEST, "validation_error");

    let too_long = "c".repeat(201);
    let (status, body) = app
        .send_json(form_request("POST", "/categories", &[("name", too_long.as_str())], token))
        .await;
    assert_error(status, &body, StatusCode::BAD_REQUEST, "validation_error");

    let (status, body) = app
        .send_json(form_request("PUT", "/categories/777", &[("name", "Ghost")], token))
        .await;
    assert_error(status, &body, StatusCode::NOT_FOUND, "not_found");
}

#[tokio::test]
async fn test_deleting_category_uncategorizes_posts() {
    let app = TestApp::spawn().await;
    let ada = app.register("ada@example.com", "Ada").await;
    let token = Some(ada.token.as_str());

    let (_, category) = app
        .send_json(form_request("POST", "/categories", &[("name", "Drafts")], token))
        .await;
    let category_id = category["data"]["id"].as_i64().unwrap();

    let category_field = category_id.to_string();
    let (_, post) = app
        .send_json(form_request(
            "POST",
            "/posts",
            &[("title", "Filed"), ("category_id", category_field.as_str())],
            token,
        ))
        .await;
    assert_eq!(post["data"]["category_id"], category_id);
    let post_uri = format!("/posts/{}", post["data"]["id"].as_i64().unwrap());

    let response = app
        .send(empty_request("DELETE", &format!("/categories/{}", category_id), token))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (status, body) = app.get(&post_uri).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["category_id"].is_null());
    assert!(body["data"].get("category").is_none());
}
