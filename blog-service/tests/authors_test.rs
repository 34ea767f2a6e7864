mod common;

use axum::http::StatusCode;
use common::{assert_error, empty_request, form_request, multipart_request, TestApp};
use serde_json::json;

#[tokio::test]
async fn test_anonymous_author_has_no_email_and_cannot_log_in() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .send_json(form_request("POST", "/authors", &[("name", "Guest Writer")], None))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["name"], "Guest Writer");
    assert_eq!(body["data"]["verified"], false);
    assert!(body["data"].get("email").is_none());

    let (status, body) = app.get("/authors").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = app
        .post_json(
            "/auth/login",
            json!({ "email": "guest@example.com", "password": "whatever123" }),
        )
        .await;
    assert_error(status, &body, StatusCode::BAD_REQUEST, "invalid_credentials");
}

#[tokio::test]
async fn test_create_author_requires_name() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .send_json(form_request("POST", "/authors", &[("name", "   ")], None))
        .await;
    assert_error(status, &body, StatusCode::BAD_REQUEST, "validation_error");
}

#[tokio::test]
async fn test_author_updates_own_profile_and_avatar() {
    let app = TestApp::spawn().await;
    let ada = app.register("ada@example.com", "Ada").await;
    let uri = format!("/authors/{}", ada.id);

    let (status, body) = app
        .send_json(multipart_request(
            "PUT",
            &uri,
            &[
                ("name", None, "Ada Lovelace"),
                ("avatar", Some("me.webp"), "fake webp"),
            ],
            Some(&ada.token),
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["name"], "Ada Lovelace");
    let first_avatar = body["data"]["avatar_path"].as_str().unwrap().to_string();
    assert!(first_avatar.starts_with("avatars/"));
    assert!(app.upload_dir.path().join(&first_avatar).exists());

    // A replacement avatar discards the previous file
    let (status, body) = app
        .send_json(multipart_request(
            "PUT",
            &uri,
            &[("avatar", Some("me2.png"), "another fake image")],
            Some(&ada.token),
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["name"], "Ada Lovelace");
    let second_avatar = body["data"]["avatar_path"].as_str().unwrap();
    assert_ne!(second_avatar, first_avatar);
    assert!(!app.upload_dir.path().join(&first_avatar).exists());

    let (status, body) = app
        .send_json(multipart_request(
            "PUT",
            &uri,
            &[("avatar", Some("clip.mp4"), "video is not an avatar")],
            Some(&ada.token),
        ))
        .await;
    assert_error(status, &body, StatusCode::BAD_REQUEST, "validation_error");
}

#[tokio::test]
async fn test_author_cannot_touch_other_profiles() {
    let app = TestApp::spawn().await;
    let ada = app.register("ada@example.com", "Ada").await;
    let grace = app.register("grace@example.com", "Grace").await;

    let (status, body) = app
        .send_json(form_request(
            "PUT",
            &format!("/authors/{}", grace.id),
            &[("name", "Not Grace")],
            Some(&ada.token),
        ))
        .await;
    assert_error(status, &body, StatusCode::FORBIDDEN, "forbidden");

    // Ownership is checked before existence
    let (status, body) = app
        .send_json(empty_request("DELETE", "/authors/999999", Some(&ada.token)))
        .await;
    assert_error(status, &body, StatusCode::FORBIDDEN, "forbidden");
}

#[tokio::test]
async fn test_deleted_author_disappears() {
    let app = TestApp::spawn().await;
    let ada = app.register("ada@example.com", "Ada").await;
    let uri = format!("/authors/{}", ada.id);

    let response = app.send(empty_request("DELETE", &uri, Some(&ada.token))).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (status, body) = app.get(&uri).await;
    assert_error(status, &body, StatusCode::NOT_FOUND, "not_found");

    let (status, body) = app.get("/authors").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
}
