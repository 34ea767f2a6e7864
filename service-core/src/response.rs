use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Success envelope: `{"success": true, "data": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

pub fn ok<T: Serialize>(data: T) -> ApiResponse<T> {
    ApiResponse::ok(data)
}

pub fn created<T: Serialize>(data: T) -> (StatusCode, ApiResponse<T>) {
    (StatusCode::CREATED, ApiResponse::ok(data))
}
