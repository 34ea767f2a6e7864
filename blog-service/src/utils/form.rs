//! Form bodies for the multipart and urlencoded endpoints.

use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::{header, StatusCode},
    Form, Json,
};
use service_core::error::AppError;
use std::collections::HashMap;

/// A file part of a multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Text fields and files of a request body.
///
/// Accepts `multipart/form-data`, `application/x-www-form-urlencoded`, and a
/// flat JSON object. A request without a body yields an empty form.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: Vec<UploadedFile>,
}

impl FormData {
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            files: Vec::new(),
        }
    }

    /// Trimmed value, `None` when missing or blank.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn owned_text(&self, name: &str) -> Option<String> {
        self.text(name).map(str::to_string)
    }

    /// Optional integer field. Blank counts as absent.
    pub fn i64_field(&self, name: &str) -> Result<Option<i64>, AppError> {
        match self.text(name) {
            None => Ok(None),
            Some(raw) => raw.parse::<i64>().map(Some).map_err(|_| {
                AppError::bad_request("validation_error", format!("{} must be an integer", name))
            }),
        }
    }

    /// Remove and return the first file sent under `field`.
    pub fn take_file(&mut self, field: &str) -> Option<UploadedFile> {
        let index = self.files.iter().position(|f| f.field == field)?;
        Some(self.files.remove(index))
    }

    /// Remove and return every file sent under `field`.
    pub fn take_files(&mut self, field: &str) -> Vec<UploadedFile> {
        let (taken, kept) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|f| f.field == field);
        self.files = kept;
        taken
    }

    pub fn push_file(&mut self, file: UploadedFile) {
        self.files.push(file);
    }

    async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = FormData::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field.content_type().map(str::to_string);
                    let data = field.bytes().await.map_err(multipart_error)?;
                    // Browsers send an empty part for an untouched file input
                    if file_name.is_empty() && data.is_empty() {
                        continue;
                    }
                    form.files.push(UploadedFile {
                        field: name,
                        file_name,
                        content_type,
                        data,
                    });
                }
                None => {
                    let value = field.text().await.map_err(multipart_error)?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge("Request body too large".to_string());
    }
    AppError::bad_request("invalid_form", format!("Invalid multipart body: {}", err.body_text()))
}

fn json_scalar(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[axum::async_trait]
impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase())
            .unwrap_or_default();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state).await.map_err(|e| {
                AppError::bad_request("invalid_form", format!("Invalid multipart body: {}", e))
            })?;
            return FormData::from_multipart(multipart).await;
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|e| {
                    AppError::bad_request("invalid_form", format!("Invalid form body: {}", e))
                })?;
            return Ok(FormData::from_fields(pairs));
        }

        if content_type.starts_with("application/json") {
            let Json(object) =
                Json::<serde_json::Map<String, serde_json::Value>>::from_request(req, state)
                    .await
                    .map_err(|e| {
                        AppError::bad_request("invalid_body", format!("Invalid JSON body: {}", e))
                    })?;
            return Ok(FormData::from_fields(
                object
                    .into_iter()
                    .filter_map(|(k, v)| json_scalar(v).map(|v| (k, v))),
            ));
        }

        if content_type.is_empty() {
            return Ok(FormData::default());
        }

        Err(AppError::bad_request(
            "unsupported_media_type",
            format!("Unsupported content type: {}", content_type),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;

    fn file(field: &str, name: &str) -> UploadedFile {
        UploadedFile {
            field: field.to_string(),
            file_name: name.to_string(),
            content_type: None,
            data: Bytes::from_static(b"data"),
        }
    }

    #[test]
    fn test_text_trims_and_ignores_blank() {
        let form = FormData::from_fields([("title", "  Hello  "), ("body", "   ")]);
        assert_eq!(form.text("title"), Some("Hello"));
        assert_eq!(form.text("body"), None);
        assert_eq!(form.text("missing"), None);
    }

    #[test]
    fn test_i64_field() {
        let form = FormData::from_fields([("category_id", "7"), ("bad", "seven"), ("blank", "")]);
        assert_eq!(form.i64_field("category_id").unwrap(), Some(7));
        assert_eq!(form.i64_field("blank").unwrap(), None);
        assert!(form.i64_field("bad").is_err());
    }

    #[test]
    fn test_take_files_by_field() {
        let mut form = FormData::default();
        form.push_file(file("files", "a.png"));
        form.push_file(file("banner", "b.png"));
        form.push_file(file("files", "c.mp4"));

        let banner = form.take_file("banner").unwrap();
        assert_eq!(banner.file_name, "b.png");

        let files = form.take_files("files");
        assert_eq!(files.len(), 2);
        assert!(form.take_file("files").is_none());
    }

    #[tokio::test]
    async fn test_extracts_urlencoded_and_json() {
        let req = HttpRequest::builder()
            .method("PUT")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("body=hello+world&author_name=Ada"))
            .unwrap();
        let form = FormData::from_request(req, &()).await.unwrap();
        assert_eq!(form.text("body"), Some("hello world"));

        let req = HttpRequest::builder()
            .method("PUT")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"post_id": 3, "body": "hi"}"#))
            .unwrap();
        let form = FormData::from_request(req, &()).await.unwrap();
        assert_eq!(form.i64_field("post_id").unwrap(), Some(3));
        assert_eq!(form.text("body"), Some("hi"));
    }

    #[tokio::test]
    async fn test_extracts_multipart() {
        let boundary = "XBOUNDARY";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nHello\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"pic.png\"\r\n\
             Content-Type: image/png\r\n\r\nPNGDATA\r\n--{b}--\r\n",
            b = boundary
        );
        let req = HttpRequest::builder()
            .method("POST")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap();

        let mut form = FormData::from_request(req, &()).await.unwrap();
        assert_eq!(form.text("title"), Some("Hello"));

        let files = form.take_files("files");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name, "pic.png");
        assert_eq!(files[0].data.as_ref(), b"PNGDATA");
    }
}
