use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::Response,
};

const API_CSP: &str = "default-src 'none'; frame-ancestors 'none'";
const DOCS_CSP: &str = "default-src 'self'; \
                        script-src 'self' 'unsafe-inline'; \
                        style-src 'self' 'unsafe-inline'; \
                        img-src 'self' data:; \
                        font-src 'self'; \
                        connect-src 'self'";

fn is_docs_route(path: &str) -> bool {
    path.starts_with("/docs") || path == "/.well-known/openapi.json"
}

pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let docs = is_docs_route(req.uri().path());

    let mut response = next.run(req).await;
    apply_security_headers(response.headers_mut(), docs);
    response
}

fn apply_security_headers(headers: &mut HeaderMap, docs: bool) {
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    // Swagger UI needs inline assets and same-origin framing
    let (csp, framing) = if docs {
        (DOCS_CSP, "SAMEORIGIN")
    } else {
        (API_CSP, "DENY")
    };
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(csp),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static(framing));
}
