pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    extract::{DefaultBodyLimit, FromRef},
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use service_core::error::{panic_response, AppError};
use service_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{ip_rate_limit_middleware, FixedWindowRateLimiter, SharedRateLimiter},
    security_headers::security_headers_middleware,
    tracing::{make_request_span, request_id_middleware, REQUEST_ID_HEADER},
};
use std::{sync::Arc, time::Duration};
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::BlogConfig;
use crate::services::{
    AuthService, AuthorService, BlogStore, CategoryService, CodeDelivery, CommentService,
    JwtService, PostService, Storage, Uploads,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::auth::request_code,
        handlers::auth::verify,
        handlers::auth::login,
        handlers::posts::list_posts,
        handlers::posts::get_post,
        handlers::posts::create_post,
        handlers::posts::update_post,
        handlers::posts::delete_post,
        handlers::comments::list_for_post,
        handlers::comments::create_for_post,
        handlers::comments::create_comment,
        handlers::comments::get_comment,
        handlers::comments::update_comment,
        handlers::comments::delete_comment,
        handlers::authors::list_authors,
        handlers::authors::get_author,
        handlers::authors::create_author,
        handlers::authors::update_author,
        handlers::authors::delete_author,
        handlers::categories::list_categories,
        handlers::categories::get_category,
        handlers::categories::create_category,
        handlers::categories::update_category,
        handlers::categories::delete_category,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::auth::RequestCodeRequest,
            dtos::auth::RequestCodeResponse,
            dtos::auth::VerifyRequest,
            dtos::auth::LoginRequest,
            dtos::auth::AuthResponse,
            dtos::posts::PostForm,
            dtos::comments::CommentForm,
            dtos::comments::CommentUpdateForm,
            dtos::authors::AuthorForm,
            dtos::categories::CategoryForm,
            handlers::health::HealthStatus,
            models::Post,
            models::PublicAuthor,
            models::SelfAuthor,
            models::Category,
            models::Comment,
            models::Media,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Email-code registration and login"),
        (name = "Posts", description = "Blog posts with banner and media uploads"),
        (name = "Comments", description = "Comments on posts"),
        (name = "Authors", description = "Author profiles"),
        (name = "Categories", description = "Post categories"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BlogConfig>,
    pub store: Arc<dyn BlogStore>,
    pub jwt: JwtService,
    pub auth: AuthService,
    pub posts: PostService,
    pub comments: CommentService,
    pub authors: AuthorService,
    pub categories: CategoryService,
    pub auth_limiter: SharedRateLimiter,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wire the services over one store and one upload backend.
    pub fn new(
        config: BlogConfig,
        store: Arc<dyn BlogStore>,
        delivery: CodeDelivery,
        storage: Arc<dyn Storage>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        let jwt = JwtService::new(&config.jwt);
        let uploads = Uploads::new(storage, config.uploads.max_file_bytes());

        let auth = AuthService::new(
            store.clone(),
            delivery,
            jwt.clone(),
            chrono::Duration::minutes(config.verification.code_ttl_minutes),
        );
        let posts = PostService::new(store.clone(), uploads.clone());
        let comments = CommentService::new(store.clone());
        let authors = AuthorService::new(store.clone(), uploads);
        let categories = CategoryService::new(store.clone());

        let auth_limiter = FixedWindowRateLimiter::shared(
            config.rate_limit.auth_attempts,
            Duration::from_secs(config.rate_limit.auth_window_seconds),
        );

        Self {
            config: Arc::new(config),
            store,
            jwt,
            auth,
            posts,
            comments,
            authors,
            categories,
            auth_limiter,
            metrics,
        }
    }
}

impl FromRef<AppState> for JwtService {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

pub fn build_router(state: AppState) -> Result<Router, AppError> {
    // Registration and login share one per-IP budget
    let auth_routes = Router::new()
        .route("/auth/register/request", post(handlers::auth::request_code))
        .route("/auth/register/verify", post(handlers::auth::verify))
        .route("/auth/login", post(handlers::auth::login))
        .layer(from_fn_with_state(
            state.auth_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let mut app = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::metrics));

    if state.config.swagger_enabled {
        app =
            app.merge(SwaggerUi::new("/docs").url("/.well-known/openapi.json", ApiDoc::openapi()));
    } else {
        app = app.route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );
    }

    let cors = cors_layer(&state.config.security.allowed_origins)?;
    let body_limit = state.config.uploads.body_limit_bytes;
    let upload_dir = state.config.uploads.dir.clone();

    let app = app
        .merge(auth_routes)
        .route(
            "/posts",
            get(handlers::posts::list_posts).post(handlers::posts::create_post),
        )
        .route(
            "/posts/:id",
            get(handlers::posts::get_post)
                .put(handlers::posts::update_post)
                .delete(handlers::posts::delete_post),
        )
        .route(
            "/posts/:id/comments",
            get(handlers::comments::list_for_post).post(handlers::comments::create_for_post),
        )
        .route("/comments", post(handlers::comments::create_comment))
        .route(
            "/comments/:id",
            get(handlers::comments::get_comment)
                .put(handlers::comments::update_comment)
                .delete(handlers::comments::delete_comment),
        )
        .route(
            "/authors",
            get(handlers::authors::list_authors).post(handlers::authors::create_author),
        )
        .route(
            "/authors/:id",
            get(handlers::authors::get_author)
                .put(handlers::authors::update_author)
                .delete(handlers::authors::delete_author),
        )
        .route(
            "/categories",
            get(handlers::categories::list_categories)
                .post(handlers::categories::create_category),
        )
        .route(
            "/categories/:id",
            get(handlers::categories::get_category)
                .put(handlers::categories::update_category)
                .delete(handlers::categories::delete_category),
        )
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors);

    Ok(app)
}

fn cors_layer(allowed_origins: &[String]) -> Result<CorsLayer, AppError> {
    let allow_origin = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins = allowed_origins
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>().map_err(|e| {
                    AppError::ConfigError(anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(origins)
    };

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, request_id.clone()])
        .expose_headers([header::AUTHORIZATION, request_id]))
}
