use blog_service::{
    build_router,
    config::BlogConfig,
    db,
    services::{spawn_code_reaper, CodeDelivery, Database, EmailService, LocalStorage},
    AppState,
};
use service_core::error::AppError;
use service_core::middleware::metrics::install_recorder;
use service_core::observability::init_tracing;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // Load configuration - fail fast if invalid
    let config = BlogConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting blog service"
    );

    if config.jwt.uses_default_secret() {
        tracing::warn!("JWT_SECRET not set; using the development default");
    }

    let metrics = install_recorder()?;

    let pool = db::create_pool(&config.database)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;
    db::run_migrations(&pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
    let store = Arc::new(Database::new(pool));

    let storage = Arc::new(LocalStorage::new(&config.uploads.dir).await?);
    tracing::info!(dir = %config.uploads.dir, "Upload storage initialized");

    // SMTP wins when both channels are configured
    let delivery = match &config.smtp {
        Some(smtp) => {
            let email = EmailService::new(smtp)?;
            tracing::info!(host = %smtp.host, "Verification codes delivered by email");
            CodeDelivery::Email(Arc::new(email))
        }
        None => {
            tracing::warn!("SMTP not configured; verification codes are returned in responses");
            CodeDelivery::Echo
        }
    };

    let reap_every = Duration::from_secs(config.verification.reap_interval_seconds);
    let addr = config.common.bind_address();

    let state = AppState::new(config, store, delivery, storage, Some(metrics));
    let reaper = spawn_code_reaper(state.auth.clone(), reap_every);

    let service_span = tracing::info_span!(
        "service",
        service = %state.config.service_name,
        version = %state.config.service_version,
    );
    let app = build_router(state)?;

    let _guard = service_span.enter();
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    reaper.abort();
    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
