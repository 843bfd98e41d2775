use session_auth::{
    build_router,
    config::{SessionConfig, StoreBackend},
    services::{
        metrics, InMemoryDirectory, JwtService, MemoryStore, RedisStore, SessionService, SessionStore,
    },
    AppState,
};
use service_core::error::AppError;
use service_core::observability::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = SessionConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );

    metrics::init_metrics();

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting session service"
    );

    let store: Arc<dyn SessionStore> = match config.store.backend {
        StoreBackend::Redis => {
            let redis = RedisStore::new(&config.store).await.map_err(AppError::InternalError)?;
            tracing::info!("Redis session store initialized");
            Arc::new(redis)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-process session store; sessions are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let directory = match &config.directory.seed_path {
        Some(path) => InMemoryDirectory::from_seed_file(path).map_err(AppError::ConfigError)?,
        None => {
            tracing::warn!("No directory seed configured; every login will be rejected");
            InMemoryDirectory::new()
        }
    };
    let directory = Arc::new(directory);

    let jwt = JwtService::new(&config.jwt);
    let sessions = SessionService::new(jwt, store.clone(), directory.clone());

    let state = AppState {
        config: config.clone(),
        sessions,
        store,
        credentials: directory.clone(),
        roles: directory,
    };
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));

    let service_span = tracing::info_span!(
        "service",
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
    );
    let _guard = service_span.enter();

    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    service_core::axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
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
