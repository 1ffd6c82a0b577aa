//! Application builder: wires router, middleware, and state into an Axum app.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::middleware as axum_middleware;
use tower_http::trace::TraceLayer;

use bazaar_core::config::{AppConfig, CorsConfig};
use bazaar_core::error::AppError;
use bazaar_database::DatabasePool;
use bazaar_database::migration::run_migrations;
use bazaar_realtime::server::EngineSettings;

use crate::auth::JwtIdentityResolver;
use crate::middleware::cors::build_cors_layer;
use crate::middleware::logging::request_logging;
use crate::router::build_router;
use crate::state::{AppState, StorageBackend};

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState, cors_config: &CorsConfig) -> Router {
    build_router(state)
        .layer(axum_middleware::from_fn(request_logging))
        .layer(build_cors_layer(cors_config))
        .layer(TraceLayer::new_for_http())
}

/// Runs the Bazaar server until a shutdown signal arrives.
pub async fn run_server(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Bazaar Messenger server...");

    // ── Step 1: Storage backend ──────────────────────────────────
    let (backend, database) = if config.database.is_memory() {
        tracing::warn!("Using in-memory storage; data will not survive a restart");
        (StorageBackend::memory(), None)
    } else {
        tracing::info!("Connecting to database...");
        let db = DatabasePool::connect(&config.database).await?;
        if config.database.run_migrations {
            tracing::info!("Running database migrations...");
            run_migrations(db.pool()).await?;
        }
        (StorageBackend::postgres(&db), Some(db))
    };

    // ── Step 2: Services and realtime engine ─────────────────────
    let settings = EngineSettings {
        realtime: config.realtime.clone(),
        presence: config.presence.clone(),
        notifications: config.notifications.clone(),
    };
    let state = AppState::new(
        backend,
        Arc::new(JwtIdentityResolver::new(&config.auth)),
        config.chat.clone(),
        settings,
        database.clone(),
    );
    let sweep_task = state.realtime.start();

    // ── Step 3: HTTP server ──────────────────────────────────────
    let app = build_app(state.clone(), &config.server.cors);
    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!(address = %addr, "Bazaar Messenger listening");

    let realtime = state.realtime.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // Open sockets would otherwise hold the graceful shutdown forever.
            realtime.shutdown();
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Step 4: Drain ────────────────────────────────────────────
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    if tokio::time::timeout(grace, sweep_task).await.is_err() {
        tracing::warn!("Background tasks did not stop within the grace period");
    }
    if let Some(db) = database {
        db.close().await;
    }

    tracing::info!("Bazaar Messenger stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
