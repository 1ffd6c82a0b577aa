//! Health check handlers.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{ApiResponse, DetailedHealthResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    }))
}

/// GET /api/health/detailed
pub async fn health_detailed(
    State(state): State<AppState>,
) -> Json<ApiResponse<DetailedHealthResponse>> {
    let database = match &state.database {
        None => "memory",
        Some(db) => match db.health_check().await {
            Ok(true) => "connected",
            _ => "unreachable",
        },
    };
    let status = if database == "unreachable" {
        "degraded"
    } else {
        "ok"
    };

    let engine = &state.realtime;
    Json(ApiResponse::ok(DetailedHealthResponse {
        status: status.to_string(),
        database: database.to_string(),
        ws_connections: engine.connections.connection_count(),
        connected_users: engine.connections.user_count(),
        online_users: engine.presence.online_count(),
        metrics: engine.metrics.snapshot(),
    }))
}
