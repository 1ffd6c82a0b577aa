//! Presence handlers.

use axum::Json;
use axum::extract::State;

use bazaar_entity::presence::PresenceRecord;

use crate::dto::response::ApiResponse;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/presence/online
pub async fn online_users(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Json<ApiResponse<Vec<PresenceRecord>>> {
    let mut online = state.realtime.presence.all_online();
    online.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
    Json(ApiResponse::ok(online))
}
