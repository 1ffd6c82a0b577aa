//! Message handlers.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{ApiResponse, CountResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/messages/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    let count = state.messages.unread_count_for(auth.user_id).await?;
    Ok(Json(ApiResponse::ok(CountResponse { count })))
}
