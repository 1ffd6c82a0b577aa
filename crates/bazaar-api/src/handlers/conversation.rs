//! Conversation handlers.

use axum::Json;
use axum::extract::{Path, Query, State};

use bazaar_core::types::id::ConversationId;
use bazaar_core::types::pagination::PageResponse;
use bazaar_entity::message::Message;

use crate::dto::request::CreateConversationRequest;
use crate::dto::response::{ApiResponse, ConversationResponse, MarkReadResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, PaginationParams};
use crate::state::AppState;

/// POST /api/conversations
pub async fn create_conversation(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateConversationRequest>,
) -> Result<Json<ApiResponse<ConversationResponse>>, ApiError> {
    let conversation = state
        .conversations
        .resolve_or_create(auth.user_id, req.other_user_id, req.product_id, req.order_id)
        .await?;
    Ok(Json(ApiResponse::ok(ConversationResponse::for_viewer(
        &conversation,
        auth.user_id,
    ))))
}

/// GET /api/conversations
pub async fn list_conversations(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<ConversationResponse>>>, ApiError> {
    let page = params.into_page_request(&state.chat);
    let conversations = state
        .conversations
        .list_for_user(auth.user_id, &page)
        .await?;
    let viewer = auth.user_id;
    Ok(Json(ApiResponse::ok(conversations.map(|c| {
        ConversationResponse::for_viewer(&c, viewer)
    }))))
}

/// DELETE /api/conversations/{id}
pub async fn deactivate_conversation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<ConversationId>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.conversations.deactivate(id, auth.user_id).await?;
    Ok(Json(ApiResponse::ok(())))
}

/// GET /api/conversations/{id}/messages
pub async fn list_messages(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<ConversationId>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<Message>>>, ApiError> {
    let page = params.into_page_request(&state.chat);
    let messages = state.messages.page(id, auth.user_id, &page).await?;
    Ok(Json(ApiResponse::ok(messages)))
}

/// POST /api/conversations/{id}/read
///
/// Same flow as the `chat_read` frame: receipts are pushed to the senders.
pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<ConversationId>,
) -> Result<Json<ApiResponse<MarkReadResponse>>, ApiError> {
    let receipts = state
        .realtime
        .dispatcher
        .mark_conversation_read(auth.user_id, id)
        .await?;
    Ok(Json(ApiResponse::ok(MarkReadResponse {
        conversation_id: id,
        message_ids: receipts.into_iter().map(|r| r.message_id).collect(),
    })))
}
