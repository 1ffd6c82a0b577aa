//! WebSocket upgrade handler.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use bazaar_core::traits::identity::Identity;
use bazaar_realtime::connection::heartbeat::{HeartbeatConfig, run_heartbeat};

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameter for WebSocket authentication.
#[derive(Debug, serde::Deserialize)]
pub struct WsQuery {
    /// JWT access token.
    #[serde(default)]
    pub token: String,
}

/// GET /ws?token={jwt}: WebSocket upgrade
pub async fn ws_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
) -> Result<Response, ApiError> {
    // Authenticate before upgrade
    let identity = state.identity.resolve(&query.token).await?;
    let limit = transport_limit(state.realtime.settings().realtime.max_frame_bytes);

    Ok(ws
        .max_message_size(limit)
        .max_frame_size(limit)
        .on_upgrade(move |socket| handle_ws_connection(state, identity, socket)))
}

/// Socket-level message ceiling.
///
/// Frames between `max_frame_bytes` and this ceiling reach the dispatcher and
/// are answered with a `VALIDATION` error; anything larger closes the socket.
fn transport_limit(max_frame_bytes: usize) -> usize {
    max_frame_bytes.saturating_mul(4)
}

/// Serves an established WebSocket connection until either side closes it.
async fn handle_ws_connection(state: AppState, identity: Identity, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let dispatcher = state.realtime.dispatcher.clone();

    let (handle, mut outbound_rx) = dispatcher.on_connect(&identity).await;
    let conn_id = handle.id;

    info!(
        conn_id = %conn_id,
        user_id = %identity.user_id,
        "WebSocket connection established"
    );

    // Outbound frame forwarder
    let outbound_task = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    let heartbeat_task = tokio::spawn(run_heartbeat(
        handle.clone(),
        HeartbeatConfig::from(&state.realtime.settings().realtime),
    ));

    loop {
        tokio::select! {
            _ = handle.closed() => {
                debug!(conn_id = %conn_id, "Connection closed by server");
                break;
            }
            next = ws_rx.next() => match next {
                Some(Ok(Message::Text(text))) => {
                    dispatcher.handle_inbound(&handle, text.as_str()).await;
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                    break;
                }
            },
        }
    }

    heartbeat_task.abort();
    dispatcher.on_disconnect(&conn_id).await;
    outbound_task.abort();

    info!(
        conn_id = %conn_id,
        user_id = %identity.user_id,
        "WebSocket connection closed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_limit_leaves_room_for_validation_errors() {
        assert_eq!(transport_limit(64 * 1024), 256 * 1024);
        assert!(transport_limit(1) > 1);
        assert_eq!(transport_limit(usize::MAX), usize::MAX);
    }
}
