//! WebSocket upgrade handler and per-connection event loop.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use gamerhub_common::id::{prefix, prefixed_ulid};
use gamerhub_common::wire::ClientEvent;

use crate::AppState;

use super::fanout::BroadcastPayload;
use super::handler;

pub fn router() -> Router<AppState> {
    Router::new().route("/gateway", get(ws_upgrade))
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: AppState) {
    let connection_id = prefixed_ulid(prefix::CONNECTION);
    state.registry.register(&connection_id);

    tracing::info!(%connection_id, "gateway connection established");

    let (ws_tx, ws_rx) = socket.split();
    let broadcast_rx = state.broadcast.subscribe();
    run_connection(&state, &connection_id, ws_tx, ws_rx, broadcast_rx).await;

    // Subscriptions are ephemeral: they die with the connection. The client
    // re-arms them by replaying sync-my-communities after reconnecting.
    state.registry.unregister(&connection_id);

    tracing::info!(%connection_id, "gateway connection closed");
}

/// Main connection loop: dispatch client events, forward subscribed
/// broadcasts.
async fn run_connection(
    state: &AppState,
    connection_id: &str,
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut ws_rx: SplitStream<WebSocket>,
    mut broadcast_rx: broadcast::Receiver<Arc<BroadcastPayload>>,
) {
    loop {
        tokio::select! {
            // Client sends us a frame.
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientEvent>(&text) {
                            Ok(event) => handler::handle_event(state, connection_id, event),
                            Err(e) => {
                                // Malformed frames are dropped, never fatal.
                                tracing::debug!(%connection_id, error = %e, "ignoring malformed client frame");
                            }
                        }
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(?e, %connection_id, "ws read error");
                        break;
                    }
                    _ => continue,
                }
            }

            // Event from the fan-out hub.
            result = broadcast_rx.recv() => {
                match result {
                    Ok(payload) => {
                        // Deliver iff this connection holds a live
                        // subscription to the payload's community.
                        if !state.registry.is_subscribed(connection_id, &payload.community) {
                            continue;
                        }

                        let json = serde_json::to_string(&payload.event).unwrap();
                        if ws_tx.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(
                            %connection_id,
                            skipped = n,
                            "gateway connection lagged behind fan-out"
                        );
                        // Keep going; the missed events are dropped.
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        }
    }
}
