//! WebSocket upgrade handler for the client-facing relay endpoint.
//!
//! `GET /ws` upgrades the connection to a text WebSocket carrying the
//! prediction protocol:
//!
//! | Direction | Content |
//! |---|---|
//! | Client → Server | `{"data":{"prompt":..,"token":..,"api_key_auth":..,..}}` |
//! | Server → Client | `{"statusCode":int,"body":string}` on rejection |
//! | Server → Client | `{"token":string}` per relayed token, ending with `END_OF_RESPONSE` |
//!
//! ## Lifecycle
//!
//! 1. Client opens `ws://…/ws`; the handler registers a session id.
//! 2. Spawns two tasks around a per-connection frame channel:
//!    * **Ingest** — each inbound text frame is one request, handed to the
//!      dispatcher. The relay work itself runs on the dispatcher's own
//!      spawned task, so ingest stays responsive mid-stream.
//!    * **Egress** — drains the frame channel, serializes each frame and
//!      writes it to the socket. Sole writer for the connection.
//! 3. `tokio::select!` waits for either task to finish (graceful close or
//!    network drop), then aborts the other.
//! 4. Unregisters the session so in-flight relay tasks stop writing.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tracing::{info, warn};

use augur_core::ports::FrameSink;

use crate::sink::ChannelFrameSink;
use crate::state::AppState;

/// `GET /ws` — WebSocket upgrade endpoint for the prediction relay.
pub async fn relay_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_relay_ws(socket, state))
}

async fn handle_relay_ws(socket: WebSocket, state: AppState) {
    let session = state.registry.register();
    info!(session = %session, "client connected");

    // Split the socket so ingest and egress can run concurrently.
    let (ws_sender, ws_receiver) = socket.split();
    let (sink, frame_rx) = ChannelFrameSink::channel();
    let sink: Arc<dyn FrameSink> = Arc::new(sink);

    // ── Egress: frame channel → serialized text frames ───────────────────

    let mut egress = tokio::spawn(async move {
        let mut ws_sender = ws_sender;
        let mut frame_rx = frame_rx;

        while let Some(frame) = frame_rx.recv().await {
            let text = match serde_json::to_string(&frame) {
                Ok(text) => text,
                Err(err) => {
                    warn!(%err, "failed to serialize outbound frame, skipping");
                    continue;
                }
            };
            if ws_sender.send(Message::Text(text)).await.is_err() {
                // Client disconnected — exit silently.
                break;
            }
        }
    });

    // ── Ingest: client text frames → dispatcher ──────────────────────────

    let mut ingest = tokio::spawn({
        let state = Arc::clone(&state);
        async move {
            let mut ws_receiver = ws_receiver;

            while let Some(msg_result) = ws_receiver.next().await {
                match msg_result {
                    Ok(Message::Text(text)) => {
                        state
                            .dispatcher
                            .dispatch(session, &text, Arc::clone(&sink))
                            .await;
                    }
                    // Graceful close or protocol error — stop the loop.
                    Ok(Message::Close(_)) | Err(_) => break,
                    // Ping/pong and binary frames are not part of the
                    // protocol; ignore them.
                    Ok(_) => {}
                }
            }
        }
    });

    // Wait for whichever task finishes first, then abort the other.
    // This covers both graceful WS close and abrupt network drops.
    tokio::select! {
        _ = &mut ingest => { egress.abort(); }
        _ = &mut egress => { ingest.abort(); }
    }

    // Always unregister — relay tasks still in flight observe the dead
    // session on their next liveness check and stop.
    state.registry.unregister(session);
    info!(session = %session, "client disconnected");
}
