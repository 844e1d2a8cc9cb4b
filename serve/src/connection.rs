//! WebSocket connection lifecycle: recv loop and chat/exec dispatch.

use axum::extract::ws::{Message, WebSocket};
use serde::Deserialize;
use tokio::sync::oneshot;

use crate::app::AppState;
use crate::response::send_reply;

/// Fixed reply when an inbound frame cannot be parsed.
pub const PROCESS_ERROR_TEXT: &str = "Error: could not process your message.";

/// Fixed reply when the generation capability fails.
pub const GENERATION_ERROR_TEXT: &str = "Error: could not reach the model.";

/// Inbound chat frame: `{"message": string}`.
#[derive(Debug, Deserialize)]
struct InboundChat {
    message: String,
}

pub(crate) async fn handle_socket(
    mut socket: WebSocket,
    state: AppState,
    shutdown_tx: Option<oneshot::Sender<()>>,
) {
    tracing::info!("client connected");
    while let Some(received) = socket.recv().await {
        let msg = match received {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("read error (client closed?): {}", e);
                break;
            }
        };
        let text = match &msg {
            Message::Text(t) => t.clone(),
            Message::Binary(b) => String::from_utf8_lossy(b).into_owned(),
            _ => continue,
        };

        let reply = reply_for(&state, &text).await;
        if let Err(e) = send_reply(&mut socket, &reply).await {
            tracing::warn!("send failed: {}", e);
            break;
        }
    }
    tracing::info!("client disconnected");
    if let Some(tx) = shutdown_tx {
        let _ = tx.send(());
    }
}

/// Produces the reply text for one inbound frame: execution control messages
/// go to the execution service, everything else to the generation capability.
/// A frame that does not parse yields the fixed error reply; nothing is ever
/// propagated as a fault.
async fn reply_for(state: &AppState, text: &str) -> String {
    let inbound: InboundChat = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!("malformed frame: {}", e);
            return PROCESS_ERROR_TEXT.to_string();
        }
    };
    tracing::info!("message received ({} chars)", inbound.message.len());

    if let Some(request) = charla::decode_exec_message(&inbound.message) {
        return state.execution.run(&request).await;
    }
    match state.generation.complete(&inbound.message).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!("generation failed: {}", e);
            GENERATION_ERROR_TEXT.to_string()
        }
    }
}
