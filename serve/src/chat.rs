//! HTTP request/response endpoint: `POST /api/chat`.

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::connection::GENERATION_ERROR_TEXT;

/// User text beyond this length is truncated before reaching the capability.
const MAX_MESSAGE_LEN: usize = 4000;

/// One exchange: body `{"message": string}`, reply `{"sender":"ai","text"}`.
/// A body that is not JSON or lacks `message` gets a structured 400.
pub(crate) async fn chat_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let message = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string));
    let Some(message) = message else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid request body" })),
        );
    };
    let message = truncate(&message, MAX_MESSAGE_LEN);

    let text = if let Some(request) = charla::decode_exec_message(message) {
        state.execution.run(&request).await
    } else {
        match state.generation.complete(message).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("generation failed: {}", e);
                GENERATION_ERROR_TEXT.to_string()
            }
        }
    };
    (StatusCode::OK, Json(json!({ "sender": "ai", "text": text })))
}

/// Structured 405 for non-POST methods on the chat route.
pub(crate) async fn method_not_allowed() -> (StatusCode, Json<Value>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "method not allowed" })),
    )
}

/// At most `max` chars, cut on a char boundary.
fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
