//! Code execution bridge.
//!
//! A code fragment from a reply is dispatched by its language tag:
//! JavaScript runs locally in the sandboxed [`JsWorker`]; anything else is
//! serialized into a `::EXEC_CODE::` control message and sent through the
//! active transport's normal `send_message` path, so remote executions share
//! the single in-flight slot with ordinary chat messages.

mod worker;

pub use worker::JsWorker;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::transport::ChatTransport;

/// Literal prefix marking an execution control message on the wire.
pub const EXEC_PREFIX: &str = "::EXEC_CODE::";

/// A code fragment with its language tag. Ephemeral; only the encoded
/// control message ever travels, and nothing is persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecRequest {
    pub language: String,
    pub code: String,
}

/// One output event from a local execution, in arrival order. The stream is
/// always terminated by [`ExecEvent::Done`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ExecEvent {
    Log(String),
    Result(String),
    Error(String),
    Done,
}

/// Encodes an execution request into the wire control message.
pub fn encode_exec_message(request: &ExecRequest) -> String {
    // Two plain string fields; serialization cannot fail.
    format!(
        "{}{}",
        EXEC_PREFIX,
        serde_json::to_string(request).unwrap_or_default()
    )
}

/// Decodes a control message; `None` when the prefix or payload do not match.
pub fn decode_exec_message(text: &str) -> Option<ExecRequest> {
    let payload = text.strip_prefix(EXEC_PREFIX)?;
    serde_json::from_str(payload).ok()
}

/// True when the fragment can run in the local worker.
pub fn is_local_language(language: &str) -> bool {
    matches!(
        language.to_ascii_lowercase().as_str(),
        "javascript" | "js"
    )
}

/// Where a fragment was dispatched.
pub enum ExecDispatch {
    /// Running in the local worker; consume events until [`ExecEvent::Done`].
    Local(JsWorker),
    /// Sent to the server; the result arrives as a regular agent message.
    Remote,
}

/// Client-side execution bridge bound to the session's active transport.
pub struct ExecBridge {
    transport: Arc<dyn ChatTransport>,
}

impl ExecBridge {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self { transport }
    }

    /// Dispatches a fragment by language tag.
    pub async fn run(&self, request: ExecRequest) -> ExecDispatch {
        if is_local_language(&request.language) {
            ExecDispatch::Local(JsWorker::spawn(request.code))
        } else {
            self.transport
                .send_message(&encode_exec_message(&request))
                .await;
            ExecDispatch::Remote
        }
    }
}
