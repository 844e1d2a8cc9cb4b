//! Chat message types, the inbound reply shape, and the fixed user-visible
//! strings shared by both transports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel text of the pending placeholder message (reply not yet arrived).
pub const PENDING_TEXT: &str = "...";

/// Fallback when a reply arrives without usable text.
pub const NO_RESPONSE_TEXT: &str = "No response received";

/// Shown when a request/response exchange fails (network error, bad status,
/// malformed body).
pub const EXCHANGE_ERROR_TEXT: &str = "Error: could not reach the server.";

/// Shown when an inbound streaming frame cannot be parsed.
pub const MALFORMED_REPLY_TEXT: &str = "Sorry, I encountered an error processing your message.";

/// Who produced a message. Serialized as `"user"` / `"ai"` on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "ai")]
    Agent,
}

/// One entry in the message log. Immutable once appended, except for the
/// pending placeholder which is replaced in place when its reply arrives.
#[derive(Clone, Debug, Serialize)]
pub struct ChatMessage {
    pub id: String,
    pub sender: Sender,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub(crate) fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sender,
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    /// True for the reserved pending placeholder (agent sender, sentinel text).
    pub fn is_pending(&self) -> bool {
        self.sender == Sender::Agent && self.text == PENDING_TEXT
    }
}

/// Inbound reply shape, both transports: `{"sender":"ai","text":...}`.
/// `message` is accepted as an alternative field name for the text.
#[derive(Debug, Deserialize)]
pub struct ChatReply {
    pub sender: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ChatReply {
    /// Reply text, with the fixed fallback when both fields are absent or empty.
    pub fn text_or_fallback(self) -> String {
        self.text
            .filter(|t| !t.is_empty())
            .or_else(|| self.message.filter(|t| !t.is_empty()))
            .unwrap_or_else(|| NO_RESPONSE_TEXT.to_string())
    }
}
