//! Request/response transport: one independent HTTP exchange per message.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::json;

use crate::error::TransportError;
use crate::message::{ChatMessage, ChatReply, EXCHANGE_ERROR_TEXT};
use crate::store::MessageLog;
use crate::transport::ChatTransport;

/// HTTP request/response transport. Each `send_message` issues one POST to
/// the chat endpoint and resolves the placeholder with the reply, the fixed
/// fallback (reply without text), or the fixed error string (failed
/// exchange). There is no persistent link to lose, so `connected` is always
/// true; concurrent sends are prevented by the one-pending-placeholder
/// invariant, not by queuing.
pub struct ApiTransport {
    url: String,
    client: reqwest::Client,
    log: Mutex<MessageLog>,
    loading: AtomicBool,
}

impl ApiTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
            log: Mutex::new(MessageLog::new()),
            loading: AtomicBool::new(false),
        }
    }

    fn log(&self) -> MutexGuard<'_, MessageLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn exchange(&self, text: &str) -> Result<String, TransportError> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "message": text }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(TransportError::Status(response.status().as_u16()));
        }
        let reply: ChatReply = response.json().await?;
        Ok(reply.text_or_fallback())
    }
}

#[async_trait]
impl ChatTransport for ApiTransport {
    async fn send_message(&self, text: &str) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        {
            let mut log = self.log();
            if log.has_pending() {
                return;
            }
            log.push_user(trimmed);
            log.push_pending();
        }
        self.loading.store(true, Ordering::SeqCst);

        let reply = match self.exchange(trimmed).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("chat exchange failed: {e}");
                EXCHANGE_ERROR_TEXT.to_string()
            }
        };
        self.log().resolve_pending(reply);
        self.loading.store(false, Ordering::SeqCst);
    }

    fn clear_history(&self) {
        self.log().clear();
    }

    fn messages(&self) -> Vec<ChatMessage> {
        self.log().snapshot()
    }

    fn connected(&self) -> bool {
        true
    }

    fn loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }
}
