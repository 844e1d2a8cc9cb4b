//! Transport abstraction unifying request/response and streaming chat.
//!
//! Both implementations present identical observable semantics: an ordered
//! message feed, a `connected` flag, and a `loading` flag that is set while a
//! reply is outstanding. Which one is live for a session is a configuration
//! concern decided once via [`TransportKind::select`].

mod api;
mod ws;

pub use api::ApiTransport;
pub use ws::{ConnectionState, WsConfig, WsTransport, RECONNECT_DELAY};

use async_trait::async_trait;

use crate::message::ChatMessage;

/// Capability contract shared by both transports.
///
/// `send_message` appends the user message and the pending placeholder
/// synchronously (before its first await) and is a silent no-op when the
/// text is empty after trimming, a placeholder is already outstanding, or
/// the transport is not usable. `clear_history` empties the log
/// unconditionally and never touches connection state.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_message(&self, text: &str);
    fn clear_history(&self);
    fn messages(&self) -> Vec<ChatMessage>;
    fn connected(&self) -> bool;
    fn loading(&self) -> bool;
}

/// Which transport implementation is live for the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportKind {
    Api,
    Ws,
}

impl TransportKind {
    /// Selection contract: explicit flag > environment value > default
    /// (`api`). Unknown values fall back to `api`.
    pub fn select(flag: Option<&str>, env: Option<&str>) -> Self {
        let chosen = flag.or(env).unwrap_or("api");
        if chosen.eq_ignore_ascii_case("ws") {
            TransportKind::Ws
        } else {
            TransportKind::Api
        }
    }
}
