//! Library side of the charla CLI: transport wiring, code block extraction,
//! and the interactive REPL.

pub mod code_blocks;
pub mod repl;

use std::sync::Arc;

use charla::{ApiTransport, ChatTransport, TransportKind, WsTransport};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:3001/api/chat";
pub const DEFAULT_WS_URL: &str = "ws://127.0.0.1:3001/ws";

/// Builds the active transport for the session.
///
/// Selection: `--transport` flag > `CHARLA_TRANSPORT` env > default (`api`).
pub fn build_transport(flag: Option<&str>, api_url: &str, ws_url: &str) -> Arc<dyn ChatTransport> {
    let env = std::env::var("CHARLA_TRANSPORT").ok();
    let kind = TransportKind::select(flag, env.as_deref());
    tracing::info!("using {:?} transport", kind);
    match kind {
        TransportKind::Ws => Arc::new(WsTransport::connect(ws_url)),
        TransportKind::Api => Arc::new(ApiTransport::new(api_url)),
    }
}
