//! Axum app: shared state, router, and the WebSocket upgrade handler.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::Response,
    routing::{get, post},
    Router,
};
use charla::{CodeExecution, Generation};
use tokio::sync::oneshot;

use crate::chat::{chat_handler, method_not_allowed};
use crate::connection::handle_socket;
use crate::exec::ExecutionService;

/// Shared state for both endpoints.
///
/// Injected into the router and cloned per connection/request so handlers
/// reach the capabilities without passing them through every layer.
#[derive(Clone)]
pub struct AppState {
    /// When set, the first WebSocket connection to close sends on this to
    /// signal server exit (once mode).
    pub(crate) shutdown_tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
    pub(crate) generation: Arc<dyn Generation>,
    pub(crate) execution: ExecutionService,
}

impl AppState {
    pub fn new(generation: Arc<dyn Generation>, execution: Arc<dyn CodeExecution>) -> Self {
        Self {
            shutdown_tx: Arc::new(Mutex::new(None)),
            generation,
            execution: ExecutionService::new(execution),
        }
    }

    /// Capabilities from the environment: Gemini when `GEMINI_API_KEY` is
    /// set, deterministic simulated implementations otherwise.
    pub fn from_env() -> Self {
        Self::new(
            charla::generation_from_env(),
            charla::code_execution_from_env(),
        )
    }

    pub(crate) fn with_shutdown(mut self, tx: oneshot::Sender<()>) -> Self {
        self.shutdown_tx = Arc::new(Mutex::new(Some(tx)));
        self
    }
}

/// Router: `GET /ws` upgrades to WebSocket; `POST /api/chat` is the
/// request/response endpoint (other methods get a structured 405).
pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/api/chat", post(chat_handler).fallback(method_not_allowed))
        .with_state(state)
}

/// Handles `GET /ws`: upgrades and delegates to [`handle_socket`].
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let shutdown_tx = state.shutdown_tx.lock().ok().and_then(|mut guard| guard.take());
    ws.on_upgrade(move |socket| handle_socket(socket, state, shutdown_tx))
}
