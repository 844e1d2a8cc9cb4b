//! Charla server (axum): WebSocket chat at `GET /ws`, request/response chat
//! at `POST /api/chat`, and the server-side code execution service.
//!
//! **Public API**: [`run_serve`], [`run_serve_on_listener`], [`AppState`].

mod app;
mod chat;
mod connection;
mod exec;
mod response;

pub use app::AppState;
pub use connection::{GENERATION_ERROR_TEXT, PROCESS_ERROR_TEXT};
pub use exec::{
    normalize_output, ExecutionService, EXECUTION_ERROR_TEXT, NO_OUTPUT_TEXT,
    UNSUPPORTED_LANGUAGE_TEXT,
};

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::info;

use app::router;

const DEFAULT_ADDR: &str = "127.0.0.1:3001";

/// Runs the server on an existing listener (tests bind to 127.0.0.1:0 and
/// pass it in). When `once` is true, serves until the first WebSocket
/// connection closes, then returns.
pub async fn run_serve_on_listener(
    listener: TcpListener,
    state: AppState,
    once: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = listener.local_addr()?;
    info!("listening on http://{} (ws at /ws)", addr);

    if once {
        info!("will exit after first connection is done (once mode, used by tests)");
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let app = router(state.with_shutdown(shutdown_tx));
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await?;
        info!("connection done, exiting (once mode)");
    } else {
        axum::serve(listener, router(state)).await?;
    }
    Ok(())
}

/// Runs the server with capabilities from the environment. Listens on `addr`
/// when given, else `PORT`, else 127.0.0.1:3001.
pub async fn run_serve(addr: Option<&str>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let from_port = std::env::var("PORT").ok().map(|p| format!("127.0.0.1:{p}"));
    let addr = addr
        .map(str::to_string)
        .or(from_port)
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());
    let listener = TcpListener::bind(&addr).await?;
    run_serve_on_listener(listener, AppState::from_env(), false).await
}
