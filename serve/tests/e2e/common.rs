//! Shared helpers for e2e tests. Received payloads are logged with
//! `[e2e] received: ...`; run with `--nocapture` to see them.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Loads .env from the current directory (or project root when run via
/// `cargo test`) so local overrides are visible to the tests.
pub fn load_dotenv() {
    let _ = dotenv::dotenv();
}

/// Binds port 0 and spawns the server in once mode with the deterministic
/// simulated capabilities (no credentials needed). Returns the address and
/// the server handle.
pub async fn spawn_server_once() -> (
    SocketAddr,
    tokio::task::JoinHandle<Result<(), Box<dyn std::error::Error + Send + Sync>>>,
) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = serve::AppState::new(
        Arc::new(charla::SimulatedGeneration),
        Arc::new(charla::SimulatedCodeExecution),
    );
    let handle = tokio::spawn(serve::run_serve_on_listener(listener, state, true));
    (addr, handle)
}
