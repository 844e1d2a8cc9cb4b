//! Streaming transport: one persistent WebSocket connection with automatic
//! reconnect.
//!
//! A background task owns the socket for the whole session. It walks the
//! `Disconnected -> Connecting -> Connected` state machine: every socket
//! close or error drops back to `Disconnected` and schedules a reconnect
//! after a flat delay, indefinitely, until the transport is torn down. The
//! shutdown signal is checked before every reconnect attempt, during the
//! retry sleep, and inside the socket loop, so no connect can be scheduled
//! after teardown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::message::{ChatMessage, ChatReply, MALFORMED_REPLY_TEXT};
use crate::store::MessageLog;
use crate::transport::ChatTransport;

/// Delay between reconnect attempts (flat, not exponential).
pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Outbound frames queued between `send_message` and the connection task.
const OUTBOUND_QUEUE_CAPACITY: usize = 16;

/// Connection lifecycle of the streaming transport. Owned by the connection
/// task; readers only observe it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Tuning knobs for [`WsTransport`]. [`Default`] matches production behavior;
/// tests shorten the reconnect delay.
#[derive(Clone, Debug)]
pub struct WsConfig {
    pub reconnect_delay: Duration,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: RECONNECT_DELAY,
        }
    }
}

struct WsShared {
    log: Mutex<MessageLog>,
    loading: AtomicBool,
    state: Mutex<ConnectionState>,
}

impl WsShared {
    fn new() -> Self {
        Self {
            log: Mutex::new(MessageLog::new()),
            loading: AtomicBool::new(false),
            state: Mutex::new(ConnectionState::Disconnected),
        }
    }

    fn log(&self) -> MutexGuard<'_, MessageLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

/// Streaming transport over a persistent WebSocket.
pub struct WsTransport {
    shared: Arc<WsShared>,
    outbound: mpsc::Sender<String>,
    shutdown: watch::Sender<bool>,
    task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl WsTransport {
    /// Connects to `url` with the default reconnect delay. Must be called
    /// from within a tokio runtime; the connection task starts immediately.
    pub fn connect(url: impl Into<String>) -> Self {
        Self::connect_with(url, WsConfig::default())
    }

    pub fn connect_with(url: impl Into<String>, config: WsConfig) -> Self {
        let url = url.into();
        let shared = Arc::new(WsShared::new());
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(connection_task(
            url,
            Arc::clone(&shared),
            outbound_rx,
            shutdown_rx,
            config,
        ));
        Self {
            shared,
            outbound: outbound_tx,
            shutdown: shutdown_tx,
            task: Mutex::new(Some(task)),
        }
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Tears the transport down: the active socket (if any) is closed and no
    /// further reconnect attempt is scheduled once this returns.
    pub async fn shutdown(&self) {
        let _ = self.shutdown.send(true);
        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

#[async_trait]
impl ChatTransport for WsTransport {
    async fn send_message(&self, text: &str) {
        let trimmed = text.trim();
        if trimmed.is_empty() || self.shared.state() != ConnectionState::Connected {
            return;
        }
        {
            let mut log = self.shared.log();
            if log.has_pending() {
                return;
            }
            log.push_user(trimmed);
            log.push_pending();
        }
        self.shared.loading.store(true, Ordering::SeqCst);

        let frame = json!({ "message": trimmed }).to_string();
        if self.outbound.send(frame).await.is_err() {
            // Connection task is gone (teardown); the placeholder stays until
            // clear_history, same as a reply lost to a disconnect.
            tracing::warn!("send after teardown dropped");
        }
    }

    fn clear_history(&self) {
        self.shared.log().clear();
    }

    fn messages(&self) -> Vec<ChatMessage> {
        self.shared.log().snapshot()
    }

    fn connected(&self) -> bool {
        self.shared.state() == ConnectionState::Connected
    }

    fn loading(&self) -> bool {
        self.shared.loading.load(Ordering::SeqCst)
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection loop: connect, drive the socket until it drops, then retry
/// after the flat delay. Exits only on the shutdown signal.
async fn connection_task(
    url: String,
    shared: Arc<WsShared>,
    mut outbound: mpsc::Receiver<String>,
    mut shutdown: watch::Receiver<bool>,
    config: WsConfig,
) {
    loop {
        if *shutdown.borrow() {
            break;
        }
        shared.set_state(ConnectionState::Connecting);
        tracing::debug!("connecting to {url}");
        let connected = tokio::select! {
            _ = shutdown.changed() => break,
            result = connect_async(&url) => result,
        };
        match connected {
            Ok((socket, _)) => {
                tracing::info!("connected to {url}");
                shared.set_state(ConnectionState::Connected);
                drive_socket(socket, &shared, &mut outbound, &mut shutdown).await;
                tracing::info!("disconnected from {url}");
            }
            Err(e) => tracing::warn!("connect to {url} failed: {e}"),
        }
        shared.set_state(ConnectionState::Disconnected);
        shared.loading.store(false, Ordering::SeqCst);

        if *shutdown.borrow() {
            break;
        }
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tokio::time::sleep(config.reconnect_delay) => {}
        }
    }
    shared.set_state(ConnectionState::Disconnected);
}

/// Runs one established connection until the socket closes, a send/receive
/// error occurs, or shutdown is signaled.
async fn drive_socket(
    socket: WsStream,
    shared: &WsShared,
    outbound: &mut mpsc::Receiver<String>,
    shutdown: &mut watch::Receiver<bool>,
) {
    let (mut write, mut read) = socket.split();
    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                let _ = write.close().await;
                return;
            }
            frame = outbound.recv() => {
                let Some(frame) = frame else {
                    // Transport handle dropped; treat as teardown.
                    let _ = write.close().await;
                    return;
                };
                if let Err(e) = write.send(Message::Text(frame)).await {
                    tracing::warn!("websocket send failed: {e}");
                    return;
                }
            }
            inbound = read.next() => {
                match inbound {
                    Some(Ok(msg)) if msg.is_text() => {
                        handle_frame(shared, msg.to_text().unwrap_or(""));
                    }
                    Some(Ok(msg)) if msg.is_close() => return,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!("websocket read failed: {e}");
                        return;
                    }
                    None => return,
                }
            }
        }
    }
}

/// Applies one inbound text frame to the log. Agent replies resolve the
/// first pending placeholder; frames from other senders are ignored; a frame
/// that does not parse becomes an agent message with the fixed error string
/// and does not change connection state.
fn handle_frame(shared: &WsShared, text: &str) {
    match serde_json::from_str::<ChatReply>(text) {
        Ok(reply) if reply.sender == "ai" => {
            shared.log().resolve_pending(reply.text_or_fallback());
            shared.loading.store(false, Ordering::SeqCst);
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!("malformed inbound frame: {e}");
            shared.log().resolve_pending(MALFORMED_REPLY_TEXT);
            shared.loading.store(false, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Sender, NO_RESPONSE_TEXT};
    use serde_json::Value;
    use std::sync::atomic::AtomicUsize;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    fn test_config() -> WsConfig {
        WsConfig {
            reconnect_delay: Duration::from_millis(50),
        }
    }

    #[tokio::test]
    async fn send_appends_user_and_placeholder_and_reply_resolves_it() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            let msg = ws.next().await.unwrap().unwrap();
            let frame: Value = serde_json::from_str(msg.to_text().unwrap()).unwrap();
            assert_eq!(frame["message"], "hello");
            ws.send(Message::Text(
                json!({ "sender": "ai", "text": "hi there" }).to_string(),
            ))
            .await
            .unwrap();
            // Keep the connection open until the client goes away.
            let _ = ws.next().await;
        });

        let transport = WsTransport::connect_with(format!("ws://{addr}"), test_config());
        wait_until(|| transport.connected()).await;

        transport.send_message("  hello  ").await;
        let messages = transport.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[0].text, "hello");
        assert!(messages[1].is_pending());
        assert!(transport.loading());

        wait_until(|| !transport.loading()).await;
        let messages = transport.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].text, "hi there");
        transport.shutdown().await;
    }

    #[tokio::test]
    async fn rapid_second_send_is_dropped() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            // Read but never reply; hold the connection open.
            while ws.next().await.is_some() {}
        });

        let transport = WsTransport::connect_with(format!("ws://{addr}"), test_config());
        wait_until(|| transport.connected()).await;

        transport.send_message("a").await;
        transport.send_message("b").await;

        let messages = transport.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "a");
        assert!(messages[1].is_pending());
        transport.shutdown().await;
    }

    #[tokio::test]
    async fn send_while_disconnected_is_a_noop() {
        // Nothing listens on this port.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = WsTransport::connect_with(format!("ws://{addr}"), test_config());
        transport.send_message("hello").await;
        assert!(transport.messages().is_empty());
        assert!(!transport.connected());
        transport.shutdown().await;
    }

    #[tokio::test]
    async fn reply_without_text_resolves_to_fallback() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            let _ = ws.next().await;
            ws.send(Message::Text(json!({ "sender": "ai" }).to_string()))
                .await
                .unwrap();
            let _ = ws.next().await;
        });

        let transport = WsTransport::connect_with(format!("ws://{addr}"), test_config());
        wait_until(|| transport.connected()).await;
        transport.send_message("hello").await;
        wait_until(|| !transport.loading()).await;
        assert_eq!(transport.messages()[1].text, NO_RESPONSE_TEXT);
        transport.shutdown().await;
    }

    #[tokio::test]
    async fn malformed_frame_becomes_fixed_error_message() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            let _ = ws.next().await;
            ws.send(Message::Text("not valid json".to_string()))
                .await
                .unwrap();
            let _ = ws.next().await;
        });

        let transport = WsTransport::connect_with(format!("ws://{addr}"), test_config());
        wait_until(|| transport.connected()).await;
        transport.send_message("hello").await;
        wait_until(|| !transport.loading()).await;
        assert_eq!(transport.messages()[1].text, MALFORMED_REPLY_TEXT);
        // Connection state is unchanged by a malformed frame.
        assert!(transport.connected());
        transport.shutdown().await;
    }

    #[tokio::test]
    async fn close_disconnects_clears_loading_and_reconnects_after_delay() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&accepted);
        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                let mut ws = accept_async(stream).await.unwrap();
                if n == 1 {
                    // Close the first connection without replying.
                    let _ = ws.next().await;
                    let _ = ws.close(None).await;
                } else {
                    while ws.next().await.is_some() {}
                }
            }
        });

        let transport = WsTransport::connect_with(format!("ws://{addr}"), test_config());
        wait_until(|| transport.connected()).await;
        transport.send_message("hello").await;
        assert!(transport.loading());

        // Server closes: connected drops, loading clears, placeholder stays.
        wait_until(|| !transport.connected()).await;
        assert!(!transport.loading());
        assert!(transport.messages()[1].is_pending());

        // A new connect attempt is observed after the flat delay.
        wait_until(|| accepted.load(Ordering::SeqCst) >= 2).await;
        wait_until(|| transport.connected()).await;
        transport.shutdown().await;
    }

    #[tokio::test]
    async fn no_connect_attempts_after_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&accepted);
        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                counter.fetch_add(1, Ordering::SeqCst);
                // Close immediately so the client keeps rescheduling.
                let mut ws = accept_async(stream).await.unwrap();
                let _ = ws.close(None).await;
            }
        });

        let transport = WsTransport::connect_with(format!("ws://{addr}"), test_config());
        wait_until(|| accepted.load(Ordering::SeqCst) >= 1).await;

        transport.shutdown().await;
        let before = accepted.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(accepted.load(Ordering::SeqCst), before);
        assert!(!transport.connected());
    }

    #[tokio::test]
    async fn clear_history_does_not_alter_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            while ws.next().await.is_some() {}
        });

        let transport = WsTransport::connect_with(format!("ws://{addr}"), test_config());
        wait_until(|| transport.connected()).await;
        transport.send_message("hello").await;
        transport.clear_history();
        assert!(transport.messages().is_empty());
        assert!(transport.connected());
        transport.shutdown().await;
    }
}
