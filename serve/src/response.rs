//! Send a single `{"sender":"ai","text":...}` reply frame over the WebSocket.

use axum::extract::ws::{Message, WebSocket};
use serde::Serialize;

#[derive(Serialize)]
struct OutboundReply<'a> {
    sender: &'static str,
    text: &'a str,
}

pub(crate) async fn send_reply(socket: &mut WebSocket, text: &str) -> Result<(), axum::Error> {
    let reply = OutboundReply { sender: "ai", text };
    let json = serde_json::to_string(&reply)
        .unwrap_or_else(|_| r#"{"sender":"ai","text":"serialization error"}"#.to_string());
    socket.send(Message::Text(json)).await
}
