use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::common;

async fn send_and_recv_text(addr: std::net::SocketAddr, message: &str) -> Value {
    let (ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    let (mut write, mut read) = ws.split();
    write
        .send(Message::Text(json!({ "message": message }).to_string()))
        .await
        .unwrap();
    let msg = timeout(Duration::from_secs(5), read.next())
        .await
        .unwrap()
        .expect("one response")
        .expect("ws message");
    let text = msg.to_text().unwrap();
    eprintln!("[e2e] received: {}", text);
    serde_json::from_str(text).unwrap()
}

#[tokio::test]
async fn e2e_exec_control_message_runs_through_the_service() {
    common::load_dotenv();
    let (addr, server) = common::spawn_server_once().await;

    let request = charla::ExecRequest {
        language: "python".to_string(),
        code: "print(6 * 7)".to_string(),
    };
    let reply = send_and_recv_text(addr, &charla::encode_exec_message(&request)).await;
    // Simulated capability: a bare string, passed through by normalization.
    assert_eq!(reply["sender"], "ai");
    assert_eq!(reply["text"], charla::SIMULATED_EXEC_TEXT);

    let _ = timeout(Duration::from_secs(5), server).await;
}

#[tokio::test]
async fn e2e_unsupported_language_is_rejected() {
    common::load_dotenv();
    let (addr, server) = common::spawn_server_once().await;

    let request = charla::ExecRequest {
        language: "ruby".to_string(),
        code: "puts 42".to_string(),
    };
    let reply = send_and_recv_text(addr, &charla::encode_exec_message(&request)).await;
    assert_eq!(reply["text"], serve::UNSUPPORTED_LANGUAGE_TEXT);

    let _ = timeout(Duration::from_secs(5), server).await;
}
