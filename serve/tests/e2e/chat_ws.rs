use charla::ChatTransport;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::common;

#[tokio::test]
async fn e2e_ws_chat_round_trip_uses_simulated_reply() {
    common::load_dotenv();
    let (addr, server) = common::spawn_server_once().await;

    let (ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    let (mut write, mut read) = ws.split();
    write
        .send(Message::Text(json!({ "message": "Hello" }).to_string()))
        .await
        .unwrap();

    let msg = timeout(Duration::from_secs(5), read.next())
        .await
        .unwrap()
        .expect("one response")
        .expect("ws message");
    let text = msg.to_text().unwrap();
    eprintln!("[e2e] received: {}", text);

    let reply: Value = serde_json::from_str(text).unwrap();
    assert_eq!(reply["sender"], "ai");
    assert_eq!(reply["text"], charla::simulated_reply("Hello"));

    drop(write);
    drop(read);
    let _ = timeout(Duration::from_secs(5), server).await;
}

#[tokio::test]
async fn e2e_ws_transport_resolves_placeholder_with_simulated_reply() {
    common::load_dotenv();
    let (addr, server) = common::spawn_server_once().await;

    let transport = charla::WsTransport::connect(format!("ws://{addr}/ws"));
    wait_until(|| transport.connected()).await;

    transport.send_message("Hello").await;
    wait_until(|| !transport.loading()).await;

    let messages = transport.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].text, charla::simulated_reply("Hello"));

    transport.shutdown().await;
    let _ = timeout(Duration::from_secs(5), server).await;
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
