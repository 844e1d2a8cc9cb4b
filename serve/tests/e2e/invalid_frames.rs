use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::time::Duration;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::common;

#[tokio::test]
async fn e2e_invalid_json_frame_gets_fixed_error_reply() {
    common::load_dotenv();
    let (addr, server) = common::spawn_server_once().await;

    let (ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    let (mut write, mut read) = ws.split();

    write
        .send(Message::Text("not valid json".to_string()))
        .await
        .unwrap();

    let msg = timeout(Duration::from_secs(5), read.next())
        .await
        .unwrap()
        .expect("one response")
        .expect("ws message");
    let text = msg.to_text().unwrap();
    eprintln!("[e2e] received: {}", text);

    // The connection stays open; the error comes back as a normal reply.
    let reply: Value = serde_json::from_str(text).unwrap();
    assert_eq!(reply["sender"], "ai");
    assert_eq!(reply["text"], serve::PROCESS_ERROR_TEXT);

    drop(write);
    drop(read);
    let _ = timeout(Duration::from_secs(5), server).await;
}
