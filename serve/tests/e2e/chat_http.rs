use serde_json::{json, Value};

use super::common;

#[tokio::test]
async fn e2e_http_chat_returns_simulated_reply() {
    common::load_dotenv();
    let (addr, server) = common::spawn_server_once().await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{addr}/api/chat"))
        .json(&json!({ "message": "Hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    eprintln!("[e2e] received: {}", body);
    assert_eq!(body["sender"], "ai");
    assert_eq!(body["text"], charla::simulated_reply("Hello"));

    server.abort();
}

#[tokio::test]
async fn e2e_api_transport_round_trip() {
    use charla::ChatTransport;

    common::load_dotenv();
    let (addr, server) = common::spawn_server_once().await;

    let transport = charla::ApiTransport::new(format!("http://{addr}/api/chat"));
    transport.send_message("Hello").await;

    let messages = transport.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].text, charla::simulated_reply("Hello"));
    assert!(transport.connected());
    assert!(!transport.loading());

    server.abort();
}

#[tokio::test]
async fn e2e_http_malformed_body_is_a_structured_400() {
    common::load_dotenv();
    let (addr, server) = common::spawn_server_once().await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{addr}/api/chat"))
        .header("content-type", "application/json")
        .body("not valid json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body.get("error").is_some());

    server.abort();
}

#[tokio::test]
async fn e2e_http_wrong_method_is_a_structured_405() {
    common::load_dotenv();
    let (addr, server) = common::spawn_server_once().await;

    let response = reqwest::get(format!("http://{addr}/api/chat")).await.unwrap();
    assert_eq!(response.status(), 405);
    let body: Value = response.json().await.unwrap();
    assert!(body.get("error").is_some());

    server.abort();
}
