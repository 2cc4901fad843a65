//! Telegram notifier against a mocked Bot API.

use gatto::channels::{Notifier, TelegramNotifier};
use gatto::config::TelegramConfig;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer, max_message_chars: usize) -> TelegramConfig {
    TelegramConfig {
        bot_token: Some("123:abc".to_owned()),
        chat_id: Some(777),
        api_base_url: server.uri(),
        max_message_chars,
        ..Default::default()
    }
}

#[tokio::test]
async fn sends_to_authorized_chat() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/sendMessage"))
        .and(body_partial_json(json!({"chat_id": 777, "text": "hello"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = TelegramNotifier::new(&config(&server, 4096)).unwrap();
    assert!(notifier.is_configured());
    notifier.notify("hello").await;
}

#[tokio::test]
async fn long_text_is_sent_in_ordered_chunks() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/sendMessage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(3)
        .mount(&server)
        .await;

    let notifier = TelegramNotifier::new(&config(&server, 10)).unwrap();
    notifier.notify("first\nsecond\nthird").await;

    let texts: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| {
            let body: serde_json::Value = serde_json::from_slice(&r.body).unwrap();
            body["text"].as_str().unwrap().to_owned()
        })
        .collect();
    assert_eq!(texts, ["first", "second", "third"]);
}

#[tokio::test]
async fn delivery_failure_is_swallowed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/sendMessage"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = TelegramNotifier::new(&config(&server, 4096)).unwrap();
    notifier.notify("lost").await;
}

#[tokio::test]
async fn set_webhook_passes_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bot123:abc/setWebhook"))
        .and(query_param("url", "https://bot.example/webhook"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": true})))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = TelegramNotifier::new(&config(&server, 4096)).unwrap();
    let reply = notifier
        .set_webhook("https://bot.example/webhook")
        .await
        .unwrap();
    assert!(reply.contains("true"));
}

#[tokio::test]
async fn set_webhook_without_token_errors() {
    let notifier = TelegramNotifier::new(&TelegramConfig::default()).unwrap();
    assert!(notifier.set_webhook("https://bot.example").await.is_err());
}
