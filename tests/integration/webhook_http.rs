//! Webhook and health routes over real HTTP.

use crate::helpers::{RecordingNotifier, gateway_at};
use gatto::channels::webhook::{HealthFacts, HealthReport, WEBHOOK_ACK, WebhookState, serve_on};
use gatto::jobs::{JobCatalog, JobSettings};
use gatto::queue::{JobReceiver, task_queue};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const CHAT: i64 = 99;

struct App {
    base: String,
    notifier: Arc<RecordingNotifier>,
    receiver: JobReceiver,
}

async fn start() -> App {
    let notifier = Arc::new(RecordingNotifier::default());
    let jobs = JobCatalog::new(
        Arc::new(gateway_at("http://127.0.0.1:9", 1, Duration::ZERO)),
        notifier.clone(),
        JobSettings::default(),
    );
    let (queue, receiver) = task_queue();
    let state = WebhookState::new(
        queue,
        jobs,
        notifier.clone(),
        Some(CHAT),
        HealthFacts {
            telegram_configured: false,
            gatto_token_present: true,
            task_timeout_sec: 60,
        },
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve_on(listener, state));
    App {
        base: format!("http://{addr}"),
        notifier,
        receiver,
    }
}

async fn post(app: &App, body: &str) -> (u16, String) {
    let response = reqwest::Client::new()
        .post(format!("{}/webhook", app.base))
        .header("content-type", "application/json")
        .body(body.to_owned())
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.text().await.unwrap())
}

#[tokio::test]
async fn authorized_command_is_queued_and_acknowledged() {
    let app = start().await;
    let update = json!({"update_id": 1, "message": {"chat": {"id": CHAT}, "text": "/boxes"}});
    let (status, body) = post(&app, &update.to_string()).await;

    assert_eq!(status, 200);
    assert_eq!(body, WEBHOOK_ACK);
    assert_eq!(app.receiver.len(), 1);
    assert_eq!(app.notifier.messages().len(), 1);
}

#[tokio::test]
async fn foreign_chat_gets_same_reply_and_nothing_queued() {
    let app = start().await;
    let update = json!({"message": {"chat": {"id": 1}, "text": "/essence"}});
    let (status, body) = post(&app, &update.to_string()).await;

    assert_eq!(status, 200);
    assert_eq!(body, WEBHOOK_ACK);
    assert!(app.receiver.is_empty());
    assert!(app.notifier.messages().is_empty());
}

#[tokio::test]
async fn junk_bodies_are_accepted_and_ignored() {
    let app = start().await;
    for body in ["", "not json", r#"{"callback_query":{}}"#, r#"{"message":{"text":"/feed"}}"#] {
        let (status, reply) = post(&app, body).await;
        assert_eq!(status, 200);
        assert_eq!(reply, WEBHOOK_ACK);
    }
    assert!(app.receiver.is_empty());
}

#[tokio::test]
async fn health_reports_queue_and_flags() {
    let app = start().await;
    let update = json!({"message": {"chat": {"id": CHAT}, "text": "/feed"}});
    post(&app, &update.to_string()).await;
    post(&app, &update.to_string()).await;

    let report: HealthReport = reqwest::get(format!("{}/health", app.base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(report.ok);
    assert_eq!(report.queue_size, 2);
    assert!(!report.telegram_configured);
    assert!(report.gatto_token_present);
    assert_eq!(report.task_timeout_sec, 60);
}
