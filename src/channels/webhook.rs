//! HTTP surface: Telegram webhook and health probe.

use crate::channels::commands::Command;
use crate::channels::traits::{InboundMessage, Notifier};
use crate::config::ServerConfig;
use crate::error::{BotError, Result};
use crate::jobs::JobCatalog;
use crate::queue::{TaskQueue, WorkerState};
use axum::body::Bytes;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Body returned for every webhook request.
pub const WEBHOOK_ACK: &str = "ok";

/// Shared state behind the HTTP routes.
#[derive(Clone)]
pub struct WebhookState {
    queue: TaskQueue,
    jobs: JobCatalog,
    notifier: Arc<dyn Notifier>,
    authorized_chat: Option<i64>,
    health: HealthFacts,
    worker_state: Option<watch::Receiver<WorkerState>>,
}

/// Static facts included in every health report.
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthFacts {
    pub telegram_configured: bool,
    pub gatto_token_present: bool,
    pub task_timeout_sec: u64,
}

/// `GET /health` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub ok: bool,
    pub queue_size: usize,
    pub telegram_configured: bool,
    pub gatto_token_present: bool,
    pub task_timeout_sec: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_state: Option<WorkerState>,
}

impl WebhookState {
    pub fn new(
        queue: TaskQueue,
        jobs: JobCatalog,
        notifier: Arc<dyn Notifier>,
        authorized_chat: Option<i64>,
        health: HealthFacts,
    ) -> Self {
        Self {
            queue,
            jobs,
            notifier,
            authorized_chat,
            health,
            worker_state: None,
        }
    }

    /// Report the worker's state in `/health`.
    pub fn with_worker_state(mut self, rx: watch::Receiver<WorkerState>) -> Self {
        self.worker_state = Some(rx);
        self
    }

    pub fn health_report(&self) -> HealthReport {
        HealthReport {
            ok: true,
            queue_size: self.queue.len(),
            telegram_configured: self.health.telegram_configured,
            gatto_token_present: self.health.gatto_token_present,
            task_timeout_sec: self.health.task_timeout_sec,
            worker_state: self.worker_state.as_ref().map(|rx| *rx.borrow()),
        }
    }

    /// Act on one inbound message. Returns the command if one was queued.
    pub async fn handle_message(&self, message: &InboundMessage) -> Option<Command> {
        if self.authorized_chat != Some(message.chat_id) {
            debug!("ignoring message from unauthorized chat {}", message.chat_id);
            return None;
        }
        let Some(command) = Command::parse(&message.text) else {
            debug!("ignoring non-command text");
            return None;
        };

        info!("chat command {} received", command.slash());
        self.queue.enqueue(self.jobs.for_command(command));
        self.notifier.notify(command.acknowledgement()).await;
        Some(command)
    }
}

#[derive(Deserialize)]
struct TelegramUpdate {
    message: Option<TelegramMessage>,
}

#[derive(Deserialize)]
struct TelegramMessage {
    chat: Option<TelegramChat>,
    text: Option<String>,
}

#[derive(Deserialize)]
struct TelegramChat {
    id: i64,
}

/// Pull the chat id and text out of a raw Telegram update.
///
/// Anything that is not a text message yields `None`.
pub fn parse_update(body: &[u8]) -> Option<InboundMessage> {
    let update: TelegramUpdate = serde_json::from_slice(body).ok()?;
    let message = update.message?;
    Some(InboundMessage {
        chat_id: message.chat?.id,
        text: message.text?,
    })
}

pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook", post(telegram_webhook))
        .with_state(state)
}

/// Bind `config.host:config.port` and serve until the listener fails.
///
/// # Errors
///
/// Returns [`BotError::Server`] if the address cannot be bound or serving
/// stops with an error.
pub async fn serve(config: &ServerConfig, state: WebhookState) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| BotError::Server(format!("cannot bind {addr}: {e}")))?;
    serve_on(listener, state).await
}

/// Serve on an already bound listener.
///
/// # Errors
///
/// Returns [`BotError::Server`] when serving stops with an error.
pub async fn serve_on(listener: TcpListener, state: WebhookState) -> Result<()> {
    let local_addr = listener.local_addr()?;
    info!("webhook server listening on http://{local_addr}");
    axum::serve(listener, router(state))
        .await
        .map_err(|e| BotError::Server(e.to_string()))
}

async fn health(State(state): State<WebhookState>) -> impl IntoResponse {
    Json(state.health_report())
}

async fn telegram_webhook(State(state): State<WebhookState>, body: Bytes) -> &'static str {
    match parse_update(&body) {
        Some(message) => {
            state.handle_message(&message).await;
        }
        None => {
            if serde_json::from_slice::<serde_json::Value>(&body).is_err() {
                warn!("webhook body is not JSON ({} bytes)", body.len());
            }
        }
    }
    WEBHOOK_ACK
}
