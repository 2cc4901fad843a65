//! Shared helpers for integration tests.

use async_trait::async_trait;
use gatto::channels::Notifier;
use gatto::config::GattoConfig;
use gatto::gateway::{GattoGateway, RetryPolicy};
use gatto::jobs::Session;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::MockServer;

pub(crate) const TOKEN: &str = "test-token";

/// Notifier that keeps every message in memory.
#[derive(Debug, Default)]
pub(crate) struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub(crate) fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn id(&self) -> &'static str {
        "recording"
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn notify(&self, text: &str) {
        self.messages.lock().unwrap().push(text.to_owned());
    }
}

/// Gateway pointed at `server` with a fast retry policy.
pub(crate) fn gateway(server: &MockServer, max_attempts: u32, retry_delay: Duration) -> GattoGateway {
    gateway_at(&server.uri(), max_attempts, retry_delay)
}

pub(crate) fn gateway_at(base_url: &str, max_attempts: u32, retry_delay: Duration) -> GattoGateway {
    let config = GattoConfig {
        base_url: base_url.to_owned(),
        auth_token: Some(TOKEN.to_owned()),
        ..Default::default()
    };
    GattoGateway::new(&config)
        .expect("gateway builds")
        .with_policy(RetryPolicy {
            max_attempts,
            retry_delay,
            attempt_timeout: Duration::from_secs(2),
        })
}

/// Session over a fresh gateway, never cancelled.
pub(crate) fn session(server: &MockServer) -> (Session, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let session = Session::new(
        Arc::new(gateway(server, 2, Duration::from_millis(10))),
        notifier.clone(),
        CancellationToken::new(),
    );
    (session, notifier)
}
