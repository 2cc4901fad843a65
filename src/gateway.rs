//! Remote call gateway for the Gatto game API.
//!
//! Every logical call is an HTTP POST with a JSON body, retried with a fixed
//! delay until it gets an exact 200 or runs out of attempts. A single async
//! mutex serializes all calls, so at most one request is ever in flight even
//! if two jobs somehow ran at once.

use crate::config::GattoConfig;
use crate::error::{BotError, Result};
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Characters of a response body kept in attempt logs.
const BODY_PREVIEW_CHARS: usize = 500;

/// Logical remote operations used by the jobs.
pub mod endpoints {
    pub const PET_GET_ALL_STATS: &str = "pet.getAllStats";
    pub const PET_FEED: &str = "pet.feed";
    pub const PET_PLAY: &str = "pet.play";
    pub const PET_GET_PRIZE: &str = "pet.getPrize";
    pub const USER_GET_SELF: &str = "user.getSelf";
    pub const ADS_WATCH: &str = "ads.watch";
    pub const WAREHOUSE_GET_BY_LIMIT: &str = "warehouseGoods.getByLimit";
    pub const ESSENCE_ACTIVATE: &str = "essence.activate";
    pub const BOX_OPEN: &str = "box.open";
}

/// Coarse classification callers may branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NetworkError,
    NonSuccessStatus,
    MalformedBody,
    Cancelled,
}

/// Why a single attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttemptFailure {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("status {0}")]
    Status(u16),
}

/// Failure of one logical gateway call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    /// Every attempt failed; `last` is the final attempt's failure.
    #[error("{endpoint}: all {attempts} attempts failed, last: {last}")]
    Exhausted {
        endpoint: String,
        attempts: u32,
        last: AttemptFailure,
    },
    /// A 200 response whose body is not JSON. Never retried.
    #[error("{endpoint}: malformed response body: {message}")]
    MalformedBody { endpoint: String, message: String },
    /// The caller's cancellation token fired before the call finished.
    #[error("{endpoint}: call cancelled")]
    Cancelled { endpoint: String },
}

impl GatewayError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Exhausted { last, .. } => match last {
                AttemptFailure::Transport(_) | AttemptFailure::Timeout(_) => {
                    FailureKind::NetworkError
                }
                AttemptFailure::Status(_) => FailureKind::NonSuccessStatus,
            },
            Self::MalformedBody { .. } => FailureKind::MalformedBody,
            Self::Cancelled { .. } => FailureKind::Cancelled,
        }
    }

    /// Returns `true` when the attempt budget was used up.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}

/// Attempt budget and timing for one logical call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Pause after a failed attempt when another one follows.
    pub retry_delay: Duration,
    /// Bound on one attempt, from connect to the end of the body.
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &GattoConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            retry_delay: Duration::from_secs(config.retry_delay_secs),
            attempt_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&GattoConfig::default())
    }
}

/// Shared handle to the game service. Construct once and pass by `Arc`.
pub struct GattoGateway {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
    policy: RetryPolicy,
    lock: Mutex<()>,
}

impl GattoGateway {
    /// Build a gateway with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::Config`] if a header value is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: &GattoConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::REFERER,
            HeaderValue::from_str(&config.referer)
                .map_err(|e| BotError::Config(format!("invalid referer header: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| BotError::Config(format!("cannot build gatto http client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            auth_token: config
                .auth_token
                .as_ref()
                .map(|t| t.trim().to_owned())
                .filter(|t| !t.is_empty()),
            policy: RetryPolicy::from_config(config),
            lock: Mutex::new(()),
        })
    }

    /// Override the retry policy.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = RetryPolicy {
            max_attempts: policy.max_attempts.max(1),
            ..policy
        };
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn has_auth_token(&self) -> bool {
        self.auth_token.is_some()
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Perform one logical call. `payload` defaults to `{}`.
    pub async fn call(
        &self,
        endpoint: &str,
        payload: Option<Value>,
    ) -> std::result::Result<Value, GatewayError> {
        self.call_cancellable(endpoint, payload, &CancellationToken::new())
            .await
    }

    /// Perform one logical call that aborts as soon as `cancel` fires.
    ///
    /// Cancellation is observed while waiting for the gateway lock, during an
    /// attempt and during the retry delay. The request future is dropped, so
    /// the lock is released immediately.
    pub async fn call_cancellable(
        &self,
        endpoint: &str,
        payload: Option<Value>,
        cancel: &CancellationToken,
    ) -> std::result::Result<Value, GatewayError> {
        let url = self.endpoint_url(endpoint);
        let body = payload.unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        let cancelled = || GatewayError::Cancelled {
            endpoint: endpoint.to_owned(),
        };

        let _guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled()),
            guard = self.lock.lock() => guard,
        };

        let max_attempts = self.policy.max_attempts;
        let mut last_failure = None;

        for attempt in 1..=max_attempts {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled()),
                outcome = self.attempt(&url, &body) => outcome,
            };

            match outcome {
                Ok((status, text)) => {
                    info!(
                        "response {status} from {url} (attempt {attempt}/{max_attempts}): {}",
                        body_preview(&text)
                    );
                    if status == 200 {
                        return serde_json::from_str::<Value>(&text).map_err(|e| {
                            warn!("malformed body from {url}: {e}");
                            GatewayError::MalformedBody {
                                endpoint: endpoint.to_owned(),
                                message: e.to_string(),
                            }
                        });
                    }
                    last_failure = Some(AttemptFailure::Status(status));
                }
                Err(failure) => {
                    warn!("request to {url} failed (attempt {attempt}/{max_attempts}): {failure}");
                    last_failure = Some(failure);
                }
            }

            if attempt < max_attempts {
                debug!("retrying {url} in {:?}", self.policy.retry_delay);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(cancelled()),
                    _ = tokio::time::sleep(self.policy.retry_delay) => {}
                }
            }
        }

        error!("all {max_attempts} attempts failed for {url}");
        Err(GatewayError::Exhausted {
            endpoint: endpoint.to_owned(),
            attempts: max_attempts,
            last: last_failure.unwrap_or(AttemptFailure::Status(0)),
        })
    }

    async fn attempt(
        &self,
        url: &str,
        body: &Value,
    ) -> std::result::Result<(u16, String), AttemptFailure> {
        let timeout = self.policy.attempt_timeout;
        let mut request = self.client.post(url).json(body);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let exchange = async {
            let response = request
                .send()
                .await
                .map_err(|e| AttemptFailure::Transport(e.to_string()))?;
            let status = response.status().as_u16();
            let text = response
                .text()
                .await
                .map_err(|e| AttemptFailure::Transport(e.to_string()))?;
            Ok::<_, AttemptFailure>((status, text))
        };

        match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(AttemptFailure::Timeout(timeout)),
        }
    }
}

/// Truncate a body for logging, appending `...` when cut.
pub fn body_preview(text: &str) -> String {
    match text.char_indices().nth(BODY_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_owned(),
    }
}
