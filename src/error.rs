//! Error types for the gatto bot.

use crate::gateway::GatewayError;

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    /// Configuration error (bad file, bad environment value, failed validation).
    #[error("config error: {0}")]
    Config(String),

    /// Remote game service call failed.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Notification channel error.
    #[error("notify error: {0}")]
    Notify(String),

    /// Job logic error.
    #[error("job error: {0}")]
    Job(String),

    /// Webhook/health server error.
    #[error("server error: {0}")]
    Server(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, BotError>;
