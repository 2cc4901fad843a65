//! Telegram channel: outbound notifications and the inbound webhook.
//!
//! The notifier is the only outbound path and is best-effort. The webhook
//! accepts updates from one authorized chat and turns recognised commands
//! into queued jobs.

pub mod commands;
pub mod telegram;
pub mod traits;
pub mod webhook;

pub use commands::Command;
pub use telegram::TelegramNotifier;
pub use traits::{InboundMessage, Notifier};
pub use webhook::{HealthReport, WebhookState};
