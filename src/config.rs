//! Configuration types for the bot.
//!
//! Values come from an optional TOML file and are then overridden by
//! environment variables, so every timing constant can be adjusted at process
//! start without rebuilding.

use crate::error::{BotError, Result};
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an optional TOML config file.
pub const CONFIG_PATH_ENV: &str = "GATTO_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Remote game service (gateway) settings.
    pub gatto: GattoConfig,
    /// Telegram notification and command channel.
    pub telegram: TelegramConfig,
    /// Queue worker settings.
    pub worker: WorkerConfig,
    /// Essence application job settings.
    pub essence: EssenceConfig,
    /// Loot-box opening job settings.
    pub loot_boxes: LootBoxConfig,
    /// Scheduled trigger times.
    pub schedule: ScheduleConfig,
    /// Webhook/health HTTP server.
    pub server: ServerConfig,
}

/// Game service gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GattoConfig {
    /// Base URL every endpoint is resolved against.
    pub base_url: String,
    /// Bearer token for the game API.
    pub auth_token: Option<String>,
    /// Per-attempt timeout in seconds.
    pub request_timeout_secs: u64,
    /// Attempts per logical call (not additional retries).
    pub max_retries: u32,
    /// Fixed delay between attempts in seconds.
    pub retry_delay_secs: u64,
    /// `referer` header sent with every call.
    pub referer: String,
    /// `user-agent` header sent with every call.
    pub user_agent: String,
    /// Pause after the `pet.getAllStats` warm-up call, in seconds.
    pub warmup_delay_secs: u64,
}

impl Default for GattoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.nl.gatto.pw".to_owned(),
            auth_token: None,
            request_timeout_secs: 20,
            max_retries: 3,
            retry_delay_secs: 3,
            referer: "https://gatto.pw/".to_owned(),
            user_agent: "Mozilla/5.0".to_owned(),
            warmup_delay_secs: 2,
        }
    }
}

/// Telegram Bot API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token; notifications are skipped when unset.
    pub bot_token: Option<String>,
    /// The only chat allowed to issue commands and the notification target.
    pub chat_id: Option<i64>,
    /// Bot API base URL.
    pub api_base_url: String,
    /// Send timeout in seconds.
    pub timeout_secs: u64,
    /// Public URL to register as the bot webhook at start.
    pub webhook_url: Option<String>,
    /// Maximum UTF-16 code units per outgoing message.
    pub max_message_chars: usize,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base_url: "https://api.telegram.org".to_owned(),
            timeout_secs: 3,
            webhook_url: None,
            max_message_chars: 4096,
        }
    }
}

impl TelegramConfig {
    /// Returns `true` when both the bot token and the chat id are present.
    pub fn is_configured(&self) -> bool {
        self.bot_token.as_deref().is_some_and(|t| !t.trim().is_empty()) && self.chat_id.is_some()
    }
}

/// Worker loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Per-task deadline in seconds.
    pub task_timeout_secs: u64,
    /// Maximum wait of one dequeue in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            task_timeout_secs: 60,
            poll_interval_ms: 1000,
        }
    }
}

impl WorkerConfig {
    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Essence application job configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EssenceConfig {
    /// Pets below this level are leveled up.
    pub target_level: i64,
    /// Maximum `essence.activate` calls for one pet in one run.
    pub max_attempts_per_pet: u32,
    /// Page size of the essence warehouse lookup.
    pub lookup_limit: u32,
}

impl Default for EssenceConfig {
    fn default() -> Self {
        Self {
            target_level: 10,
            max_attempts_per_pet: 50,
            lookup_limit: 8,
        }
    }
}

/// Loot-box opening job configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LootBoxConfig {
    /// Containers fetched per warehouse page.
    pub batch_size: u32,
    /// Upper bound on pages walked in one run.
    pub max_batches: u32,
}

impl Default for LootBoxConfig {
    fn default() -> Self {
        Self {
            batch_size: 8,
            max_batches: 100,
        }
    }
}

/// Scheduled triggers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub feed_interval_mins: u64,
    pub prize_interval_mins: u64,
    pub play_interval_mins: u64,
    /// Daily essence run, `HH:MM` UTC.
    pub apply_time: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            feed_interval_mins: 2,
            prize_interval_mins: 29,
            play_interval_mins: 60,
            apply_time: "03:00".to_owned(),
        }
    }
}

/// Webhook and health server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 8080,
        }
    }
}

/// Parse an `HH:MM` time of day into `(hour, minute)`.
///
/// # Errors
///
/// Returns [`BotError::Config`] if the value is not a valid 24h time.
pub fn parse_daily_time(value: &str) -> Result<(u8, u8)> {
    let time = NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|e| BotError::Config(format!("invalid time of day `{value}`: {e}")))?;
    // hour() < 24 and minute() < 60, both fit in u8.
    Ok((time.hour() as u8, time.minute() as u8))
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| BotError::Config(format!("{key}={raw:?}: {e}")))
}

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

impl BotConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| BotError::Config(e.to_string()))
    }

    /// Build the process configuration: optional file named by
    /// `GATTO_CONFIG`, then environment overrides, then validation.
    ///
    /// # Errors
    ///
    /// Returns an error for an unreadable file, an unparsable environment
    /// value, or a configuration that fails [`BotConfig::validate`].
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(&PathBuf::from(path))?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from environment-style variables.
    ///
    /// `lookup` returns the raw value of a variable, if set.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::Config`] when a numeric variable does not parse.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = lookup("TELEGRAM_TOKEN") {
            self.telegram.bot_token = non_empty(v);
        }
        if let Some(v) = lookup("CHAT_ID") {
            // Unparsable chat id leaves the channel unconfigured.
            self.telegram.chat_id = match v.trim().parse::<i64>() {
                Ok(id) => Some(id),
                Err(e) => {
                    tracing::warn!("ignoring invalid CHAT_ID {v:?}: {e}");
                    None
                }
            };
        }
        if let Some(v) = lookup("TG_TIMEOUT") {
            self.telegram.timeout_secs = parse_env("TG_TIMEOUT", &v)?;
        }
        if let Some(v) = lookup("WEBHOOK_URL") {
            self.telegram.webhook_url = non_empty(v);
        }
        if let Some(v) = lookup("TG_TOKEN") {
            self.gatto.auth_token = non_empty(v);
        }
        if let Some(v) = lookup("GATTO_BASE_URL") {
            self.gatto.base_url = v.trim().trim_end_matches('/').to_owned();
        }
        if let Some(v) = lookup("GATTO_TIMEOUT") {
            self.gatto.request_timeout_secs = parse_env("GATTO_TIMEOUT", &v)?;
        }
        if let Some(v) = lookup("MAX_RETRIES") {
            self.gatto.max_retries = parse_env("MAX_RETRIES", &v)?;
        }
        if let Some(v) = lookup("RETRY_DELAY") {
            self.gatto.retry_delay_secs = parse_env("RETRY_DELAY", &v)?;
        }
        if let Some(v) = lookup("TASK_TIMEOUT") {
            self.worker.task_timeout_secs = parse_env("TASK_TIMEOUT", &v)?;
        }
        if let Some(v) = lookup("MAX_ESSENCE_ATTEMPTS_PER_PET") {
            self.essence.max_attempts_per_pet = parse_env("MAX_ESSENCE_ATTEMPTS_PER_PET", &v)?;
        }
        if let Some(v) = lookup("BOX_BATCH_SIZE") {
            self.loot_boxes.batch_size = parse_env("BOX_BATCH_SIZE", &v)?;
        }
        if let Some(v) = lookup("APPLY_TIME") {
            self.schedule.apply_time = v.trim().to_owned();
        }
        if let Some(v) = lookup("FEED_INTERVAL_MIN") {
            self.schedule.feed_interval_mins = parse_env("FEED_INTERVAL_MIN", &v)?;
        }
        if let Some(v) = lookup("PRIZE_INTERVAL_MIN") {
            self.schedule.prize_interval_mins = parse_env("PRIZE_INTERVAL_MIN", &v)?;
        }
        if let Some(v) = lookup("PLAY_INTERVAL_MIN") {
            self.schedule.play_interval_mins = parse_env("PLAY_INTERVAL_MIN", &v)?;
        }
        if let Some(v) = lookup("PORT") {
            self.server.port = parse_env("PORT", &v)?;
        }
        Ok(())
    }

    /// Reject values that would make the worker or gateway misbehave.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        let require_positive = |name: &str, value: u64| {
            if value == 0 {
                Err(BotError::Config(format!("{name} must be greater than zero")))
            } else {
                Ok(())
            }
        };

        require_positive("gatto.max_retries", u64::from(self.gatto.max_retries))?;
        require_positive("gatto.request_timeout_secs", self.gatto.request_timeout_secs)?;
        require_positive("worker.task_timeout_secs", self.worker.task_timeout_secs)?;
        require_positive("worker.poll_interval_ms", self.worker.poll_interval_ms)?;
        require_positive(
            "essence.max_attempts_per_pet",
            u64::from(self.essence.max_attempts_per_pet),
        )?;
        require_positive("loot_boxes.batch_size", u64::from(self.loot_boxes.batch_size))?;
        require_positive("schedule.feed_interval_mins", self.schedule.feed_interval_mins)?;
        require_positive("schedule.prize_interval_mins", self.schedule.prize_interval_mins)?;
        require_positive("schedule.play_interval_mins", self.schedule.play_interval_mins)?;
        if self.telegram.max_message_chars == 0 {
            return Err(BotError::Config(
                "telegram.max_message_chars must be greater than zero".to_owned(),
            ));
        }
        parse_daily_time(&self.schedule.apply_time)?;
        Ok(())
    }
}
