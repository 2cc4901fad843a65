//! Game jobs executed by the worker.
//!
//! [`JobCatalog`] is the only place that knows how to turn a job kind into a
//! queued [`Job`]. Producers (the scheduler, chat commands, the startup
//! cycle) ask the catalog and never build jobs themselves.

pub mod care;
pub mod essence;
pub mod loot_box;
pub mod pets;
pub mod rewards;

use crate::channels::commands::Command;
use crate::channels::traits::Notifier;
use crate::config::{BotConfig, EssenceConfig, LootBoxConfig};
use crate::gateway::{GatewayError, GattoGateway};
use crate::queue::{Job, JobContext};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const FEED_CATS: &str = "feed_cats";
pub const GET_PRIZE: &str = "get_prize";
pub const PLAY_GAME: &str = "play_game";
pub const APPLY_ESSENCES: &str = "apply_essences";
pub const OPEN_LOOT_BOXES: &str = "open_loot_boxes";

/// Everything a running job talks to: the gateway, the chat and its own
/// cancellation token.
pub struct Session {
    gateway: Arc<GattoGateway>,
    notifier: Arc<dyn Notifier>,
    cancel: CancellationToken,
}

impl Session {
    pub fn new(
        gateway: Arc<GattoGateway>,
        notifier: Arc<dyn Notifier>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            gateway,
            notifier,
            cancel,
        }
    }

    /// Gateway call that aborts when the job is cancelled.
    pub async fn call(
        &self,
        endpoint: &str,
        payload: Option<Value>,
    ) -> std::result::Result<Value, GatewayError> {
        self.gateway
            .call_cancellable(endpoint, payload, &self.cancel)
            .await
    }

    pub async fn notify(&self, text: &str) {
        self.notifier.notify(text).await;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Sleep for `duration` unless the job is cancelled first.
    pub async fn pause(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {}
            _ = tokio::time::sleep(duration) => {}
        }
    }
}

/// Per-job tunables taken from [`BotConfig`].
#[derive(Debug, Clone)]
pub struct JobSettings {
    pub warmup_delay: Duration,
    pub essence: EssenceConfig,
    pub loot_boxes: LootBoxConfig,
}

impl JobSettings {
    pub fn from_config(config: &BotConfig) -> Self {
        Self {
            warmup_delay: Duration::from_secs(config.gatto.warmup_delay_secs),
            essence: config.essence.clone(),
            loot_boxes: config.loot_boxes.clone(),
        }
    }
}

impl Default for JobSettings {
    fn default() -> Self {
        Self::from_config(&BotConfig::default())
    }
}

/// Factory for every job kind the bot runs.
#[derive(Clone)]
pub struct JobCatalog {
    gateway: Arc<GattoGateway>,
    notifier: Arc<dyn Notifier>,
    settings: Arc<JobSettings>,
}

impl JobCatalog {
    pub fn new(
        gateway: Arc<GattoGateway>,
        notifier: Arc<dyn Notifier>,
        settings: JobSettings,
    ) -> Self {
        Self {
            gateway,
            notifier,
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &JobSettings {
        &self.settings
    }

    fn session(&self, ctx: &JobContext) -> Session {
        Session::new(
            Arc::clone(&self.gateway),
            Arc::clone(&self.notifier),
            ctx.cancellation().clone(),
        )
    }

    pub fn feed_cats(&self) -> Job {
        let catalog = self.clone();
        Job::new(FEED_CATS, move |ctx| async move {
            let session = catalog.session(&ctx);
            care::feed_cats(&session, catalog.settings.warmup_delay).await
        })
    }

    pub fn get_prize(&self) -> Job {
        let catalog = self.clone();
        Job::new(GET_PRIZE, move |ctx| async move {
            let session = catalog.session(&ctx);
            care::get_prize(&session, catalog.settings.warmup_delay).await
        })
    }

    pub fn play_game(&self) -> Job {
        let catalog = self.clone();
        Job::new(PLAY_GAME, move |ctx| async move {
            let session = catalog.session(&ctx);
            care::play_game(&session, catalog.settings.warmup_delay).await
        })
    }

    pub fn apply_essences(&self) -> Job {
        let catalog = self.clone();
        Job::new(APPLY_ESSENCES, move |ctx| async move {
            let session = catalog.session(&ctx);
            essence::apply_essences(&session, &catalog.settings.essence)
                .await
                .map(|_| ())
        })
    }

    pub fn open_loot_boxes(&self) -> Job {
        let catalog = self.clone();
        Job::new(OPEN_LOOT_BOXES, move |ctx| async move {
            let session = catalog.session(&ctx);
            loot_box::open_loot_boxes(&session, &catalog.settings.loot_boxes)
                .await
                .map(|_| ())
        })
    }

    /// Job for a chat command.
    pub fn for_command(&self, command: Command) -> Job {
        match command {
            Command::ApplyEssences => self.apply_essences(),
            Command::OpenBoxes => self.open_loot_boxes(),
            Command::Feed => self.feed_cats(),
            Command::Prize => self.get_prize(),
            Command::Play => self.play_game(),
        }
    }

    /// Jobs queued once at startup, in order.
    pub fn initial_cycle(&self) -> Vec<Job> {
        vec![self.feed_cats(), self.get_prize(), self.play_game()]
    }
}
