//! Process wiring: builds the shared clients, starts the worker and the
//! scheduler, queues the startup cycle, then serves the webhook.

use crate::channels::telegram::TelegramNotifier;
use crate::channels::traits::Notifier;
use crate::channels::webhook::{self, HealthFacts, WebhookState};
use crate::config::BotConfig;
use crate::error::Result;
use crate::gateway::GattoGateway;
use crate::jobs::{JobCatalog, JobSettings};
use crate::queue::{TaskQueue, Worker, WorkerHandle, task_queue};
use crate::scheduler::Scheduler;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// A running bot without its HTTP surface.
pub struct Bot {
    pub queue: TaskQueue,
    pub jobs: JobCatalog,
    pub notifier: Arc<dyn Notifier>,
    pub worker: WorkerHandle,
    pub scheduler: JoinHandle<()>,
}

impl Bot {
    /// Start the worker and scheduler and queue the startup cycle.
    ///
    /// # Errors
    ///
    /// Fails if an HTTP client cannot be built or the schedule is invalid.
    pub fn start(config: &BotConfig, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let gateway = Arc::new(GattoGateway::new(&config.gatto)?);
        if !gateway.has_auth_token() {
            warn!("no game auth token configured, calls will be unauthenticated");
        }

        let (queue, receiver) = task_queue();
        let worker = Worker::new(
            receiver,
            config.worker.task_timeout(),
            config.worker.poll_interval(),
            Arc::clone(&notifier),
        )
        .spawn();

        let jobs = JobCatalog::new(
            gateway,
            Arc::clone(&notifier),
            JobSettings::from_config(config),
        );
        for job in jobs.initial_cycle() {
            queue.enqueue(job);
        }

        let scheduler = Scheduler::from_config(queue.clone(), &config.schedule, jobs.clone())?.run();

        Ok(Self {
            queue,
            jobs,
            notifier,
            worker,
            scheduler,
        })
    }

    /// Routes' shared state for this bot.
    pub fn webhook_state(&self, config: &BotConfig) -> WebhookState {
        WebhookState::new(
            self.queue.clone(),
            self.jobs.clone(),
            Arc::clone(&self.notifier),
            config.telegram.chat_id,
            HealthFacts {
                telegram_configured: config.telegram.is_configured(),
                gatto_token_present: config
                    .gatto
                    .auth_token
                    .as_deref()
                    .is_some_and(|t| !t.trim().is_empty()),
                task_timeout_sec: config.worker.task_timeout_secs,
            },
        )
        .with_worker_state(self.worker.state_watch())
    }

    /// Stop the scheduler and the worker. Queued jobs are dropped.
    pub async fn shutdown(self) {
        self.scheduler.abort();
        self.worker.shutdown_and_join().await;
    }
}

async fn register_webhook(telegram: &TelegramNotifier, config: &BotConfig) {
    let Some(url) = config.telegram.webhook_url.as_deref() else {
        info!("WEBHOOK_URL not set, skipping webhook registration");
        return;
    };
    if config.telegram.bot_token.is_none() {
        info!("telegram token not set, skipping webhook registration");
        return;
    }
    match telegram.set_webhook(url).await {
        Ok(reply) => info!("telegram webhook registered: {reply}"),
        Err(e) => warn!("telegram webhook registration failed: {e}"),
    }
}

/// Run the bot until the server stops or Ctrl-C arrives.
///
/// # Errors
///
/// Returns startup errors and webhook server failures.
pub async fn run(config: BotConfig) -> Result<()> {
    let telegram = Arc::new(TelegramNotifier::new(&config.telegram)?);
    if !telegram.is_configured() {
        warn!("telegram not configured, notifications and commands are disabled");
    }
    register_webhook(&telegram, &config).await;

    let bot = Bot::start(&config, telegram)?;
    let state = bot.webhook_state(&config);

    let outcome = tokio::select! {
        served = webhook::serve(&config.server, state) => served,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, shutting down");
            Ok(())
        }
    };

    bot.shutdown().await;
    outcome
}
