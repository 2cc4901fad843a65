//! Scheduler background loop.
//!
//! Spawns a tokio task that checks for due tasks once per tick and enqueues
//! the matching job. The scheduler never runs jobs itself.

use crate::config::ScheduleConfig;
use crate::error::{BotError, Result};
use crate::jobs::{APPLY_ESSENCES, FEED_CATS, GET_PRIZE, JobCatalog, OPEN_LOOT_BOXES, PLAY_GAME};
use crate::queue::{Job, TaskQueue};
use crate::scheduler::tasks::{self, ScheduledTask, now_epoch_secs};
use std::time::Duration;
use tracing::{debug, info};

/// Interval between scheduler ticks.
const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Builds a fresh job each time a task fires.
pub type JobFactory = Box<dyn Fn() -> Job + Send + Sync>;

struct Entry {
    task: ScheduledTask,
    factory: JobFactory,
}

/// Background scheduler that feeds the task queue.
pub struct Scheduler {
    entries: Vec<Entry>,
    queue: TaskQueue,
    tick: Duration,
}

impl Scheduler {
    pub fn new(queue: TaskQueue) -> Self {
        Self {
            entries: Vec::new(),
            queue,
            tick: TICK_INTERVAL,
        }
    }

    /// Override the tick interval.
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick.max(Duration::from_millis(1));
        self
    }

    /// Scheduler with the bot's recurring tasks, armed at the current time.
    ///
    /// # Errors
    ///
    /// Returns a config error for a bad `apply_time`.
    pub fn from_config(
        queue: TaskQueue,
        config: &ScheduleConfig,
        jobs: JobCatalog,
    ) -> Result<Self> {
        let now = now_epoch_secs();
        let mut scheduler = Self::new(queue);
        for mut task in tasks::default_tasks(config)? {
            task.arm(now);
            let factory = job_factory(&jobs, &task.id)?;
            scheduler.add(task, factory);
        }
        Ok(scheduler)
    }

    /// Register a task.
    pub fn add(&mut self, task: ScheduledTask, factory: JobFactory) {
        info!("scheduled {} {}", task.id, task.schedule);
        self.entries.push(Entry { task, factory });
    }

    pub fn tasks(&self) -> impl Iterator<Item = &ScheduledTask> {
        self.entries.iter().map(|e| &e.task)
    }

    /// Enqueue every task due at `now`. Returns how many were enqueued.
    pub fn tick_at(&mut self, now: u64) -> usize {
        let mut fired = 0;
        for entry in &mut self.entries {
            if entry.task.is_due_at(now) {
                debug!("task {} due, enqueueing", entry.task.id);
                self.queue.enqueue((entry.factory)());
                entry.task.mark_run_at(now);
                fired += 1;
            }
        }
        fired
    }

    /// Start the scheduler loop on the tokio runtime.
    pub fn run(mut self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            info!("scheduler started with {} tasks", self.entries.len());
            let mut interval = tokio::time::interval(self.tick);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                self.tick_at(now_epoch_secs());
            }
        })
    }
}

fn job_factory(jobs: &JobCatalog, id: &str) -> Result<JobFactory> {
    let jobs = jobs.clone();
    let factory: JobFactory = match id {
        FEED_CATS => Box::new(move || jobs.feed_cats()),
        GET_PRIZE => Box::new(move || jobs.get_prize()),
        PLAY_GAME => Box::new(move || jobs.play_game()),
        APPLY_ESSENCES => Box::new(move || jobs.apply_essences()),
        OPEN_LOOT_BOXES => Box::new(move || jobs.open_loot_boxes()),
        other => return Err(BotError::Config(format!("no job named {other}"))),
    };
    Ok(factory)
}
