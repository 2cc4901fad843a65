//! Scheduled task definitions.
//!
//! Defines the [`ScheduledTask`] type and the [`Schedule`] enum for timing.
//! Times are UTC epoch seconds; callers pass `now` so due checks are pure.

use crate::config::{ScheduleConfig, parse_daily_time};
use crate::error::Result;
use std::time::{SystemTime, UNIX_EPOCH};

const SECS_PER_DAY: u64 = 86_400;

/// How often a task should run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schedule {
    /// Run every N seconds.
    Interval {
        /// Interval in seconds between runs.
        secs: u64,
    },
    /// Run once daily at a given hour and minute (UTC).
    Daily {
        /// Hour of day (0-23, UTC).
        hour: u8,
        /// Minute of hour (0-59).
        min: u8,
    },
}

impl std::fmt::Display for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interval { secs } if *secs % 3600 == 0 && *secs >= 3600 => {
                write!(f, "every {} hours", secs / 3600)
            }
            Self::Interval { secs } if *secs % 60 == 0 => write!(f, "every {} minutes", secs / 60),
            Self::Interval { secs } => write!(f, "every {secs} seconds"),
            Self::Daily { hour, min } => write!(f, "daily at {hour:02}:{min:02} UTC"),
        }
    }
}

/// A job kind that runs on a schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    /// Job name this task enqueues (e.g. `"feed_cats"`).
    pub id: String,
    /// When to run this task.
    pub schedule: Schedule,
    /// Unix epoch seconds of the last time the task fired.
    pub last_run: Option<u64>,
    /// Whether the task is enabled.
    pub enabled: bool,
}

impl ScheduledTask {
    /// Create a new enabled task that has never fired.
    pub fn new(id: impl Into<String>, schedule: Schedule) -> Self {
        Self {
            id: id.into(),
            schedule,
            last_run: None,
            enabled: true,
        }
    }

    /// Returns `true` if the task is enabled and due at `now`.
    ///
    /// A task that never ran is due immediately. To delay the first run by
    /// one period, [`arm`](Self::arm) it first.
    pub fn is_due_at(&self, now: u64) -> bool {
        if !self.enabled {
            return false;
        }

        match &self.schedule {
            Schedule::Interval { secs } => match self.last_run {
                None => true,
                Some(last) => now.saturating_sub(last) >= *secs,
            },
            Schedule::Daily { hour, min } => {
                let day_secs = u64::from(*hour) * 3600 + u64::from(*min) * 60;
                let scheduled = now - (now % SECS_PER_DAY) + day_secs;

                match self.last_run {
                    None => now >= scheduled,
                    Some(last) => last < scheduled && now >= scheduled,
                }
            }
        }
    }

    /// Treat `now` as the last run, so the task next fires one interval
    /// later (or at the next daily occurrence).
    pub fn arm(&mut self, now: u64) {
        self.last_run = Some(now);
    }

    /// Record that the task fired at `now`.
    pub fn mark_run_at(&mut self, now: u64) {
        self.last_run = Some(now);
    }
}

/// The bot's recurring tasks, keyed by job name.
///
/// # Errors
///
/// Returns a config error if `apply_time` is not `HH:MM`.
pub fn default_tasks(config: &ScheduleConfig) -> Result<Vec<ScheduledTask>> {
    use crate::jobs::{APPLY_ESSENCES, FEED_CATS, GET_PRIZE, PLAY_GAME};

    let (hour, min) = parse_daily_time(&config.apply_time)?;
    let every = |mins: u64| Schedule::Interval { secs: mins * 60 };
    Ok(vec![
        ScheduledTask::new(FEED_CATS, every(config.feed_interval_mins)),
        ScheduledTask::new(GET_PRIZE, every(config.prize_interval_mins)),
        ScheduledTask::new(PLAY_GAME, every(config.play_interval_mins)),
        ScheduledTask::new(APPLY_ESSENCES, Schedule::Daily { hour, min }),
    ])
}

/// Returns current UTC seconds since epoch.
pub fn now_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
