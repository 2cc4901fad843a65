//! Background task scheduler.
//!
//! Enqueues the recurring game jobs (feeding, prizes, play, daily essence
//! application) on a fixed tick.

pub mod runner;
pub mod tasks;

pub use runner::Scheduler;
pub use tasks::{Schedule, ScheduledTask};
