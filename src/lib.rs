//! Gatto: serialized automation bot for the Gatto pet game.
//!
//! Jobs (feeding, playing, prize collection, essence application, loot box
//! opening) are queued by the scheduler or by Telegram chat commands and run
//! one at a time by a single worker.
//!
//! # Architecture
//!
//! - **Gateway**: the only path to the game service, with retries and a
//!   global lock so calls never overlap
//! - **Queue**: unbounded FIFO, one worker, per-job deadline with
//!   cooperative cancellation
//! - **Jobs**: pure functions of a [`jobs::Session`]
//! - **Channels**: Telegram notifier and the inbound webhook
//! - **Scheduler**: fixed-tick producer of recurring jobs

pub mod channels;
pub mod config;
pub mod error;
pub mod gateway;
pub mod jobs;
pub mod queue;
pub mod runtime;
pub mod scheduler;


pub use config::BotConfig;
pub use error::{BotError, Result};
pub use gateway::{GatewayError, GattoGateway};
pub use queue::{Job, JobContext, TaskQueue, Worker};
