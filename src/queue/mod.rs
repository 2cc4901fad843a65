//! Serialized job execution.
//!
//! Producers (the scheduler and the chat command handler) only ever call
//! [`TaskQueue::enqueue`]. A single [`Worker`] owns the receiving half, pulls
//! one [`Job`] at a time and runs it under a [`TimeoutSupervisor`], so jobs
//! execute strictly in enqueue order and never overlap.

pub mod job;
pub mod supervisor;
pub mod task_queue;
pub mod worker;

pub use job::{Job, JobContext};
pub use supervisor::{JobOutcome, TimeoutSupervisor};
pub use task_queue::{JobReceiver, TaskQueue, task_queue};
pub use worker::{JobReport, Worker, WorkerHandle, WorkerState};
