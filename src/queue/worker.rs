//! The single consumer of the task queue.

use crate::channels::traits::Notifier;
use crate::queue::supervisor::{JobOutcome, TimeoutSupervisor};
use crate::queue::task_queue::JobReceiver;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Where the worker loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Idle,
    Polling,
    Executing,
}

/// Emitted after every job, for observers that want outcomes.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub name: String,
    pub outcome: JobOutcome,
    pub elapsed: Duration,
}

/// Pulls jobs one at a time and runs each under the supervisor.
pub struct Worker {
    receiver: JobReceiver,
    supervisor: TimeoutSupervisor,
    poll_interval: Duration,
    notifier: Arc<dyn Notifier>,
    shutdown: CancellationToken,
    report_tx: Option<mpsc::UnboundedSender<JobReport>>,
    state_tx: watch::Sender<WorkerState>,
}

/// Handle to a spawned worker.
pub struct WorkerHandle {
    shutdown: CancellationToken,
    state_rx: watch::Receiver<WorkerState>,
    join: JoinHandle<()>,
}

impl WorkerHandle {
    pub fn state(&self) -> WorkerState {
        *self.state_rx.borrow()
    }

    /// Receiver that follows state changes.
    pub fn state_watch(&self) -> watch::Receiver<WorkerState> {
        self.state_rx.clone()
    }

    /// Stop polling and cancel the running job's token.
    pub fn request_shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Shutdown and wait for the loop to exit.
    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        if let Err(e) = self.join.await {
            warn!("worker task ended abnormally: {e}");
        }
    }
}

impl Worker {
    pub fn new(
        receiver: JobReceiver,
        task_timeout: Duration,
        poll_interval: Duration,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let shutdown = CancellationToken::new();
        let (state_tx, _) = watch::channel(WorkerState::Idle);
        Self {
            receiver,
            supervisor: TimeoutSupervisor::new(task_timeout).with_parent(shutdown.clone()),
            poll_interval,
            notifier,
            shutdown,
            report_tx: None,
            state_tx,
        }
    }

    /// Send a [`JobReport`] for every finished job to `tx`.
    pub fn with_reports(mut self, tx: mpsc::UnboundedSender<JobReport>) -> Self {
        self.report_tx = Some(tx);
        self
    }

    /// Start the loop on a tokio task.
    pub fn spawn(self) -> WorkerHandle {
        let shutdown = self.shutdown.clone();
        let state_rx = self.state_tx.subscribe();
        let join = tokio::spawn(self.run());
        WorkerHandle {
            shutdown,
            state_rx,
            join,
        }
    }

    /// Run until shutdown is requested. Job errors, panics and timeouts are
    /// logged and never end the loop.
    pub async fn run(mut self) {
        info!(
            "worker started; task timeout {:?}, poll interval {:?}",
            self.supervisor.deadline(),
            self.poll_interval
        );

        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            self.set_state(WorkerState::Polling);
            let next = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                job = self.receiver.dequeue(self.poll_interval) => job,
            };
            let Some(job) = next else {
                continue;
            };

            let name = job.name().to_owned();
            self.set_state(WorkerState::Executing);
            info!("worker took job {name}");

            let started = Instant::now();
            let outcome = self.supervisor.run(job).await;
            let elapsed = started.elapsed();
            self.record(name, outcome, elapsed).await;
            self.set_state(WorkerState::Idle);
        }

        self.set_state(WorkerState::Idle);
        info!("worker stopped");
    }

    fn set_state(&self, state: WorkerState) {
        self.state_tx.send_replace(state);
    }

    async fn record(&self, name: String, outcome: JobOutcome, elapsed: Duration) {
        match &outcome {
            JobOutcome::Completed => info!("job {name} completed in {elapsed:?}"),
            JobOutcome::Failed(err) => error!("job {name} failed after {elapsed:?}: {err}"),
            JobOutcome::Panicked(msg) => error!("job {name} panicked after {elapsed:?}: {msg}"),
            JobOutcome::TimedOut(deadline) => {
                warn!(
                    "job {name} timed out after {}s, notifying via {}",
                    deadline.as_secs(),
                    self.notifier.id()
                );
                self.notifier
                    .notify(&format!(
                        "Task {name} exceeded the {}s timeout and was abandoned (see logs).",
                        deadline.as_secs()
                    ))
                    .await;
            }
        }

        if let Some(tx) = &self.report_tx {
            let _ = tx.send(JobReport {
                name,
                outcome,
                elapsed,
            });
        }
    }
}
