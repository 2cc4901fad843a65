//! Deadline enforcement for a single job.
//!
//! The job runs on its own tokio task. If the deadline passes first the
//! supervisor cancels the job's [`JobContext`] token and returns without
//! waiting: gateway calls inside the job abort on the token, but any other
//! work the job is doing keeps running in the background until it finishes
//! on its own. A timeout releases the worker; it is not a guaranteed kill.

use crate::queue::job::{Job, JobContext};
use std::any::Any;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How a supervised job ended, from the worker's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Finished with `Ok(())` before the deadline.
    Completed,
    /// Returned an error before the deadline.
    Failed(String),
    /// Panicked before the deadline.
    Panicked(String),
    /// Still running when the deadline passed.
    TimedOut(Duration),
}

impl JobOutcome {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut(_))
    }
}

/// Runs jobs with a fixed wall-clock deadline.
#[derive(Debug, Clone)]
pub struct TimeoutSupervisor {
    deadline: Duration,
    parent: CancellationToken,
}

impl TimeoutSupervisor {
    pub fn new(deadline: Duration) -> Self {
        Self {
            deadline,
            parent: CancellationToken::new(),
        }
    }

    /// Cancelling `parent` also cancels whichever job is running.
    pub fn with_parent(mut self, parent: CancellationToken) -> Self {
        self.parent = parent;
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Execute `job`, waiting at most the deadline for it.
    pub async fn run(&self, job: Job) -> JobOutcome {
        let cancel = self.parent.child_token();
        let ctx = JobContext::new(job.name(), cancel.clone());
        let mut handle = tokio::spawn(job.start(ctx));

        match tokio::time::timeout(self.deadline, &mut handle).await {
            Ok(Ok(Ok(()))) => JobOutcome::Completed,
            Ok(Ok(Err(err))) => JobOutcome::Failed(err.to_string()),
            Ok(Err(join_err)) if join_err.is_panic() => {
                JobOutcome::Panicked(panic_message(join_err.into_panic()))
            }
            Ok(Err(join_err)) => JobOutcome::Failed(format!("job aborted: {join_err}")),
            Err(_) => {
                cancel.cancel();
                // Dropping the handle detaches the task; it is not aborted.
                drop(handle);
                JobOutcome::TimedOut(self.deadline)
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
