//! Unbounded FIFO between producers and the single worker.

use crate::queue::job::Job;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Producer handle. Cheap to clone; every clone feeds the same queue.
#[derive(Clone)]
pub struct TaskQueue {
    tx: mpsc::UnboundedSender<Job>,
    depth: Arc<AtomicUsize>,
}

/// Consumer half. Not cloneable, so a job can reach only one consumer.
pub struct JobReceiver {
    rx: mpsc::UnboundedReceiver<Job>,
    depth: Arc<AtomicUsize>,
}

/// Create a connected queue/receiver pair.
pub fn task_queue() -> (TaskQueue, JobReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let depth = Arc::new(AtomicUsize::new(0));
    (
        TaskQueue {
            tx,
            depth: Arc::clone(&depth),
        },
        JobReceiver { rx, depth },
    )
}

impl TaskQueue {
    /// Append a job to the tail. Never blocks.
    ///
    /// If the worker is gone the job is dropped with a warning; producers are
    /// fire-and-forget and never see an error.
    pub fn enqueue(&self, job: Job) {
        let name = job.name().to_owned();
        self.depth.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(job).is_err() {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            warn!("queue closed, dropping job {name}");
            return;
        }
        debug!("enqueued job {name} (depth {})", self.len());
    }

    /// Jobs waiting to be picked up.
    pub fn len(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl JobReceiver {
    /// Wait up to `wait` for the next job.
    ///
    /// Returns `None` when nothing arrived in time. Once every producer is
    /// dropped and the queue is drained this still waits out `wait` before
    /// returning `None`, so a polling caller never spins.
    pub async fn dequeue(&mut self, wait: Duration) -> Option<Job> {
        match tokio::time::timeout(wait, self.rx.recv()).await {
            Ok(Some(job)) => {
                self.depth.fetch_sub(1, Ordering::SeqCst);
                Some(job)
            }
            Ok(None) => {
                tokio::time::sleep(wait).await;
                None
            }
            Err(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
