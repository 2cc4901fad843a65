//! Named, zero-argument units of work.

use futures_util::future::BoxFuture;
use std::fmt;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Boxed future produced by a job when it starts.
pub type JobFuture = BoxFuture<'static, crate::Result<()>>;

type JobFn = Box<dyn FnOnce(JobContext) -> JobFuture + Send>;

/// Handed to a job when it starts executing.
///
/// The token is cancelled when the job overruns its deadline or the worker
/// shuts down. Gateway calls made with
/// [`GattoGateway::call_cancellable`](crate::gateway::GattoGateway::call_cancellable)
/// abort as soon as it fires; anything else the job awaits keeps running
/// unless the job checks [`JobContext::is_cancelled`] itself.
#[derive(Debug, Clone)]
pub struct JobContext {
    name: String,
    cancel: CancellationToken,
}

impl JobContext {
    pub fn new(name: impl Into<String>, cancel: CancellationToken) -> Self {
        Self {
            name: name.into(),
            cancel,
        }
    }

    /// A context whose token is never cancelled by a supervisor.
    pub fn detached(name: impl Into<String>) -> Self {
        Self::new(name, CancellationToken::new())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// A job waiting in the queue. Consumed exactly once when executed.
pub struct Job {
    name: String,
    run: JobFn,
}

impl Job {
    /// Wrap an async closure as a job.
    ///
    /// Everything the job needs must be captured by `f`; nothing is passed in
    /// at execution time except the [`JobContext`].
    pub fn new<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(JobContext) -> Fut + Send + 'static,
        Fut: Future<Output = crate::Result<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            run: Box::new(move |ctx| Box::pin(f(ctx))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start the job, producing its future.
    pub fn start(self, ctx: JobContext) -> JobFuture {
        (self.run)(ctx)
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job").field("name", &self.name).finish()
    }
}
