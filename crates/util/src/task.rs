use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Owns a group of background tasks so that they can be shut down together.
///
/// Every task is spawned through a [`TaskTracker`] and is expected to observe a
/// child of the supervisor's [`CancellationToken`] to wind down on its own.
/// Cloning a supervisor yields a handle to the same group.
#[derive(Clone, Default)]
pub struct Supervisor {
    task_tracker: TaskTracker,
    cancellation_token: CancellationToken,
    registry: Arc<dashmap::DashSet<String>>,
    next_key: Arc<AtomicU64>,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `future` on the `tokio` runtime through the supervisor's
    /// [`TaskTracker`].
    ///
    /// The future is never aborted. It should observe a token obtained from
    /// [`child_token`](Self::child_token) and finish once it is cancelled.
    pub fn spawn<F>(&self, name: &str, future: F) -> tokio::task::JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let key = format!("{name}#{}", self.next_key.fetch_add(1, Ordering::Relaxed));
        self.registry.insert(key.clone());

        let registry = self.registry.clone();

        tracing::trace!(%key, "Spawning task");

        self.task_tracker.spawn(async move {
            let output = future.await;

            registry.remove(&key);
            tracing::trace!(%key, "Task finished");

            output
        })
    }

    /// Returns a child token which is cancelled when the supervisor is
    /// closed.
    pub fn child_token(&self) -> CancellationToken {
        self.cancellation_token.child_token()
    }

    /// Close the task tracker and then **cancel all tracked futures**. See
    /// [`TaskTracker::close`] and [`CancellationToken::cancel`].
    pub fn close(&self) {
        self.task_tracker.close();
        self.cancellation_token.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.task_tracker.is_closed()
    }

    /// Wait until the supervisor is both closed and has no running tasks. See
    /// [`TaskTracker::wait`].
    pub async fn wait(&self) {
        self.task_tracker.wait().await;
    }

    /// Number of tasks which have not yet completed.
    pub fn len(&self) -> usize {
        self.task_tracker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.task_tracker.is_empty()
    }

    /// Names of the tasks which have not yet completed, in no particular
    /// order.
    pub fn running(&self) -> Vec<String> {
        self.registry.iter().map(|key| key.clone()).collect()
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("running", &self.registry.len())
            .field("closed", &self.is_closed())
            .field("cancelled", &self.cancellation_token.is_cancelled())
            .finish()
    }
}
