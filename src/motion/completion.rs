//! Completion handles for motions.

use std::future::Future;

use tokio::task::JoinHandle;

/// A motion that may still be running.
///
/// Wraps an optional tokio task; `None` means the motion finished
/// synchronously.
#[derive(Debug, Default)]
pub struct Completion(Option<JoinHandle<()>>);

impl Completion {
    /// An already finished motion.
    #[must_use]
    pub fn ready() -> Self {
        Self(None)
    }

    /// Run a motion as a task on the current runtime.
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self(Some(tokio::spawn(future)))
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.0.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the motion. A cancelled or panicked task counts as finished.
    pub async fn wait(self) {
        if let Some(handle) = self.0 {
            if let Err(err) = handle.await {
                if !err.is_cancelled() {
                    tracing::warn!(%err, "motion task failed");
                }
            }
        }
    }

    /// Stop the motion early.
    pub fn abort(&self) {
        if let Some(handle) = &self.0 {
            handle.abort();
        }
    }
}
