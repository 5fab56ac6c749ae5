use crate::AgentError;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

/// Cooperative cancellation signal shared between a caller and a run.
///
/// A run checks it between events and races it against the in-flight model
/// call; a cancelled run stops without emitting a partial event.
#[derive(Clone, Debug, Default)]
pub struct RunCancellation {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl RunCancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<(), AgentError> {
        if self.is_cancelled() {
            return Err(AgentError::Cancelled);
        }
        Ok(())
    }

    /// Drives `future` unless cancellation arrives first.
    pub async fn race<F: Future>(&self, future: F) -> Result<F::Output, AgentError> {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        self.check()?;

        tokio::pin!(future);
        tokio::select! {
            output = &mut future => Ok(output),
            _ = &mut notified => Err(AgentError::Cancelled),
        }
    }
}
