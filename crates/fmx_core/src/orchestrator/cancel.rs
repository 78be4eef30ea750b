//! Cooperative batch cancellation.
//!
//! Cancelling never stops the running encoder. The batch finishes the job in
//! progress and does not start the next one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::logging::BatchLog;

const CANCEL_MESSAGE: &str = "Batch canceled! The batch will stop after the current job is done.";

/// Handle for cancelling a running batch from another thread.
#[derive(Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
    log: Option<Arc<BatchLog>>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle that reports the first cancel request to `log`.
    pub fn with_log(log: Arc<BatchLog>) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            log: Some(log),
        }
    }

    /// Request cancellation. Only the first request is logged.
    pub fn cancel(&self) {
        if !self.flag.swap(true, Ordering::SeqCst) {
            tracing::info!("Batch cancellation requested");
            if let Some(log) = &self.log {
                log.info(CANCEL_MESSAGE);
            }
        }
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Clear the flag before a new batch.
    pub(crate) fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogConfig;

    #[test]
    fn only_first_cancel_is_logged() {
        let log = Arc::new(BatchLog::new(
            LogConfig {
                show_timestamps: false,
                ..LogConfig::default()
            },
            None,
        ));
        let handle = CancelHandle::with_log(Arc::clone(&log));
        let other = handle.clone();

        assert!(!handle.is_cancelled());
        other.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());
        assert_eq!(log.get_tail(), vec![CANCEL_MESSAGE.to_string()]);

        handle.reset();
        assert!(!other.is_cancelled());
    }
}
