use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::ExportError;

/// Cooperative cancellation flag shared between the caller and a running
/// layout or write operation. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once [`CancellationToken::cancel`] has been called.
    pub fn check(&self) -> Result<(), ExportError> {
        if self.is_cancelled() {
            return Err(ExportError::Cancelled);
        }
        Ok(())
    }
}
