use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::EncodeError;

/// Cooperative cancellation shared between the caller and a running encode.
/// Checked between text lines, structured records and packed chunks.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub(crate) fn check(&self) -> Result<(), EncodeError> {
        if self.is_cancelled() {
            Err(EncodeError::Cancelled)
        } else {
            Ok(())
        }
    }
}
