//! Mock wake signal for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::dispatch::WakeSignal;
use crate::transcode::TranscodeError;

/// Mock implementation of the WakeSignal trait that counts wake-ups.
#[derive(Debug, Default)]
pub struct MockWakeSignal {
    wakes: AtomicUsize,
    fail: AtomicBool,
}

impl MockWakeSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of wake attempts, including failed ones.
    pub fn wake_count(&self) -> usize {
        self.wakes.load(Ordering::SeqCst)
    }

    /// Make wake attempts fail.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl WakeSignal for MockWakeSignal {
    async fn wake(&self) -> Result<(), TranscodeError> {
        self.wakes.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(TranscodeError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "broadcast not permitted",
            )));
        }
        Ok(())
    }
}
