use std::sync::{Arc, Mutex};
use std::time::Duration;

use depgate::types::SweepReason;
use depgate::wake::SweepTimer;

/// A sweep timer that never fires; it only records what was armed.
#[derive(Debug, Clone, Default)]
pub struct RecordingTimer {
    armed: Arc<Mutex<Vec<(Duration, SweepReason)>>>,
}

impl RecordingTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn armed(&self) -> Vec<(Duration, SweepReason)> {
        self.armed.lock().unwrap().clone()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.armed().into_iter().map(|(d, _)| d).collect()
    }

    pub fn clear(&self) {
        self.armed.lock().unwrap().clear();
    }
}

impl SweepTimer for RecordingTimer {
    fn schedule(&self, delay: Duration, reason: SweepReason) {
        tracing::debug!(?delay, ?reason, "recording armed sweep");
        self.armed.lock().unwrap().push((delay, reason));
    }
}
