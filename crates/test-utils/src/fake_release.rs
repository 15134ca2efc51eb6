use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use depgate::errors::Result;
use depgate::types::UnitName;
use depgate::wake::ReleaseBackend;

/// A fake release backend that records every released unit, in order.
#[derive(Clone, Default)]
pub struct RecordingRelease {
    released: Arc<Mutex<Vec<UnitName>>>,
}

impl RecordingRelease {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything released so far.
    pub fn released(&self) -> Vec<UnitName> {
        self.released.lock().unwrap().clone()
    }
}

impl ReleaseBackend for RecordingRelease {
    fn release_units(
        &mut self,
        units: Vec<UnitName>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let released = Arc::clone(&self.released);

        Box::pin(async move {
            tracing::debug!(?units, "recording released units");
            released
                .lock()
                .map_err(|e| anyhow::anyhow!("release log poisoned: {e}"))?
                .extend(units);
            Ok(())
        })
    }
}
