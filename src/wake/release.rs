// src/wake/release.rs

//! Pluggable release callback.
//!
//! The runtime hands units released by a sweep to a `ReleaseBackend` instead
//! of talking to the external scheduler directly. Production hosts usually
//! use [`ChannelReleaseBackend`] and unblock the unit on the receiving end;
//! tests can provide their own backend that records releases.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;
use tracing::info;

use crate::errors::{Error, Result};
use crate::types::UnitName;

/// Trait abstracting how released units are handed back to the host.
pub trait ReleaseBackend: Send {
    /// Release the given units, which were previously told to wait.
    ///
    /// Called outside the controller lock.
    fn release_units(
        &mut self,
        units: Vec<UnitName>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Forwards released unit names over an mpsc channel.
pub struct ChannelReleaseBackend {
    tx: mpsc::Sender<UnitName>,
}

impl ChannelReleaseBackend {
    pub fn new(tx: mpsc::Sender<UnitName>) -> Self {
        Self { tx }
    }

    /// Create a backend together with the receiver the host listens on.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<UnitName>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

impl ReleaseBackend for ChannelReleaseBackend {
    fn release_units(
        &mut self,
        units: Vec<UnitName>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        // Clone the sender so the future doesn't borrow `self` across `await`.
        let tx = self.tx.clone();

        Box::pin(async move {
            for unit in units {
                info!(unit = %unit, "releasing waiting unit");
                tx.send(unit).await.map_err(Error::from)?;
            }
            Ok(())
        })
    }
}
