// src/wake/timer.rs

//! One-shot sweep timers.

use std::fmt::Debug;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::engine::RuntimeEvent;
use crate::types::SweepReason;

/// Arms fire-and-forget timers that request a wake sweep.
///
/// Implementations must not block and must not touch controller state
/// themselves; a fired timer only posts a sweep request back into the
/// controller's event loop.
pub trait SweepTimer: Send + Sync + Debug {
    fn schedule(&self, delay: Duration, reason: SweepReason);
}

/// Timer backed by `tokio::time::sleep`, posting `RuntimeEvent::SweepDue`.
#[derive(Debug, Clone)]
pub struct TokioSweepTimer {
    tx: mpsc::Sender<RuntimeEvent>,
}

impl TokioSweepTimer {
    pub fn new(tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self { tx }
    }
}

impl SweepTimer for TokioSweepTimer {
    fn schedule(&self, delay: Duration, reason: SweepReason) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(?reason, "no Tokio runtime available; sweep timer not armed");
            return;
        };

        let tx = self.tx.clone();
        handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(RuntimeEvent::SweepDue { reason }).await.is_err() {
                debug!("runtime gone before sweep timer fired");
            }
        });
    }
}
