// src/clock/mod.rs

//! Monotonic time source for the controller.
//!
//! Everything in the core that needs "now" (status timestamps, stability
//! windows, wait deadlines) reads it through a [`Clock`], so tests can drive
//! time explicitly with [`ManualClock`] or through Tokio's paused clock with
//! [`TokioClock`].

use std::fmt::Debug;
use std::time::Instant;

pub mod manual;

pub use manual::ManualClock;

/// Abstract monotonic clock.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Instant;
}

/// Clock that follows Tokio's timer driver.
///
/// Under `tokio::time::pause()` this advances together with the timers that
/// drive wake sweeps, which keeps stability windows and sweep offsets on the
/// same time line.
#[derive(Debug, Clone, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}
