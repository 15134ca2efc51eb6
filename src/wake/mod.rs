// src/wake/mod.rs

//! Outbound side of the permit protocol.
//!
//! - [`release`] provides the `ReleaseBackend` trait through which released
//!   units are handed back to the host.
//! - [`timer`] provides the `SweepTimer` trait used to arm delayed wake
//!   sweeps, and a Tokio implementation that posts back into the runtime.

pub mod release;
pub mod timer;

pub use release::{ChannelReleaseBackend, ReleaseBackend};
pub use timer::{SweepTimer, TokioSweepTimer};
