// src/adapter/mod.rs

//! Inbound side: turning an external watch feed into lifecycle events.
//!
//! - [`labels`] decodes unit declarations from label maps.
//! - [`phase`] maps observed phases to [`UnitStatus`](crate::types::UnitStatus).
//! - [`feed`] translates watch notifications and forwards them to the runtime.

pub mod feed;
pub mod labels;
pub mod phase;

pub use feed::{spawn_adapter, translate, ObservedUnit, WatchEvent};
pub use labels::unit_spec_from_labels;
pub use phase::status_from_phase;
