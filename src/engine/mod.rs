// src/engine/mod.rs

//! Admission and permit engine for depgate.
//!
//! This module ties together:
//! - the dependency state store (via [`core::CoreController`])
//! - the admission gate ([`admission`]) and permit checkpoint ([`permit`])
//! - the set of units held at the permit checkpoint ([`waiting`]) and the
//!   sweeps that release them ([`sweep`])
//! - the lifecycle event handlers that feed the store ([`event_handlers`])
//!
//! The pure core state machine lives in [`core`]. [`controller`] wraps it in
//! a single lock shared by host calls and timer-fired sweeps, and
//! [`runtime`] is the async shell that consumes lifecycle events.

use tokio::sync::oneshot;

use crate::errors::Result;
use crate::store::UnitSpec;
use crate::types::{Admission, PermitDecision, SweepReason, UnitName, UnitStatus};

/// Lifecycle notification consumed by the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitEvent {
    /// First sighting or re-declaration of a unit.
    Observed { spec: UnitSpec, status: UnitStatus },
    /// The unit's own status changed.
    Transitioned { unit: UnitName, status: UnitStatus },
    /// The unit is gone.
    Removed { unit: UnitName },
}

/// Events flowing into the runtime from the watch feed, timers and the host.
#[derive(Debug)]
pub enum RuntimeEvent {
    Unit(UnitEvent),
    /// A scheduled wake sweep is due.
    SweepDue { reason: SweepReason },
    /// Host request: register `spec` if needed and run the admission gate.
    Evaluate {
        spec: UnitSpec,
        reply: oneshot::Sender<Result<Admission>>,
    },
    /// Host request: run the admission gate for an already registered unit.
    Admit {
        unit: UnitName,
        reply: oneshot::Sender<Result<Admission>>,
    },
    /// Host request: run the permit checkpoint.
    Permit {
        unit: UnitName,
        reply: oneshot::Sender<Result<PermitDecision>>,
    },
    /// Replied to once every earlier event has been handled.
    Sync { reply: oneshot::Sender<usize> },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod admission;
pub mod controller;
pub mod core;
pub mod event_handlers;
pub mod permit;
pub mod runtime;
pub mod sweep;
pub mod waiting;

pub use admission::admit;
pub use controller::Controller;
pub use core::CoreController;
pub use event_handlers::{CoreCommand, CoreStep};
pub use permit::{check_permit, PermitCheck};
pub use runtime::{Runtime, RuntimeHandle};
pub use waiting::WaitingSet;
