use std::fmt;
use std::time::Duration;

/// Canonical unit identity (the `app` label).
pub type UnitName = String;

/// Locality key bounding status propagation (the `topology` label).
pub type GroupName = String;

/// Lifecycle status of a unit, as observed from the watch feed.
///
/// `Undefined` doubles as the status of a dependency that has never been
/// observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UnitStatus {
    Pending,
    Running,
    Completed,
    Error,
    Terminating,
    #[default]
    Undefined,
}

impl UnitStatus {
    pub fn is_pending_or_running(self) -> bool {
        matches!(self, UnitStatus::Pending | UnitStatus::Running)
    }

    pub fn is_running_or_completed(self) -> bool {
        matches!(self, UnitStatus::Running | UnitStatus::Completed)
    }

    /// Whether a transition into this status schedules the delayed sweep cascade.
    pub fn wakes_dependents(self) -> bool {
        match self {
            UnitStatus::Running | UnitStatus::Completed => true,
            UnitStatus::Pending
            | UnitStatus::Error
            | UnitStatus::Terminating
            | UnitStatus::Undefined => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UnitStatus::Pending => "pending",
            UnitStatus::Running => "running",
            UnitStatus::Completed => "completed",
            UnitStatus::Error => "error",
            UnitStatus::Terminating => "terminating",
            UnitStatus::Undefined => "undefined",
        }
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the admission gate turned a unit away for this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The unit still has deliberate skips left; `remaining` is the count
    /// after this rejection.
    Skipped { remaining: u32 },
    /// A direct running-dependency is neither pending nor running.
    RunningDepsNotLive,
    /// A running-dependency within three hops is neither pending nor running.
    TransitiveRunningDepsNotLive,
    /// A completion-dependency has not started yet.
    CompletionDepsNotStarted,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Skipped { remaining } => {
                write!(f, "skipped ({remaining} skips left)")
            }
            RejectReason::RunningDepsNotLive => f.write_str("running dependencies not live"),
            RejectReason::TransitiveRunningDepsNotLive => {
                f.write_str("transitive running dependencies not live")
            }
            RejectReason::CompletionDepsNotStarted => {
                f.write_str("completion dependencies not started")
            }
        }
    }
}

/// Outcome of the admission gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accept,
    Reject(RejectReason),
}

impl Admission {
    pub fn is_accept(&self) -> bool {
        matches!(self, Admission::Accept)
    }
}

/// Outcome of the permit checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermitDecision {
    /// Proceed to binding now.
    Allow,
    /// Hold the unit for at most this long; a sweep may release it earlier.
    Wait(Duration),
}

/// What caused a wake sweep, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepReason {
    /// One-shot timer armed when `unit` failed the running-dependency check.
    PermitTimer { unit: UnitName },
    /// Delayed cascade after `unit` transitioned to `status`.
    Cascade {
        unit: UnitName,
        status: UnitStatus,
        offset: Duration,
    },
    /// Immediate sweep after `unit` completed.
    Completion { unit: UnitName },
    /// Requested explicitly by the host.
    Manual,
}

impl SweepReason {
    /// Whether this is the one-shot timer armed when `unit` was held.
    pub fn is_permit_timer_for(&self, unit: &str) -> bool {
        matches!(self, SweepReason::PermitTimer { unit: u } if u == unit)
    }
}
