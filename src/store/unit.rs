// src/store/unit.rs

//! Unit records and cached dependency snapshots.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::types::{GroupName, UnitName, UnitStatus};

/// Declaration of a unit as handed to [`DependencyStore::register`].
///
/// [`DependencyStore::register`]: crate::store::DependencyStore::register
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSpec {
    pub name: UnitName,
    pub group: GroupName,
    /// Units that must reach `Completed` before this one is released.
    pub completion_deps: Vec<UnitName>,
    /// Units that must be (and stay) `Running` before this one is released.
    pub running_deps: Vec<UnitName>,
    /// Admission cycles to reject deliberately before evaluating dependencies.
    pub skip_count: u32,
}

impl UnitSpec {
    pub fn new(name: impl Into<UnitName>, group: impl Into<GroupName>) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
            completion_deps: Vec::new(),
            running_deps: Vec::new(),
            skip_count: 0,
        }
    }
}

/// A unit's cached view of one of its dependencies.
///
/// This is pushed by propagation, never looked up live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyState {
    pub status: UnitStatus,
    /// `None` until the dependency has been observed at least once.
    pub updated_at: Option<Instant>,
}

impl DependencyState {
    pub fn undefined() -> Self {
        Self {
            status: UnitStatus::Undefined,
            updated_at: None,
        }
    }

    pub fn new(status: UnitStatus, updated_at: Instant) -> Self {
        Self {
            status,
            updated_at: Some(updated_at),
        }
    }

    /// Whether the dependency is `Running` and has been for at least `min`.
    pub fn running_for_at_least(&self, min: Duration, now: Instant) -> bool {
        match (self.status, self.updated_at) {
            (UnitStatus::Running, Some(since)) => now.saturating_duration_since(since) >= min,
            _ => false,
        }
    }
}

/// Canonical state of one registered unit.
#[derive(Debug, Clone)]
pub struct UnitRecord {
    pub name: UnitName,
    pub group: GroupName,
    pub status: UnitStatus,
    pub status_updated_at: Instant,
    pub skip_count: u32,
    pub completion_deps: BTreeMap<UnitName, DependencyState>,
    pub running_deps: BTreeMap<UnitName, DependencyState>,
}

impl UnitRecord {
    /// Current snapshot of this unit, as a dependent would cache it.
    pub fn as_dependency_state(&self) -> DependencyState {
        DependencyState::new(self.status, self.status_updated_at)
    }
}
