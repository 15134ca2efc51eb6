// src/engine/waiting.rs

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::debug;

use crate::engine::permit::PermitCheck;
use crate::types::UnitName;

/// A unit currently held at the permit checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitingEntry {
    pub since: Instant,
    /// When the host's own wait for this unit runs out.
    pub deadline: Instant,
    /// The check that held the unit most recently.
    pub blocked_on: PermitCheck,
}

/// Units held at the permit checkpoint, keyed by name.
///
/// Semantics:
/// - a unit is held at most once; a later permit for the same unit replaces
///   its entry (new deadline, new blocking check),
/// - entries leave the set when the unit is released by a sweep, allowed by a
///   later permit, removed, or found past its deadline.
///
/// Iteration is in name order so sweeps release units deterministically.
#[derive(Debug, Clone, Default)]
pub struct WaitingSet {
    entries: BTreeMap<UnitName, WaitingEntry>,
}

impl WaitingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, unit: &str) -> bool {
        self.entries.contains_key(unit)
    }

    pub fn get(&self, unit: &str) -> Option<&WaitingEntry> {
        self.entries.get(unit)
    }

    /// Hold `unit` until `deadline`, replacing any earlier hold.
    pub fn hold(&mut self, unit: &str, now: Instant, deadline: Instant, blocked_on: PermitCheck) {
        let since = self.entries.get(unit).map(|e| e.since).unwrap_or(now);
        self.entries.insert(
            unit.to_string(),
            WaitingEntry {
                since,
                deadline,
                blocked_on,
            },
        );
        debug!(unit = %unit, ?blocked_on, held = self.entries.len(), "unit held at permit");
    }

    /// Stop holding `unit`. Returns `true` if it was held.
    pub fn forget(&mut self, unit: &str) -> bool {
        self.entries.remove(unit).is_some()
    }

    /// Snapshot of held unit names, in name order.
    pub fn names(&self) -> Vec<UnitName> {
        self.entries.keys().cloned().collect()
    }
}
