// src/store/state_store.rs

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use tracing::{debug, warn};

use crate::errors::{DepGateError, Result};
use crate::store::predicates::DependencyView;
use crate::store::propagation::Propagator;
use crate::store::unit::{DependencyState, UnitRecord, UnitSpec};
use crate::types::{UnitName, UnitStatus};

/// Result of [`DependencyStore::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The unit was new and starts out `Pending`.
    Created,
    /// The unit was already known; only its dependency maps were rebuilt.
    Redeclared,
}

/// Result of [`DependencyStore::set_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The status changed and was pushed to `propagated` dependents.
    Applied {
        previous: UnitStatus,
        propagated: usize,
    },
    /// The unit already had this status; nothing was touched.
    Unchanged,
    /// No such unit is registered; nothing was touched.
    UnknownUnit,
}

/// Canonical unit map plus cached dependency snapshots.
///
/// The store itself is not synchronized; the controller owns it behind a
/// single lock.
#[derive(Debug, Default)]
pub struct DependencyStore {
    units: HashMap<UnitName, UnitRecord>,
}

impl DependencyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent upsert.
    ///
    /// A new unit starts `Pending` at `now`. An existing unit keeps its
    /// group, status, timestamp and skip count; only its dependency maps are
    /// rebuilt from the current statuses of the named dependencies.
    pub fn register(&mut self, spec: &UnitSpec, now: Instant) -> Registration {
        let running_deps = snapshot_deps(&spec.running_deps, &self.units);
        let completion_deps = snapshot_deps(&spec.completion_deps, &self.units);

        if let Some(existing) = self.units.get_mut(&spec.name) {
            if existing.group != spec.group {
                warn!(
                    unit = %spec.name,
                    group = %existing.group,
                    declared_group = %spec.group,
                    "re-registration with a different group; keeping the original"
                );
            }
            existing.running_deps = running_deps;
            existing.completion_deps = completion_deps;
            debug!(unit = %spec.name, "unit re-declared; dependency maps rebuilt");
            return Registration::Redeclared;
        }

        debug!(
            unit = %spec.name,
            group = %spec.group,
            running_deps = ?spec.running_deps,
            completion_deps = ?spec.completion_deps,
            skip_count = spec.skip_count,
            "registering unit"
        );

        self.units.insert(
            spec.name.clone(),
            UnitRecord {
                name: spec.name.clone(),
                group: spec.group.clone(),
                status: UnitStatus::Pending,
                status_updated_at: now,
                skip_count: spec.skip_count,
                completion_deps,
                running_deps,
            },
        );
        Registration::Created
    }

    /// Delete a unit. Dependents keep their (now stale) snapshots.
    pub fn remove(&mut self, app: &str) -> Option<UnitRecord> {
        let removed = self.units.remove(app);
        if removed.is_some() {
            debug!(unit = %app, "unit removed");
        }
        removed
    }

    /// Change a unit's own status and push it to its same-group dependents.
    pub fn set_status(&mut self, app: &str, status: UnitStatus, now: Instant) -> Transition {
        let Some(unit) = self.units.get_mut(app) else {
            return Transition::UnknownUnit;
        };

        if unit.status == status {
            debug!(unit = %app, %status, "status unchanged; ignoring transition");
            return Transition::Unchanged;
        }

        let previous = unit.status;
        unit.status = status;
        unit.status_updated_at = now;
        let group = unit.group.clone();

        let propagated =
            Propagator::new(&mut self.units).propagate(app, &group, DependencyState::new(status, now));

        debug!(
            unit = %app,
            %group,
            from = %previous,
            to = %status,
            propagated,
            "status transition applied"
        );

        Transition::Applied {
            previous,
            propagated,
        }
    }

    /// Consume one deliberate skip.
    ///
    /// Returns the remaining count if a skip was consumed, `None` if the unit
    /// has no skips left.
    pub fn take_skip(&mut self, app: &str) -> Result<Option<u32>> {
        let unit = self
            .units
            .get_mut(app)
            .ok_or_else(|| DepGateError::UnknownUnit(app.to_string()))?;

        if unit.skip_count == 0 {
            return Ok(None);
        }

        unit.skip_count -= 1;
        Ok(Some(unit.skip_count))
    }

    pub fn get(&self, app: &str) -> Option<&UnitRecord> {
        self.units.get(app)
    }

    pub fn contains(&self, app: &str) -> bool {
        self.units.contains_key(app)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Read-only predicate view over the cached snapshots.
    pub fn view(&self) -> DependencyView<'_> {
        DependencyView::new(&self.units)
    }
}

fn snapshot_deps(
    names: &[UnitName],
    units: &HashMap<UnitName, UnitRecord>,
) -> BTreeMap<UnitName, DependencyState> {
    names
        .iter()
        .map(|name| {
            let state = units
                .get(name)
                .map(UnitRecord::as_dependency_state)
                .unwrap_or_else(DependencyState::undefined);
            (name.clone(), state)
        })
        .collect()
}
