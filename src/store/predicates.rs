// src/store/predicates.rs

//! Read-only dependency predicates over cached snapshots.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use crate::errors::{DepGateError, Result};
use crate::store::unit::{DependencyState, UnitRecord};
use crate::types::{UnitName, UnitStatus};

/// A read-only view of the store for evaluating dependency predicates.
///
/// Every predicate reads the *owning* unit's cached snapshots only; live
/// statuses of other units are consulted solely to walk to the next hop in
/// [`running_deps_live_within_three_hops`](Self::running_deps_live_within_three_hops).
pub struct DependencyView<'a> {
    units: &'a HashMap<UnitName, UnitRecord>,
}

impl<'a> DependencyView<'a> {
    pub fn new(units: &'a HashMap<UnitName, UnitRecord>) -> Self {
        Self { units }
    }

    fn record(&self, app: &str) -> Result<&'a UnitRecord> {
        self.units
            .get(app)
            .ok_or_else(|| DepGateError::UnknownUnit(app.to_string()))
    }

    pub fn completion_deps_completed(&self, app: &str) -> Result<bool> {
        let unit = self.record(app)?;
        Ok(all_deps(&unit.completion_deps, |s| s == UnitStatus::Completed))
    }

    pub fn completion_deps_running_or_completed(&self, app: &str) -> Result<bool> {
        let unit = self.record(app)?;
        Ok(all_deps(&unit.completion_deps, UnitStatus::is_running_or_completed))
    }

    pub fn running_deps_running(&self, app: &str) -> Result<bool> {
        let unit = self.record(app)?;
        Ok(all_deps(&unit.running_deps, |s| s == UnitStatus::Running))
    }

    /// All running-deps are `Running` and have held that status for `healthy`.
    pub fn running_deps_running_since(
        &self,
        app: &str,
        healthy: Duration,
        now: Instant,
    ) -> Result<bool> {
        let unit = self.record(app)?;
        Ok(unit
            .running_deps
            .values()
            .all(|dep| dep.running_for_at_least(healthy, now)))
    }

    pub fn running_deps_pending_or_running(&self, app: &str) -> Result<bool> {
        let unit = self.record(app)?;
        Ok(all_deps(&unit.running_deps, UnitStatus::is_pending_or_running))
    }

    /// Bounded transitive liveness check over running-dependencies.
    ///
    /// Hop 1 is `app`'s own running-deps; hop 2 is each of those units'
    /// running-deps; hop 3 is the running-deps of every hop-2 unit. Every
    /// entry at every hop must be `Pending` or `Running`, each judged on its
    /// own cached status. A hop whose unit is no longer registered fails.
    pub fn running_deps_live_within_three_hops(&self, app: &str) -> Result<bool> {
        let unit = self.record(app)?;

        for (first_name, first) in &unit.running_deps {
            if !first.status.is_pending_or_running() {
                return Ok(false);
            }

            let Some(first_unit) = self.units.get(first_name) else {
                return Ok(false);
            };

            for (second_name, second) in &first_unit.running_deps {
                if !second.status.is_pending_or_running() {
                    return Ok(false);
                }

                let Some(second_unit) = self.units.get(second_name) else {
                    return Ok(false);
                };

                if !all_deps(&second_unit.running_deps, UnitStatus::is_pending_or_running) {
                    return Ok(false);
                }
            }
        }

        Ok(true)
    }
}

fn all_deps(
    deps: &BTreeMap<UnitName, DependencyState>,
    pred: impl Fn(UnitStatus) -> bool,
) -> bool {
    deps.values().all(|dep| pred(dep.status))
}
