// src/store/propagation.rs

//! Pushes a unit's own status change into its dependents' cached snapshots.

use std::collections::HashMap;

use tracing::trace;

use crate::store::unit::{DependencyState, UnitRecord};
use crate::types::UnitName;

/// Writes status changes into the dependency maps of same-group units.
pub struct Propagator<'a> {
    units: &'a mut HashMap<UnitName, UnitRecord>,
}

impl<'a> Propagator<'a> {
    pub fn new(units: &'a mut HashMap<UnitName, UnitRecord>) -> Self {
        Self { units }
    }

    /// Overwrite every cached entry for `source` held by a unit in `group`.
    ///
    /// Units outside `group` are never touched, even if they declare
    /// `source`. Returns the number of dependents updated.
    pub fn propagate(&mut self, source: &str, group: &str, state: DependencyState) -> usize {
        let mut updated = 0;

        for unit in self.units.values_mut() {
            if unit.group != group || unit.name == source {
                continue;
            }

            let mut touched = false;
            if let Some(entry) = unit.running_deps.get_mut(source) {
                *entry = state;
                touched = true;
            }
            if let Some(entry) = unit.completion_deps.get_mut(source) {
                *entry = state;
                touched = true;
            }

            if touched {
                trace!(
                    dependent = %unit.name,
                    dependency = %source,
                    status = %state.status,
                    "propagated dependency status"
                );
                updated += 1;
            }
        }

        updated
    }
}
