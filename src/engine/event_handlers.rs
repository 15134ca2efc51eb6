// src/engine/event_handlers.rs

//! Lifecycle event handling logic for the core controller.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::ControllerConfig;
use crate::engine::sweep::sweep_waiting;
use crate::engine::waiting::WaitingSet;
use crate::store::{DependencyStore, Transition, UnitSpec};
use crate::types::{SweepReason, UnitName, UnitStatus};

/// Command produced by the pure core, to be executed outside the lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Arm a one-shot timer that requests a wake sweep after `delay`.
    ScheduleSweep { delay: Duration, reason: SweepReason },
    /// Hand these units to the release callback.
    Release(Vec<UnitName>),
}

/// Commands returned by the core after handling a single event or request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
}

impl CoreStep {
    /// All units released by this step.
    pub fn released(&self) -> Vec<UnitName> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                CoreCommand::Release(units) => Some(units.iter().cloned()),
                CoreCommand::ScheduleSweep { .. } => None,
            })
            .flatten()
            .collect()
    }

    /// Delays of all sweeps scheduled by this step, in order.
    pub fn sweep_delays(&self) -> Vec<Duration> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                CoreCommand::ScheduleSweep { delay, .. } => Some(*delay),
                CoreCommand::Release(_) => None,
            })
            .collect()
    }
}

/// Handle the first sighting or re-declaration of a unit.
///
/// The unit is registered, then its observed status is applied as a
/// transition. A unit first seen already `Running` (for example after a
/// controller restart) therefore propagates and wakes dependents at once.
pub fn handle_unit_observed(
    store: &mut DependencyStore,
    waiting: &mut WaitingSet,
    config: &ControllerConfig,
    spec: &UnitSpec,
    status: UnitStatus,
    now: Instant,
) -> CoreStep {
    store.register(spec, now);
    handle_unit_transitioned(store, waiting, config, &spec.name, status, now)
}

/// Handle a unit's own status change.
///
/// - Redundant transitions and transitions of unknown units do nothing.
/// - A transition to `Completed` sweeps held units immediately.
/// - A transition to `Running` or `Completed` schedules the delayed sweep
///   cascade, one sweep per configured offset.
pub fn handle_unit_transitioned(
    store: &mut DependencyStore,
    waiting: &mut WaitingSet,
    config: &ControllerConfig,
    unit: &str,
    status: UnitStatus,
    now: Instant,
) -> CoreStep {
    match store.set_status(unit, status, now) {
        Transition::UnknownUnit => {
            warn!(unit = %unit, %status, "transition for unregistered unit; ignoring");
            CoreStep::default()
        }
        Transition::Unchanged => CoreStep::default(),
        Transition::Applied { .. } => {
            let mut commands = Vec::new();

            if status == UnitStatus::Completed {
                let reason = SweepReason::Completion {
                    unit: unit.to_string(),
                };
                let released = sweep_waiting(store, waiting, config, now, &reason);
                if !released.is_empty() {
                    commands.push(CoreCommand::Release(released));
                }
            }

            if status.wakes_dependents() {
                for offset in &config.sweep_offsets {
                    commands.push(CoreCommand::ScheduleSweep {
                        delay: *offset,
                        reason: SweepReason::Cascade {
                            unit: unit.to_string(),
                            status,
                            offset: *offset,
                        },
                    });
                }
                debug!(
                    unit = %unit,
                    %status,
                    sweeps = config.sweep_offsets.len(),
                    "scheduled wake sweep cascade"
                );
            }

            CoreStep { commands }
        }
    }
}

/// Handle removal of a unit. Dependents keep stale snapshots.
pub fn handle_unit_removed(
    store: &mut DependencyStore,
    waiting: &mut WaitingSet,
    unit: &str,
) -> CoreStep {
    if store.remove(unit).is_none() {
        debug!(unit = %unit, "removal of unregistered unit; ignoring");
    }
    if waiting.forget(unit) {
        debug!(unit = %unit, "dropped permit hold for removed unit");
    }
    CoreStep::default()
}
