// src/engine/sweep.rs

//! Wake sweep: re-check every held unit and release the ones that now pass.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::ControllerConfig;
use crate::engine::permit::{check_permit, PermitCheck};
use crate::engine::waiting::WaitingSet;
use crate::store::DependencyStore;
use crate::types::{SweepReason, UnitName};

/// Re-evaluate checks A and B for every held unit.
///
/// Returns the units that passed, which are no longer held. Units that were
/// removed from the store, or whose wait has already run out on the host
/// side, are dropped without being released. The one-shot timer armed for a
/// hold fires at its deadline and still gets to re-check that hold.
pub fn sweep_waiting(
    store: &DependencyStore,
    waiting: &mut WaitingSet,
    config: &ControllerConfig,
    now: Instant,
    reason: &SweepReason,
) -> Vec<UnitName> {
    if waiting.is_empty() {
        debug!(?reason, "sweep found no held units");
        return Vec::new();
    }

    let view = store.view();
    let mut released = Vec::new();

    for unit in waiting.names() {
        if !store.contains(&unit) {
            debug!(unit = %unit, "held unit no longer registered; dropping hold");
            waiting.forget(&unit);
            continue;
        }

        if let Some(entry) = waiting.get(&unit) {
            if now > entry.deadline && !reason.is_permit_timer_for(&unit) {
                debug!(unit = %unit, "wait window elapsed; dropping hold");
                waiting.forget(&unit);
                continue;
            }
        }

        match check_permit(&view, &unit, config, now) {
            Ok(PermitCheck::Ready) => {
                waiting.forget(&unit);
                released.push(unit);
            }
            Ok(check) => {
                debug!(unit = %unit, ?check, "held unit still blocked");
            }
            Err(err) => {
                warn!(unit = %unit, error = %err, "sweep could not evaluate held unit");
            }
        }
    }

    if !released.is_empty() {
        info!(?reason, units = ?released, "sweep releasing units");
    }

    released
}
