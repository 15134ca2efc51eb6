// src/adapter/phase.rs

//! Mapping from an observed phase to a [`UnitStatus`].

use crate::types::UnitStatus;

/// Map an observed `(phase, ready)` pair to a status.
///
/// A running unit that explicitly reports itself not ready is treated as
/// failed. Unknown phases map to `Undefined`.
pub fn status_from_phase(phase: &str, ready: Option<bool>) -> UnitStatus {
    match phase {
        "Pending" => UnitStatus::Pending,
        "Running" if ready == Some(false) => UnitStatus::Error,
        "Running" => UnitStatus::Running,
        "Succeeded" => UnitStatus::Completed,
        "Terminating" => UnitStatus::Terminating,
        "Error" => UnitStatus::Error,
        _ => UnitStatus::Undefined,
    }
}
