// src/engine/controller.rs

//! Shared, lock-protected handle around the core controller.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::engine::core::CoreController;
use crate::engine::event_handlers::{CoreCommand, CoreStep};
use crate::engine::UnitEvent;
use crate::errors::Result;
use crate::store::UnitSpec;
use crate::types::{Admission, PermitDecision, SweepReason, UnitName};
use crate::wake::SweepTimer;

/// Cloneable handle to the controller state.
///
/// All store mutations and predicate reads happen under one mutex. Commands
/// produced by the core are executed after the guard is dropped: sweep
/// timers are armed through the [`SweepTimer`], and released units are
/// returned to the caller, which owns the release callback.
#[derive(Clone)]
pub struct Controller {
    core: Arc<Mutex<CoreController>>,
    timer: Arc<dyn SweepTimer>,
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("timer", &self.timer)
            .finish_non_exhaustive()
    }
}

impl Controller {
    pub fn new(core: CoreController, timer: Arc<dyn SweepTimer>) -> Self {
        Self {
            core: Arc::new(Mutex::new(core)),
            timer,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CoreController> {
        // The core never panics while holding the guard with a half-applied
        // mutation, so a poisoned lock still holds consistent state.
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a lifecycle event. Returns units released as a consequence.
    pub fn apply(&self, event: UnitEvent) -> Vec<UnitName> {
        let step = self.lock().step(event);
        self.execute(step)
    }

    /// Admission gate with lazy registration.
    pub fn evaluate(&self, spec: &UnitSpec) -> Result<Admission> {
        self.lock().evaluate(spec)
    }

    /// Admission gate for an already registered unit.
    pub fn admit(&self, app: &str) -> Result<Admission> {
        self.lock().admit(app)
    }

    /// Permit checkpoint; arms the sweep timer when check A fails.
    pub fn permit(&self, app: &str) -> Result<PermitDecision> {
        let (decision, step) = self.lock().permit(app)?;
        let released = self.execute(step);
        debug_assert!(released.is_empty());
        Ok(decision)
    }

    /// Run a wake sweep. Returns the released units.
    pub fn sweep(&self, reason: &SweepReason) -> Vec<UnitName> {
        let step = self.lock().sweep(reason);
        self.execute(step)
    }

    /// Number of units currently held at the permit checkpoint.
    pub fn waiting_count(&self) -> usize {
        self.lock().waiting().len()
    }

    /// Run `f` against the core under the lock (diagnostics and tests).
    pub fn inspect<R>(&self, f: impl FnOnce(&CoreController) -> R) -> R {
        f(&self.lock())
    }

    fn execute(&self, step: CoreStep) -> Vec<UnitName> {
        let mut released = Vec::new();
        for command in step.commands {
            match command {
                CoreCommand::ScheduleSweep { delay, reason } => {
                    debug!(?delay, ?reason, "arming sweep timer");
                    self.timer.schedule(delay, reason);
                }
                CoreCommand::Release(units) => released.extend(units),
            }
        }
        released
    }
}
