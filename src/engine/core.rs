// src/engine/core.rs

//! Pure core controller state machine.
//!
//! This module contains a synchronous, deterministic "core" that owns:
//! - the dependency state store
//! - the set of units held at the permit checkpoint
//! - the timing configuration and the clock
//!
//! Every operation returns a [`CoreStep`] describing what the outer layers
//! should do next (arm sweep timers, invoke the release callback). The core
//! has no channels, no Tokio types, and performs no IO, so it can be tested
//! with a [`ManualClock`](crate::clock::ManualClock) alone.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::clock::Clock;
use crate::config::ControllerConfig;
use crate::engine::admission::admit;
use crate::engine::event_handlers::{
    handle_unit_observed, handle_unit_removed, handle_unit_transitioned, CoreCommand, CoreStep,
};
use crate::engine::permit::{check_permit, PermitCheck};
use crate::engine::sweep::sweep_waiting;
use crate::engine::waiting::WaitingSet;
use crate::engine::UnitEvent;
use crate::errors::{DepGateError, Result};
use crate::store::{DependencyStore, UnitSpec};
use crate::types::{Admission, PermitDecision, SweepReason};

#[derive(Debug)]
pub struct CoreController {
    store: DependencyStore,
    waiting: WaitingSet,
    config: ControllerConfig,
    clock: Arc<dyn Clock>,
}

impl CoreController {
    pub fn new(config: ControllerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: DependencyStore::new(),
            waiting: WaitingSet::new(),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn store(&self) -> &DependencyStore {
        &self.store
    }

    pub fn waiting(&self) -> &WaitingSet {
        &self.waiting
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Handle a single lifecycle event.
    pub fn step(&mut self, event: UnitEvent) -> CoreStep {
        let now = self.clock.now();
        match event {
            UnitEvent::Observed { spec, status } => handle_unit_observed(
                &mut self.store,
                &mut self.waiting,
                &self.config,
                &spec,
                status,
                now,
            ),
            UnitEvent::Transitioned { unit, status } => handle_unit_transitioned(
                &mut self.store,
                &mut self.waiting,
                &self.config,
                &unit,
                status,
                now,
            ),
            UnitEvent::Removed { unit } => {
                handle_unit_removed(&mut self.store, &mut self.waiting, &unit)
            }
        }
    }

    /// Admission gate with lazy registration: `spec` is upserted first.
    pub fn evaluate(&mut self, spec: &UnitSpec) -> Result<Admission> {
        self.store.register(spec, self.clock.now());
        admit(&mut self.store, &spec.name)
    }

    /// Admission gate for an already registered unit.
    pub fn admit(&mut self, app: &str) -> Result<Admission> {
        admit(&mut self.store, app)
    }

    /// Permit checkpoint.
    ///
    /// - Check A failing holds the unit for `running_wait` and arms a
    ///   one-shot sweep for the same delay.
    /// - Check B failing holds the unit for `completion_wait`; no timer is
    ///   armed, the transition-driven cascade covers it.
    /// - Passing both allows the unit and clears any earlier hold.
    pub fn permit(&mut self, app: &str) -> Result<(PermitDecision, CoreStep)> {
        let now = self.clock.now();
        let check = check_permit(&self.store.view(), app, &self.config, now)?;
        let decision = check.decision(&self.config);
        let mut step = CoreStep::default();

        match decision {
            PermitDecision::Allow => {
                if self.waiting.forget(app) {
                    debug!(unit = %app, "cleared earlier permit hold");
                }
                info!(unit = %app, "permit allows unit");
            }
            PermitDecision::Wait(wait) => {
                let deadline = now.checked_add(wait).ok_or_else(|| {
                    DepGateError::ConfigError(format!(
                        "permit wait of {wait:?} for '{app}' overflows the clock"
                    ))
                })?;
                self.waiting.hold(app, now, deadline, check);
                if check == PermitCheck::AwaitRunningDeps {
                    step.commands.push(CoreCommand::ScheduleSweep {
                        delay: wait,
                        reason: SweepReason::PermitTimer {
                            unit: app.to_string(),
                        },
                    });
                }
                info!(unit = %app, ?check, wait = ?wait, "permit holds unit");
            }
        }

        Ok((decision, step))
    }

    /// Re-check every held unit; released units come back as a
    /// [`CoreCommand::Release`].
    pub fn sweep(&mut self, reason: &SweepReason) -> CoreStep {
        let now = self.clock.now();
        let released = sweep_waiting(&self.store, &mut self.waiting, &self.config, now, reason);
        let mut step = CoreStep::default();
        if !released.is_empty() {
            step.commands.push(CoreCommand::Release(released));
        }
        step
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::clock::ManualClock;
    use crate::types::UnitStatus;

    fn core(clock: &ManualClock) -> CoreController {
        CoreController::new(ControllerConfig::default(), Arc::new(clock.clone()))
    }

    fn api() -> UnitSpec {
        let mut spec = UnitSpec::new("api", "g1");
        spec.running_deps = vec!["db".into()];
        spec
    }

    #[test]
    fn failing_check_a_arms_one_shot_timer() {
        let clock = ManualClock::new();
        let mut core = core(&clock);
        core.evaluate(&api()).unwrap();

        let (decision, step) = core.permit("api").unwrap();

        assert_eq!(decision, PermitDecision::Wait(Duration::from_secs(60)));
        assert_eq!(
            step.commands,
            vec![CoreCommand::ScheduleSweep {
                delay: Duration::from_secs(60),
                reason: SweepReason::PermitTimer { unit: "api".into() },
            }]
        );
        assert!(core.waiting().contains("api"));
    }

    #[test]
    fn failing_check_b_arms_no_timer() {
        let clock = ManualClock::new();
        let mut core = core(&clock);
        let mut spec = UnitSpec::new("api", "g1");
        spec.completion_deps = vec!["migrate".into()];
        core.evaluate(&spec).unwrap();

        let (decision, step) = core.permit("api").unwrap();

        assert_eq!(decision, PermitDecision::Wait(Duration::from_secs(30)));
        assert!(step.commands.is_empty());
        assert!(core.waiting().contains("api"));
    }

    #[test]
    fn running_transition_schedules_cascade() {
        let clock = ManualClock::new();
        let mut core = core(&clock);
        core.step(UnitEvent::Observed {
            spec: UnitSpec::new("db", "g1"),
            status: UnitStatus::Pending,
        });

        let step = core.step(UnitEvent::Transitioned {
            unit: "db".into(),
            status: UnitStatus::Running,
        });

        assert_eq!(step.sweep_delays(), ControllerConfig::default().sweep_offsets);

        let again = core.step(UnitEvent::Transitioned {
            unit: "db".into(),
            status: UnitStatus::Running,
        });
        assert!(again.commands.is_empty());
    }

    #[test]
    fn completed_transition_schedules_cascade_alongside_fast_path() {
        let clock = ManualClock::new();
        let mut core = core(&clock);
        core.step(UnitEvent::Observed {
            spec: UnitSpec::new("migrate", "g1"),
            status: UnitStatus::Running,
        });

        // Nothing is held, so the fast path releases nothing, but the
        // cascade is still armed at every offset.
        let step = core.step(UnitEvent::Transitioned {
            unit: "migrate".into(),
            status: UnitStatus::Completed,
        });

        assert!(step.released().is_empty());
        assert_eq!(step.sweep_delays(), ControllerConfig::default().sweep_offsets);
    }

    #[test]
    fn non_waking_transitions_arm_nothing() {
        let clock = ManualClock::new();
        let mut core = core(&clock);
        core.step(UnitEvent::Observed {
            spec: UnitSpec::new("db", "g1"),
            status: UnitStatus::Running,
        });

        for status in [
            UnitStatus::Error,
            UnitStatus::Pending,
            UnitStatus::Terminating,
            UnitStatus::Undefined,
        ] {
            let step = core.step(UnitEvent::Transitioned {
                unit: "db".into(),
                status,
            });
            assert!(step.sweep_delays().is_empty(), "{status} armed a sweep");
            assert!(step.released().is_empty());
            assert_eq!(core.store().get("db").unwrap().status, status);
        }
    }

    #[test]
    fn oversized_wait_is_an_error_not_a_panic() {
        let clock = ManualClock::new();
        let config = ControllerConfig {
            running_wait: Duration::MAX,
            ..ControllerConfig::default()
        };
        let mut core = CoreController::new(config, Arc::new(clock.clone()));
        core.evaluate(&api()).unwrap();

        assert!(matches!(
            core.permit("api"),
            Err(DepGateError::ConfigError(_))
        ));
        assert!(core.waiting().is_empty());
    }

    #[test]
    fn completion_releases_held_units_immediately() {
        let clock = ManualClock::new();
        let mut core = core(&clock);
        core.step(UnitEvent::Observed {
            spec: UnitSpec::new("migrate", "g1"),
            status: UnitStatus::Running,
        });
        let mut spec = UnitSpec::new("api", "g1");
        spec.completion_deps = vec!["migrate".into()];
        core.evaluate(&spec).unwrap();
        let (decision, _) = core.permit("api").unwrap();
        assert!(matches!(decision, PermitDecision::Wait(_)));

        let step = core.step(UnitEvent::Transitioned {
            unit: "migrate".into(),
            status: UnitStatus::Completed,
        });

        assert_eq!(step.released(), vec!["api".to_string()]);
        assert!(core.waiting().is_empty());
    }

    #[test]
    fn removal_drops_hold() {
        let clock = ManualClock::new();
        let mut core = core(&clock);
        core.evaluate(&api()).unwrap();
        core.permit("api").unwrap();

        core.step(UnitEvent::Removed { unit: "api".into() });

        assert!(core.waiting().is_empty());
        assert!(core.sweep(&SweepReason::Manual).commands.is_empty());
    }
}
