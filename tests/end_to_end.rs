// tests/end_to_end.rs

mod common;
use crate::common::{api, db, init_tracing};

use std::time::Duration;

use depgate::config::ControllerConfig;
use depgate::engine::UnitEvent;
use depgate::errors::DepGateError;
use depgate::types::{Admission, PermitDecision, RejectReason, SweepReason, UnitStatus};
use depgate_test_utils::builders::UnitSpecBuilder;
use depgate_test_utils::manual_controller;

fn observe(spec: depgate::store::UnitSpec, status: UnitStatus) -> UnitEvent {
    UnitEvent::Observed { spec, status }
}

fn transition(unit: &str, status: UnitStatus) -> UnitEvent {
    UnitEvent::Transitioned {
        unit: unit.to_string(),
        status,
    }
}

#[test]
fn dependent_is_released_once_dependency_is_stable() {
    init_tracing();
    let (controller, clock, timer) = manual_controller(ControllerConfig::default());

    // api arrives before db was ever seen: its snapshot of db is UNDEFINED.
    assert_eq!(
        controller.evaluate(&api()).unwrap(),
        Admission::Reject(RejectReason::RunningDepsNotLive)
    );

    // Registering db does not push anything to existing dependents.
    controller.apply(observe(db(), UnitStatus::Pending));
    assert_eq!(
        controller.admit("api").unwrap(),
        Admission::Reject(RejectReason::RunningDepsNotLive)
    );

    // db starts running: propagation updates api's snapshot and the wake
    // cascade is armed.
    controller.apply(transition("db", UnitStatus::Running));
    assert_eq!(
        timer.delays(),
        ControllerConfig::default().sweep_offsets,
        "cascade should be armed at every offset"
    );
    assert_eq!(controller.admit("api").unwrap(), Admission::Accept);

    // Not yet healthy for 20s: hold for the running wait.
    timer.clear();
    assert_eq!(
        controller.permit("api").unwrap(),
        PermitDecision::Wait(Duration::from_secs(60))
    );
    assert_eq!(
        timer.armed(),
        vec![(
            Duration::from_secs(60),
            SweepReason::PermitTimer { unit: "api".into() }
        )]
    );
    assert_eq!(controller.waiting_count(), 1);

    clock.advance(Duration::from_secs(15));
    assert!(controller.sweep(&SweepReason::Manual).is_empty());

    clock.advance(Duration::from_secs(5));
    assert_eq!(controller.sweep(&SweepReason::Manual), vec!["api".to_string()]);
    assert_eq!(controller.waiting_count(), 0);

    assert_eq!(controller.permit("api").unwrap(), PermitDecision::Allow);
}

#[test]
fn registering_dependency_first_snapshots_pending() {
    init_tracing();
    let (controller, _clock, _timer) = manual_controller(ControllerConfig::default());

    controller.apply(observe(db(), UnitStatus::Pending));

    assert_eq!(controller.evaluate(&api()).unwrap(), Admission::Accept);
}

#[test]
fn completion_releases_held_dependents_immediately() {
    init_tracing();
    let (controller, _clock, _timer) = manual_controller(ControllerConfig::default());

    controller.apply(observe(
        UnitSpecBuilder::new("migrate").build(),
        UnitStatus::Running,
    ));
    let api = UnitSpecBuilder::new("api").complete_after("migrate").build();

    // A running completion-dependency is enough for admission.
    assert_eq!(controller.evaluate(&api).unwrap(), Admission::Accept);
    assert_eq!(
        controller.permit("api").unwrap(),
        PermitDecision::Wait(Duration::from_secs(30))
    );

    let released = controller.apply(transition("migrate", UnitStatus::Completed));

    assert_eq!(released, vec!["api".to_string()]);
    assert_eq!(controller.waiting_count(), 0);
}

#[test]
fn flapping_dependency_restarts_the_stability_window() {
    init_tracing();
    let (controller, clock, _timer) = manual_controller(ControllerConfig::default());

    controller.apply(observe(db(), UnitStatus::Pending));
    controller.evaluate(&api()).unwrap();
    controller.apply(transition("db", UnitStatus::Running));

    clock.advance(Duration::from_secs(15));
    controller.apply(transition("db", UnitStatus::Error));
    controller.apply(transition("db", UnitStatus::Running));

    clock.advance(Duration::from_secs(10));
    assert!(matches!(
        controller.permit("api").unwrap(),
        PermitDecision::Wait(_)
    ));

    clock.advance(Duration::from_secs(10));
    assert_eq!(controller.permit("api").unwrap(), PermitDecision::Allow);
}

#[test]
fn transitions_do_not_cross_groups() {
    init_tracing();
    let (controller, _clock, timer) = manual_controller(ControllerConfig::default());

    controller.evaluate(&api()).unwrap();
    controller.apply(observe(
        UnitSpecBuilder::new("db").group("g2").build(),
        UnitStatus::Pending,
    ));
    controller.apply(transition("db", UnitStatus::Running));

    assert!(!timer.armed().is_empty());
    assert_eq!(
        controller.admit("api").unwrap(),
        Admission::Reject(RejectReason::RunningDepsNotLive)
    );
}

#[test]
fn skips_are_consumed_before_dependencies_are_checked() {
    init_tracing();
    let (controller, _clock, _timer) = manual_controller(ControllerConfig::default());
    let worker = UnitSpecBuilder::new("worker").skip(2).build();

    assert_eq!(
        controller.evaluate(&worker).unwrap(),
        Admission::Reject(RejectReason::Skipped { remaining: 1 })
    );
    assert_eq!(
        controller.evaluate(&worker).unwrap(),
        Admission::Reject(RejectReason::Skipped { remaining: 0 })
    );
    assert_eq!(controller.evaluate(&worker).unwrap(), Admission::Accept);
}

#[test]
fn expired_hold_is_dropped_without_release() {
    init_tracing();
    let (controller, clock, _timer) = manual_controller(ControllerConfig::default());

    controller.apply(observe(db(), UnitStatus::Pending));
    controller.evaluate(&api()).unwrap();
    controller.permit("api").unwrap();

    clock.advance(Duration::from_secs(61));
    controller.apply(transition("db", UnitStatus::Running));
    clock.advance(Duration::from_secs(20));

    assert!(controller.sweep(&SweepReason::Manual).is_empty());
    assert_eq!(controller.waiting_count(), 0);
}

#[test]
fn removal_drops_hold_and_leaves_stale_snapshots() {
    init_tracing();
    let (controller, _clock, _timer) = manual_controller(ControllerConfig::default());

    controller.apply(observe(db(), UnitStatus::Running));
    controller.evaluate(&api()).unwrap();
    controller.permit("api").unwrap();
    assert_eq!(controller.waiting_count(), 1);

    // The direct snapshot still says RUNNING, but the removed unit can no
    // longer be walked for the transitive check.
    controller.apply(UnitEvent::Removed { unit: "db".into() });
    assert!(controller
        .inspect(|core| core.store().view().running_deps_pending_or_running("api"))
        .unwrap());
    assert_eq!(
        controller.admit("api").unwrap(),
        Admission::Reject(RejectReason::TransitiveRunningDepsNotLive)
    );

    controller.apply(UnitEvent::Removed { unit: "api".into() });
    assert_eq!(controller.waiting_count(), 0);
}

#[test]
fn unknown_units_are_errors_for_host_calls() {
    init_tracing();
    let (controller, _clock, _timer) = manual_controller(ControllerConfig::default());

    assert!(matches!(
        controller.permit("ghost"),
        Err(DepGateError::UnknownUnit(ref u)) if u == "ghost"
    ));
    assert!(matches!(
        controller.admit("ghost"),
        Err(DepGateError::UnknownUnit(_))
    ));

    // Lifecycle events for unknown units are ignored.
    assert!(controller.apply(transition("ghost", UnitStatus::Running)).is_empty());
}
