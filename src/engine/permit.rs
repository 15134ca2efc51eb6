// src/engine/permit.rs

//! Permit checkpoint checks, shared by the permit call and wake sweeps.

use std::time::Instant;

use crate::config::ControllerConfig;
use crate::errors::Result;
use crate::store::DependencyView;
use crate::types::PermitDecision;

/// Where a unit stands at the permit checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermitCheck {
    /// Both checks pass; the unit may bind.
    Ready,
    /// Check A failed: some running-dependency is not running, or has not
    /// been running for the healthy duration yet.
    AwaitRunningDeps,
    /// Check A passed but some completion-dependency has not completed.
    AwaitCompletionDeps,
}

impl PermitCheck {
    /// The decision handed back to the host for this check.
    pub fn decision(self, config: &ControllerConfig) -> PermitDecision {
        match self {
            PermitCheck::Ready => PermitDecision::Allow,
            PermitCheck::AwaitRunningDeps => PermitDecision::Wait(config.running_wait),
            PermitCheck::AwaitCompletionDeps => PermitDecision::Wait(config.completion_wait),
        }
    }
}

/// Evaluate checks A and B for `app` at `now`.
///
/// Check A uses a stability window rather than a point-in-time status so a
/// dependency that has only just flipped to `Running` does not release its
/// dependents before it has proven healthy.
pub fn check_permit(
    view: &DependencyView<'_>,
    app: &str,
    config: &ControllerConfig,
    now: Instant,
) -> Result<PermitCheck> {
    if !view.running_deps_running_since(app, config.healthy_duration, now)? {
        return Ok(PermitCheck::AwaitRunningDeps);
    }

    if !view.completion_deps_completed(app)? {
        return Ok(PermitCheck::AwaitCompletionDeps);
    }

    Ok(PermitCheck::Ready)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::store::{DependencyStore, UnitSpec};
    use crate::types::UnitStatus;

    fn setup(now: Instant) -> DependencyStore {
        let mut store = DependencyStore::new();
        store.register(&UnitSpec::new("db", "g1"), now);
        store.register(&UnitSpec::new("migrate", "g1"), now);
        let mut api = UnitSpec::new("api", "g1");
        api.running_deps = vec!["db".into()];
        api.completion_deps = vec!["migrate".into()];
        store.register(&api, now);
        store
    }

    #[test]
    fn running_dependency_must_be_stable() {
        let t0 = Instant::now();
        let config = ControllerConfig::default();
        let mut store = setup(t0);
        store.set_status("db", UnitStatus::Running, t0);
        store.set_status("migrate", UnitStatus::Completed, t0);

        let just_before = t0 + config.healthy_duration - Duration::from_millis(1);
        assert_eq!(
            check_permit(&store.view(), "api", &config, just_before).unwrap(),
            PermitCheck::AwaitRunningDeps
        );

        let at = t0 + config.healthy_duration;
        assert_eq!(
            check_permit(&store.view(), "api", &config, at).unwrap(),
            PermitCheck::Ready
        );
    }

    #[test]
    fn completion_check_follows_running_check() {
        let t0 = Instant::now();
        let config = ControllerConfig::default();
        let mut store = setup(t0);
        store.set_status("db", UnitStatus::Running, t0);

        let later = t0 + config.healthy_duration;
        let check = check_permit(&store.view(), "api", &config, later).unwrap();
        assert_eq!(check, PermitCheck::AwaitCompletionDeps);
        assert_eq!(
            check.decision(&config),
            PermitDecision::Wait(config.completion_wait)
        );
    }

    #[test]
    fn flapping_dependency_restarts_the_window() {
        let t0 = Instant::now();
        let config = ControllerConfig::default();
        let mut store = setup(t0);
        store.set_status("migrate", UnitStatus::Completed, t0);
        store.set_status("db", UnitStatus::Running, t0);
        store.set_status("db", UnitStatus::Error, t0 + Duration::from_secs(15));
        store.set_status("db", UnitStatus::Running, t0 + Duration::from_secs(16));

        let check =
            check_permit(&store.view(), "api", &config, t0 + Duration::from_secs(30)).unwrap();
        assert_eq!(check, PermitCheck::AwaitRunningDeps);
        assert_eq!(check.decision(&config), PermitDecision::Wait(config.running_wait));
    }
}
