// src/engine/admission.rs

//! Admission gate: the early "try again later" check before placement.

use tracing::{debug, info};

use crate::errors::Result;
use crate::store::DependencyStore;
use crate::types::{Admission, RejectReason};

/// Run the admission gate for `app`.
///
/// Checks run in order and the first failure rejects:
/// 1. a pending deliberate skip (consumed by this call),
/// 2. direct running-deps pending or running,
/// 3. running-deps within three hops pending or running,
/// 4. completion-deps running or completed.
///
/// Rejections are soft; the unit stays eligible for later cycles.
pub fn admit(store: &mut DependencyStore, app: &str) -> Result<Admission> {
    if let Some(remaining) = store.take_skip(app)? {
        info!(unit = %app, remaining, "skipping admission cycle");
        return Ok(Admission::Reject(RejectReason::Skipped { remaining }));
    }

    let view = store.view();

    let reject = if !view.running_deps_pending_or_running(app)? {
        Some(RejectReason::RunningDepsNotLive)
    } else if !view.running_deps_live_within_three_hops(app)? {
        Some(RejectReason::TransitiveRunningDepsNotLive)
    } else if !view.completion_deps_running_or_completed(app)? {
        Some(RejectReason::CompletionDepsNotStarted)
    } else {
        None
    };

    match reject {
        Some(reason) => {
            debug!(unit = %app, %reason, "admission rejected");
            Ok(Admission::Reject(reason))
        }
        None => {
            debug!(unit = %app, "admission accepted");
            Ok(Admission::Accept)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::errors::DepGateError;
    use crate::store::UnitSpec;
    use crate::types::UnitStatus;

    fn register(
        store: &mut DependencyStore,
        name: &str,
        running: &[&str],
        completion: &[&str],
        skip: u32,
    ) {
        let spec = UnitSpec {
            name: name.to_string(),
            group: "g1".to_string(),
            completion_deps: completion.iter().map(|s| s.to_string()).collect(),
            running_deps: running.iter().map(|s| s.to_string()).collect(),
            skip_count: skip,
        };
        store.register(&spec, Instant::now());
    }

    #[test]
    fn unit_without_dependencies_is_accepted() {
        let mut store = DependencyStore::new();
        register(&mut store, "db", &[], &[], 0);
        assert_eq!(admit(&mut store, "db").unwrap(), Admission::Accept);
    }

    #[test]
    fn skip_counter_rejects_exactly_skip_count_times() {
        let mut store = DependencyStore::new();
        register(&mut store, "db", &[], &[], 2);

        assert_eq!(
            admit(&mut store, "db").unwrap(),
            Admission::Reject(RejectReason::Skipped { remaining: 1 })
        );
        assert_eq!(
            admit(&mut store, "db").unwrap(),
            Admission::Reject(RejectReason::Skipped { remaining: 0 })
        );
        assert_eq!(admit(&mut store, "db").unwrap(), Admission::Accept);
        assert_eq!(admit(&mut store, "db").unwrap(), Admission::Accept);
    }

    #[test]
    fn skip_check_runs_before_dependency_checks() {
        let mut store = DependencyStore::new();
        register(&mut store, "api", &["db"], &[], 1);

        assert_eq!(
            admit(&mut store, "api").unwrap(),
            Admission::Reject(RejectReason::Skipped { remaining: 0 })
        );
        assert_eq!(
            admit(&mut store, "api").unwrap(),
            Admission::Reject(RejectReason::RunningDepsNotLive)
        );
    }

    #[test]
    fn undefined_running_dependency_rejects() {
        let mut store = DependencyStore::new();
        register(&mut store, "api", &["db"], &[], 0);

        assert_eq!(
            admit(&mut store, "api").unwrap(),
            Admission::Reject(RejectReason::RunningDepsNotLive)
        );
    }

    #[test]
    fn errored_transitive_dependency_rejects() {
        let mut store = DependencyStore::new();
        register(&mut store, "disk", &[], &[], 0);
        register(&mut store, "db", &["disk"], &[], 0);
        register(&mut store, "api", &["db"], &[], 0);
        store.set_status("disk", UnitStatus::Error, Instant::now());

        assert_eq!(
            admit(&mut store, "api").unwrap(),
            Admission::Reject(RejectReason::TransitiveRunningDepsNotLive)
        );
    }

    #[test]
    fn pending_completion_dependency_rejects_until_started() {
        let mut store = DependencyStore::new();
        register(&mut store, "migrate", &[], &[], 0);
        register(&mut store, "api", &[], &["migrate"], 0);

        assert_eq!(
            admit(&mut store, "api").unwrap(),
            Admission::Reject(RejectReason::CompletionDepsNotStarted)
        );

        store.set_status("migrate", UnitStatus::Running, Instant::now());
        assert_eq!(admit(&mut store, "api").unwrap(), Admission::Accept);
    }

    #[test]
    fn unknown_unit_is_a_hard_error() {
        let mut store = DependencyStore::new();
        assert!(matches!(
            admit(&mut store, "ghost"),
            Err(DepGateError::UnknownUnit(_))
        ));
    }
}
