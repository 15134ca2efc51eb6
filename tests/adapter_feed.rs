// tests/adapter_feed.rs

mod common;
use crate::common::init_tracing;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use depgate::adapter::{spawn_adapter, ObservedUnit, WatchEvent};
use depgate::clock::TokioClock;
use depgate::config::ControllerConfig;
use depgate::engine::Runtime;
use depgate::types::{Admission, PermitDecision, UnitStatus};
use depgate_test_utils::{with_timeout, RecordingRelease};
use tokio::sync::mpsc;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn unit(pairs: &[(&str, &str)], phase: &str) -> ObservedUnit {
    let labels: BTreeMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    ObservedUnit::new(labels, phase)
}

fn db(phase: &str) -> ObservedUnit {
    unit(&[("app", "db"), ("topology", "g1")], phase)
}

#[tokio::test(start_paused = true)]
async fn watch_feed_drives_admission_and_release() -> TestResult {
    init_tracing();
    let release = RecordingRelease::new();
    let (runtime, handle) = Runtime::build(
        ControllerConfig::default(),
        Arc::new(TokioClock),
        release.clone(),
        16,
    );
    let runtime_task = tokio::spawn(runtime.run());

    let (watch_tx, watch_rx) = mpsc::channel(16);
    let adapter = spawn_adapter(watch_rx, handle.sender());

    watch_tx.send(WatchEvent::Added(db("Pending"))).await?;
    let api = unit(
        &[
            ("app", "api"),
            ("topology", "g1"),
            ("running-depends-on", "db"),
        ],
        "Pending",
    );
    watch_tx.send(WatchEvent::Added(api.clone())).await?;

    // A malformed notification is skipped, not fatal.
    watch_tx
        .send(WatchEvent::Updated(unit(&[("topology", "g1")], "Running")))
        .await?;

    watch_tx.send(WatchEvent::Updated(db("Running"))).await?;

    // Close the feed and wait for the adapter to drain it, so everything it
    // forwarded is queued ahead of the host calls below.
    drop(watch_tx);
    with_timeout(adapter).await?;

    assert_eq!(handle.admit("api").await?, Admission::Accept);
    assert_eq!(
        handle.permit("api").await?,
        PermitDecision::Wait(Duration::from_secs(60))
    );

    tokio::time::sleep(Duration::from_secs(26)).await;
    handle.sync().await?;
    assert_eq!(release.released(), vec!["api".to_string()]);

    handle.shutdown().await?;
    with_timeout(runtime_task).await??;
    Ok(())
}

#[tokio::test]
async fn not_ready_running_unit_counts_as_error() -> TestResult {
    init_tracing();
    let (runtime, handle) = Runtime::build(
        ControllerConfig::default(),
        Arc::new(TokioClock),
        RecordingRelease::new(),
        16,
    );
    let runtime_task = tokio::spawn(runtime.run());

    let (watch_tx, watch_rx) = mpsc::channel(16);
    let adapter = spawn_adapter(watch_rx, handle.sender());

    watch_tx.send(WatchEvent::Added(db("Pending"))).await?;
    watch_tx
        .send(WatchEvent::Added(unit(
            &[
                ("app", "api"),
                ("topology", "g1"),
                ("running-depends-on", "db"),
            ],
            "Pending",
        )))
        .await?;
    watch_tx
        .send(WatchEvent::Updated(db("Running").with_ready(false)))
        .await?;
    drop(watch_tx);
    with_timeout(adapter).await?;

    assert!(!handle.admit("api").await?.is_accept());

    handle.shutdown().await?;
    with_timeout(runtime_task).await??;
    Ok(())
}

#[tokio::test]
async fn deleted_units_are_forgotten() -> TestResult {
    init_tracing();
    let (runtime, handle) = Runtime::build(
        ControllerConfig::default(),
        Arc::new(TokioClock),
        RecordingRelease::new(),
        16,
    );
    let runtime_task = tokio::spawn(runtime.run());

    let (watch_tx, watch_rx) = mpsc::channel(16);
    let adapter = spawn_adapter(watch_rx, handle.sender());

    watch_tx.send(WatchEvent::Added(db("Running"))).await?;
    watch_tx.send(WatchEvent::Deleted(db("Running"))).await?;
    drop(watch_tx);
    with_timeout(adapter).await?;

    assert!(handle.admit("db").await.is_err());
    // Later lifecycle events for the deleted unit are ignored.
    handle.transition("db", UnitStatus::Pending).await?;
    assert_eq!(handle.sync().await?, 0);
    assert!(handle.admit("db").await.is_err());

    handle.shutdown().await?;
    with_timeout(runtime_task).await??;
    Ok(())
}
