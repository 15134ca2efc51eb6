pub mod builders;
pub mod fake_release;
pub mod fake_timer;

use std::sync::{Arc, Once};

use depgate::clock::ManualClock;
use depgate::config::ControllerConfig;
use depgate::engine::{Controller, CoreController};
use tracing_subscriber::{fmt, EnvFilter};

pub use fake_release::RecordingRelease;
pub use fake_timer::RecordingTimer;

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// A controller driven by a manual clock and a recording timer.
///
/// Nothing fires on its own: tests advance the clock and call
/// `Controller::sweep` explicitly.
pub fn manual_controller(config: ControllerConfig) -> (Controller, ManualClock, RecordingTimer) {
    let clock = ManualClock::new();
    let timer = RecordingTimer::new();
    let core = CoreController::new(config, Arc::new(clock.clone()));
    let controller = Controller::new(core, Arc::new(timer.clone()));
    (controller, clock, timer)
}
