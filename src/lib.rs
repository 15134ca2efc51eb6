// src/lib.rs

pub mod adapter;
pub mod cli;
pub mod clock;
pub mod config;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod replay;
pub mod store;
pub mod types;
pub mod wake;

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::clock::TokioClock;
use crate::config::{
    default_config_path, format_duration, load_and_validate, load_or_default, ConfigFile,
};
use crate::engine::Runtime;
use crate::replay::{ReplayDriver, ScriptParser};
use crate::wake::ChannelReleaseBackend;

const EVENT_CHANNEL_CAPACITY: usize = 64;
const RELEASE_CHANNEL_CAPACITY: usize = 256;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the runtime, its sweep timer and release channel
/// - the replay driver
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = match &args.config {
        Some(path) => load_and_validate(path)?,
        None => load_or_default(default_config_path())?,
    };

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let source = read_script(args.script.as_deref())?;
    let steps = ScriptParser::new()?.parse(&source)?;
    info!(steps = steps.len(), "replay script parsed");

    let (release, releases_rx) = ChannelReleaseBackend::channel(RELEASE_CHANNEL_CAPACITY);
    let (runtime, handle) = Runtime::build(
        cfg.controller.clone(),
        Arc::new(TokioClock),
        release,
        EVENT_CHANNEL_CAPACITY,
    );
    let runtime_task = tokio::spawn(runtime.run());

    // Ctrl-C → graceful shutdown.
    {
        let handle = handle.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            if handle.shutdown().await.is_err() {
                debug!("runtime already stopped");
            }
        });
    }

    let mut driver = ReplayDriver::new(handle.clone(), &cfg, releases_rx);
    let outcome = driver.run(&steps).await;

    if handle.shutdown().await.is_err() {
        warn!("runtime stopped before the replay finished");
    }
    runtime_task.await??;

    for entry in outcome? {
        println!("{entry}");
    }
    Ok(())
}

fn read_script(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) if p != Path::new("-") => Ok(std::fs::read_to_string(p)?),
        _ => {
            let mut source = String::new();
            std::io::stdin().read_to_string(&mut source)?;
            Ok(source)
        }
    }
}

/// Simple dry-run output: print controller settings and the unit manifest.
fn print_dry_run(cfg: &ConfigFile) {
    let controller = &cfg.controller;
    println!("depgate dry-run");
    println!(
        "  controller.healthy_duration = {}",
        format_duration(controller.healthy_duration)
    );
    println!(
        "  controller.running_wait = {}",
        format_duration(controller.running_wait)
    );
    println!(
        "  controller.completion_wait = {}",
        format_duration(controller.completion_wait)
    );
    let offsets: Vec<String> = controller
        .sweep_offsets
        .iter()
        .map(|d| format_duration(*d))
        .collect();
    println!("  controller.sweep_offsets = {offsets:?}");
    println!();

    println!("units ({}):", cfg.unit.len());
    for spec in cfg.unit_specs() {
        println!("  - {}", spec.name);
        println!("      group: {:?}", spec.group);
        if !spec.running_deps.is_empty() {
            println!("      running_after: {:?}", spec.running_deps);
        }
        if !spec.completion_deps.is_empty() {
            println!("      complete_after: {:?}", spec.completion_deps);
        }
        if spec.skip_count > 0 {
            println!("      skip: {}", spec.skip_count);
        }
    }

    debug!("dry-run complete (nothing replayed)");
}
