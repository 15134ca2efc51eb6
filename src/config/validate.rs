// src/config/validate.rs

use std::time::Duration;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::warn;

use crate::config::duration::parse_duration;
use crate::config::model::{ConfigFile, ControllerConfig, RawConfigFile, RawControllerSection};
use crate::errors::{DepGateError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::DepGateError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let controller = resolve_controller(&raw.controller)?;
        validate_unit_dependencies(&raw)?;
        validate_running_graph(&raw)?;
        Ok(ConfigFile::new_unchecked(controller, raw.unit))
    }
}

/// Upper bound for every controller duration. Holds and sweeps are
/// scheduled relative to the clock, so the sum must stay representable.
pub const MAX_CONTROLLER_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

fn duration_field(field: &str, value: &str) -> Result<Duration> {
    let duration = parse_duration(value)
        .map_err(|e| DepGateError::ConfigError(format!("[controller].{field}: {e}")))?;
    if duration > MAX_CONTROLLER_DURATION {
        return Err(DepGateError::ConfigError(format!(
            "[controller].{field} must be at most 24h (got '{value}')"
        )));
    }
    Ok(duration)
}

fn resolve_controller(raw: &RawControllerSection) -> Result<ControllerConfig> {
    let healthy_duration = duration_field("healthy_duration", &raw.healthy_duration)?;
    let running_wait = duration_field("running_wait", &raw.running_wait)?;
    let completion_wait = duration_field("completion_wait", &raw.completion_wait)?;

    if running_wait.is_zero() {
        return Err(DepGateError::ConfigError(
            "[controller].running_wait must be > 0".to_string(),
        ));
    }
    if completion_wait.is_zero() {
        return Err(DepGateError::ConfigError(
            "[controller].completion_wait must be > 0".to_string(),
        ));
    }

    let mut sweep_offsets = Vec::with_capacity(raw.sweep_offsets.len());
    for value in &raw.sweep_offsets {
        let offset = duration_field("sweep_offsets", value)?;
        if let Some(prev) = sweep_offsets.last() {
            if offset <= *prev {
                return Err(DepGateError::ConfigError(format!(
                    "[controller].sweep_offsets must be strictly increasing (got '{value}' after {prev:?})"
                )));
            }
        }
        sweep_offsets.push(offset);
    }

    Ok(ControllerConfig {
        healthy_duration,
        running_wait,
        completion_wait,
        sweep_offsets,
    })
}

fn validate_unit_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, unit) in cfg.unit.iter() {
        for dep in unit.running_after.iter().chain(unit.complete_after.iter()) {
            if dep == name {
                return Err(DepGateError::ConfigError(format!(
                    "unit '{}' cannot depend on itself",
                    name
                )));
            }

            match cfg.unit.get(dep) {
                Some(dep_unit) if dep_unit.group != unit.group => {
                    return Err(DepGateError::ConfigError(format!(
                        "unit '{}' (group '{}') depends on '{}' in group '{}'; dependencies must share a group",
                        name, unit.group, dep, dep_unit.group
                    )));
                }
                Some(_) => {}
                None => {
                    // Allowed: the dependency may be observed later.
                    warn!(unit = %name, dependency = %dep, "dependency not declared in manifest");
                }
            }
        }
    }
    Ok(())
}

fn validate_running_graph(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: dep -> unit. A cycle of running-dependencies can never
    // be released.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.unit.keys() {
        graph.add_node(name.as_str());
    }

    for (name, unit) in cfg.unit.iter() {
        for dep in unit.running_after.iter() {
            if cfg.unit.contains_key(dep) {
                graph.add_edge(dep.as_str(), name.as_str(), ());
            }
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(DepGateError::DependencyCycle(format!(
            "running-dependency cycle involving unit '{}'",
            cycle.node_id()
        ))),
    }
}
