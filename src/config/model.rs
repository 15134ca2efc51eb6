// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::store::UnitSpec;

/// How long a running-dependency must have held `Running` before dependents
/// pass the permit checkpoint.
pub const DEFAULT_HEALTHY_DURATION: Duration = Duration::from_secs(20);
/// Wait returned (and sweep timer armed) when running-dependencies are not
/// yet stable.
pub const DEFAULT_RUNNING_WAIT: Duration = Duration::from_secs(60);
/// Wait returned when completion-dependencies have not completed.
pub const DEFAULT_COMPLETION_WAIT: Duration = Duration::from_secs(30);
/// Delayed sweeps scheduled after a unit starts running or completes.
pub const DEFAULT_SWEEP_OFFSETS: [Duration; 5] = [
    Duration::from_secs(15),
    Duration::from_secs(25),
    Duration::from_secs(35),
    Duration::from_secs(45),
    Duration::from_secs(55),
];

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [controller]
/// healthy_duration = "20s"
/// running_wait = "60s"
/// completion_wait = "30s"
/// sweep_offsets = ["15s", "25s", "35s", "45s", "55s"]
///
/// [unit.api]
/// group = "g1"
/// running_after = ["db"]
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub controller: RawControllerSection,

    /// Unit manifest from `[unit.<name>]`.
    #[serde(default)]
    pub unit: BTreeMap<String, UnitConfig>,
}

/// `[controller]` section, durations still as strings (`"20s"`, `"250ms"`).
#[derive(Debug, Clone, Deserialize)]
pub struct RawControllerSection {
    #[serde(default = "default_healthy_duration")]
    pub healthy_duration: String,

    #[serde(default = "default_running_wait")]
    pub running_wait: String,

    #[serde(default = "default_completion_wait")]
    pub completion_wait: String,

    #[serde(default = "default_sweep_offsets")]
    pub sweep_offsets: Vec<String>,
}

fn default_healthy_duration() -> String {
    "20s".to_string()
}

fn default_running_wait() -> String {
    "60s".to_string()
}

fn default_completion_wait() -> String {
    "30s".to_string()
}

fn default_sweep_offsets() -> Vec<String> {
    ["15s", "25s", "35s", "45s", "55s"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for RawControllerSection {
    fn default() -> Self {
        Self {
            healthy_duration: default_healthy_duration(),
            running_wait: default_running_wait(),
            completion_wait: default_completion_wait(),
            sweep_offsets: default_sweep_offsets(),
        }
    }
}

/// `[unit.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnitConfig {
    /// Propagation group (the `topology` label).
    #[serde(default)]
    pub group: String,

    /// Units that must be running (and stable) first.
    #[serde(default)]
    pub running_after: Vec<String>,

    /// Units that must have completed first.
    #[serde(default)]
    pub complete_after: Vec<String>,

    /// Admission cycles to reject deliberately.
    #[serde(default)]
    pub skip: u32,
}

impl UnitConfig {
    pub fn to_spec(&self, name: &str) -> UnitSpec {
        UnitSpec {
            name: name.to_string(),
            group: self.group.clone(),
            completion_deps: self.complete_after.clone(),
            running_deps: self.running_after.clone(),
            skip_count: self.skip,
        }
    }
}

/// Resolved timing knobs for the permit controller and wake sweeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    pub healthy_duration: Duration,
    pub running_wait: Duration,
    pub completion_wait: Duration,
    /// Strictly increasing offsets of the delayed sweep cascade.
    pub sweep_offsets: Vec<Duration>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            healthy_duration: DEFAULT_HEALTHY_DURATION,
            running_wait: DEFAULT_RUNNING_WAIT,
            completion_wait: DEFAULT_COMPLETION_WAIT,
            sweep_offsets: DEFAULT_SWEEP_OFFSETS.to_vec(),
        }
    }
}

/// Validated configuration.
///
/// Only obtainable through `ConfigFile::try_from(RawConfigFile)` (see
/// `validate.rs`) or [`ConfigFile::default`].
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub controller: ControllerConfig,
    pub unit: BTreeMap<String, UnitConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        controller: ControllerConfig,
        unit: BTreeMap<String, UnitConfig>,
    ) -> Self {
        Self { controller, unit }
    }

    /// Unit manifest as specs, in name order.
    pub fn unit_specs(&self) -> Vec<UnitSpec> {
        self.unit
            .iter()
            .map(|(name, cfg)| cfg.to_spec(name))
            .collect()
    }
}
