#![allow(dead_code)]

use std::collections::BTreeMap;

use depgate::config::{ConfigFile, RawConfigFile, RawControllerSection, UnitConfig};
use depgate::errors::Result;
use depgate::store::UnitSpec;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                controller: RawControllerSection::default(),
                unit: BTreeMap::new(),
            },
        }
    }

    pub fn with_unit(mut self, name: &str, unit: UnitConfig) -> Self {
        self.config.unit.insert(name.to_string(), unit);
        self
    }

    pub fn healthy_duration(mut self, d: &str) -> Self {
        self.config.controller.healthy_duration = d.to_string();
        self
    }

    pub fn running_wait(mut self, d: &str) -> Self {
        self.config.controller.running_wait = d.to_string();
        self
    }

    pub fn completion_wait(mut self, d: &str) -> Self {
        self.config.controller.completion_wait = d.to_string();
        self
    }

    pub fn sweep_offsets(mut self, offsets: &[&str]) -> Self {
        self.config.controller.sweep_offsets = offsets.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `UnitConfig` manifest entries.
pub struct UnitConfigBuilder {
    unit: UnitConfig,
}

impl UnitConfigBuilder {
    pub fn new(group: &str) -> Self {
        Self {
            unit: UnitConfig {
                group: group.to_string(),
                running_after: vec![],
                complete_after: vec![],
                skip: 0,
            },
        }
    }

    pub fn running_after(mut self, dep: &str) -> Self {
        self.unit.running_after.push(dep.to_string());
        self
    }

    pub fn complete_after(mut self, dep: &str) -> Self {
        self.unit.complete_after.push(dep.to_string());
        self
    }

    pub fn skip(mut self, n: u32) -> Self {
        self.unit.skip = n;
        self
    }

    pub fn build(self) -> UnitConfig {
        self.unit
    }
}

/// Builder for `UnitSpec` declarations.
pub struct UnitSpecBuilder {
    spec: UnitSpec,
}

impl UnitSpecBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            spec: UnitSpec::new(name, "g1"),
        }
    }

    pub fn group(mut self, group: &str) -> Self {
        self.spec.group = group.to_string();
        self
    }

    pub fn running_after(mut self, dep: &str) -> Self {
        self.spec.running_deps.push(dep.to_string());
        self
    }

    pub fn complete_after(mut self, dep: &str) -> Self {
        self.spec.completion_deps.push(dep.to_string());
        self
    }

    pub fn skip(mut self, n: u32) -> Self {
        self.spec.skip_count = n;
        self
    }

    pub fn build(self) -> UnitSpec {
        self.spec
    }
}
