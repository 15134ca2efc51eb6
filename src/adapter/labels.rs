// src/adapter/labels.rs

//! Decoding of unit declarations carried as string labels.

use std::collections::BTreeMap;

use tracing::warn;

use crate::errors::{DepGateError, Result};
use crate::store::UnitSpec;
use crate::types::UnitName;

pub const APP_LABEL: &str = "app";
pub const GROUP_LABEL: &str = "topology";
pub const RUNNING_DEPS_LABEL: &str = "running-depends-on";
pub const COMPLETION_DEPS_LABEL: &str = "complete-depends-on";
pub const SKIP_LABEL: &str = "skipSchedulerTimes";

/// Separator between names in the dependency labels.
pub const LIST_SEPARATOR: &str = "__";

/// Build a [`UnitSpec`] from a label map.
///
/// Only `app` is required. A missing `topology` yields the empty group, and
/// a missing or malformed `skipSchedulerTimes` yields zero skips.
pub fn unit_spec_from_labels(labels: &BTreeMap<String, String>) -> Result<UnitSpec> {
    let name = labels
        .get(APP_LABEL)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| DepGateError::MissingLabel(APP_LABEL.to_string()))?;

    let group = labels.get(GROUP_LABEL).map(String::as_str).unwrap_or("");

    let mut spec = UnitSpec::new(name, group);
    spec.running_deps = split_names(labels.get(RUNNING_DEPS_LABEL));
    spec.completion_deps = split_names(labels.get(COMPLETION_DEPS_LABEL));
    spec.skip_count = parse_skip(name, labels.get(SKIP_LABEL));
    Ok(spec)
}

fn split_names(raw: Option<&String>) -> Vec<UnitName> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    raw.split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_skip(app: &str, raw: Option<&String>) -> u32 {
    let Some(raw) = raw else {
        return 0;
    };
    match raw.trim().parse::<u32>() {
        Ok(n) => n,
        Err(e) => {
            warn!(unit = %app, value = %raw, error = %e, "ignoring malformed skip label");
            0
        }
    }
}
