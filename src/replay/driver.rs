// src/replay/driver.rs

//! Drives a running controller from a parsed script and records what the
//! host would have seen.

use std::collections::BTreeMap;
use std::fmt;

use tokio::sync::mpsc;
use tracing::debug;

use crate::adapter::status_from_phase;
use crate::config::ConfigFile;
use crate::engine::RuntimeHandle;
use crate::errors::Result;
use crate::replay::script::{ObserveFields, ScriptLine, ScriptStep};
use crate::store::UnitSpec;
use crate::types::{Admission, PermitDecision, UnitName};

/// One observable outcome of a replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEntry {
    Admission { line: usize, unit: UnitName, admission: Admission },
    Permit { line: usize, unit: UnitName, decision: PermitDecision },
    Released { unit: UnitName },
    Failed { line: usize, unit: UnitName, message: String },
}

impl fmt::Display for TranscriptEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscriptEntry::Admission { line, unit, admission } => match admission {
                Admission::Accept => write!(f, "{line:>4}  evaluate {unit}: accept"),
                Admission::Reject(reason) => {
                    write!(f, "{line:>4}  evaluate {unit}: reject ({reason})")
                }
            },
            TranscriptEntry::Permit { line, unit, decision } => match decision {
                PermitDecision::Allow => write!(f, "{line:>4}  permit {unit}: allow"),
                PermitDecision::Wait(d) => write!(f, "{line:>4}  permit {unit}: wait {d:?}"),
            },
            TranscriptEntry::Released { unit } => write!(f, "      released {unit}"),
            TranscriptEntry::Failed { line, unit, message } => {
                write!(f, "{line:>4}  {unit}: error: {message}")
            }
        }
    }
}

/// Replays script steps against a [`RuntimeHandle`].
///
/// Unit declarations come from the config manifest, overridden by whatever
/// `observe` lines specify. `evaluate` uses the latest declaration for the
/// unit, so a unit can be evaluated before it was ever observed as long as
/// the manifest names it.
#[derive(Debug)]
pub struct ReplayDriver {
    handle: RuntimeHandle,
    manifest: BTreeMap<UnitName, UnitSpec>,
    declared: BTreeMap<UnitName, UnitSpec>,
    releases: mpsc::Receiver<UnitName>,
}

impl ReplayDriver {
    pub fn new(
        handle: RuntimeHandle,
        config: &ConfigFile,
        releases: mpsc::Receiver<UnitName>,
    ) -> Self {
        let manifest = config
            .unit_specs()
            .into_iter()
            .map(|spec| (spec.name.clone(), spec))
            .collect();
        Self {
            handle,
            manifest,
            declared: BTreeMap::new(),
            releases,
        }
    }

    /// Run all steps in order and return the transcript.
    ///
    /// Releases are collected after every step, once the runtime has handled
    /// everything sent so far.
    pub async fn run(&mut self, steps: &[ScriptLine]) -> Result<Vec<TranscriptEntry>> {
        let mut transcript = Vec::new();
        for step in steps {
            debug!(line = step.line, step = ?step.step, "replaying step");
            if let Some(entry) = self.apply(step).await? {
                transcript.push(entry);
            }
            self.handle.sync().await?;
            while let Ok(unit) = self.releases.try_recv() {
                transcript.push(TranscriptEntry::Released { unit });
            }
        }
        Ok(transcript)
    }

    async fn apply(&mut self, step: &ScriptLine) -> Result<Option<TranscriptEntry>> {
        let line = step.line;
        match &step.step {
            ScriptStep::Observe { app, fields } => {
                let spec = self.declare(app, fields);
                let phase = fields.phase.as_deref().unwrap_or("Pending");
                let status = status_from_phase(phase, fields.ready);
                self.handle.observe(spec, status).await?;
                Ok(None)
            }
            ScriptStep::Update { app, phase, ready } => {
                self.handle
                    .transition(app.clone(), status_from_phase(phase, *ready))
                    .await?;
                Ok(None)
            }
            ScriptStep::Delete { app } => {
                self.declared.remove(app);
                self.handle.remove(app.clone()).await?;
                Ok(None)
            }
            ScriptStep::Evaluate { app } => {
                let Some(spec) = self.spec_for(app) else {
                    return Ok(Some(TranscriptEntry::Failed {
                        line,
                        unit: app.clone(),
                        message: "unit is neither observed nor in the manifest".to_string(),
                    }));
                };
                Ok(Some(match self.handle.evaluate(spec).await {
                    Ok(admission) => TranscriptEntry::Admission {
                        line,
                        unit: app.clone(),
                        admission,
                    },
                    Err(e) => TranscriptEntry::Failed {
                        line,
                        unit: app.clone(),
                        message: e.to_string(),
                    },
                }))
            }
            ScriptStep::Permit { app } => Ok(Some(match self.handle.permit(app.clone()).await {
                Ok(decision) => TranscriptEntry::Permit {
                    line,
                    unit: app.clone(),
                    decision,
                },
                Err(e) => TranscriptEntry::Failed {
                    line,
                    unit: app.clone(),
                    message: e.to_string(),
                },
            })),
            ScriptStep::Sleep(d) => {
                tokio::time::sleep(*d).await;
                Ok(None)
            }
        }
    }

    fn declare(&mut self, app: &str, fields: &ObserveFields) -> UnitSpec {
        let mut spec = self
            .spec_for(app)
            .unwrap_or_else(|| UnitSpec::new(app, ""));
        if let Some(group) = &fields.group {
            spec.group = group.clone();
        }
        if let Some(running) = &fields.running {
            spec.running_deps = running.clone();
        }
        if let Some(complete) = &fields.complete {
            spec.completion_deps = complete.clone();
        }
        if let Some(skip) = fields.skip {
            spec.skip_count = skip;
        }
        self.declared.insert(app.to_string(), spec.clone());
        spec
    }

    fn spec_for(&self, app: &str) -> Option<UnitSpec> {
        self.declared
            .get(app)
            .or_else(|| self.manifest.get(app))
            .cloned()
    }
}
