// src/adapter/feed.rs

//! Translation of watch notifications into runtime events.

use std::collections::BTreeMap;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::adapter::labels::{unit_spec_from_labels, APP_LABEL};
use crate::adapter::phase::status_from_phase;
use crate::engine::{RuntimeEvent, UnitEvent};
use crate::errors::{DepGateError, Result};

/// A unit as seen by the watch feed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObservedUnit {
    pub labels: BTreeMap<String, String>,
    pub phase: String,
    /// Readiness condition, when the feed reports one.
    pub ready: Option<bool>,
}

impl ObservedUnit {
    pub fn new(labels: BTreeMap<String, String>, phase: impl Into<String>) -> Self {
        Self {
            labels,
            phase: phase.into(),
            ready: None,
        }
    }

    pub fn with_ready(mut self, ready: bool) -> Self {
        self.ready = Some(ready);
        self
    }

    fn app(&self) -> Result<&str> {
        self.labels
            .get(APP_LABEL)
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| DepGateError::MissingLabel(APP_LABEL.to_string()))
    }
}

/// Notification delivered by the watch feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Added(ObservedUnit),
    Updated(ObservedUnit),
    Deleted(ObservedUnit),
}

/// Translate one watch notification into a runtime event.
pub fn translate(event: &WatchEvent) -> Result<RuntimeEvent> {
    let unit_event = match event {
        WatchEvent::Added(unit) => UnitEvent::Observed {
            spec: unit_spec_from_labels(&unit.labels)?,
            status: status_from_phase(&unit.phase, unit.ready),
        },
        WatchEvent::Updated(unit) => UnitEvent::Transitioned {
            unit: unit.app()?.trim().to_string(),
            status: status_from_phase(&unit.phase, unit.ready),
        },
        WatchEvent::Deleted(unit) => UnitEvent::Removed {
            unit: unit.app()?.trim().to_string(),
        },
    };
    Ok(RuntimeEvent::Unit(unit_event))
}

/// Spawn a task forwarding a watch channel into the runtime.
///
/// Notifications that cannot be decoded are logged and skipped. The task
/// ends when either channel closes.
pub fn spawn_adapter(
    mut watch_rx: mpsc::Receiver<WatchEvent>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("watch adapter started");

        while let Some(event) = watch_rx.recv().await {
            debug!(?event, "received watch event");

            let runtime_event = match translate(&event) {
                Ok(e) => e,
                Err(err) => {
                    warn!(error = %err, "dropping undecodable watch event");
                    continue;
                }
            };

            if runtime_tx.send(runtime_event).await.is_err() {
                debug!("runtime gone; stopping watch adapter");
                return;
            }
        }

        debug!("watch adapter loop finished");
    })
}
