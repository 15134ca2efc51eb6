// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::ControllerConfig;
use crate::errors::Result;
use crate::store::UnitSpec;
use crate::types::{Admission, PermitDecision, UnitName, UnitStatus};
use crate::wake::{ReleaseBackend, TokioSweepTimer};

use super::controller::Controller;
use super::core::CoreController;
use super::{RuntimeEvent, UnitEvent};

/// Drives the controller in response to `RuntimeEvent`s, and delegates
/// released units to a `ReleaseBackend`.
///
/// This is a pure IO shell around `Controller`, which holds all the
/// admission and permit semantics. This struct handles async IO: reading
/// events from the channel, replying to host requests, and invoking the
/// release callback.
pub struct Runtime<R: ReleaseBackend> {
    controller: Controller,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    release: R,
}

impl<R: ReleaseBackend> fmt::Debug for Runtime<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("controller", &self.controller)
            .finish_non_exhaustive()
    }
}

impl<R: ReleaseBackend> Runtime<R> {
    pub fn new(
        controller: Controller,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        release: R,
    ) -> Self {
        Self {
            controller,
            event_rx,
            release,
        }
    }

    /// Wire up a runtime with a Tokio sweep timer posting into its own
    /// event channel. Returns the runtime and a handle for the host.
    pub fn build(
        config: ControllerConfig,
        clock: Arc<dyn Clock>,
        release: R,
        capacity: usize,
    ) -> (Self, RuntimeHandle) {
        let (tx, rx) = mpsc::channel(capacity);
        let timer = Arc::new(TokioSweepTimer::new(tx.clone()));
        let controller = Controller::new(CoreController::new(config, clock), timer);
        (Self::new(controller, rx, release), RuntimeHandle::new(tx))
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Main event loop.
    ///
    /// - Consumes `RuntimeEvent`s from `event_rx`.
    /// - Feeds them into the controller and answers host requests.
    /// - Hands units released by sweeps to the release backend.
    pub async fn run(mut self) -> Result<()> {
        info!("depgate runtime started");

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            let released = match event {
                RuntimeEvent::Unit(unit_event) => self.controller.apply(unit_event),
                RuntimeEvent::SweepDue { reason } => self.controller.sweep(&reason),
                RuntimeEvent::Evaluate { spec, reply } => {
                    reply_with(reply, self.controller.evaluate(&spec));
                    Vec::new()
                }
                RuntimeEvent::Admit { unit, reply } => {
                    reply_with(reply, self.controller.admit(&unit));
                    Vec::new()
                }
                RuntimeEvent::Permit { unit, reply } => {
                    reply_with(reply, self.controller.permit(&unit));
                    Vec::new()
                }
                RuntimeEvent::Sync { reply } => {
                    reply_with(reply, self.controller.waiting_count());
                    Vec::new()
                }
                RuntimeEvent::ShutdownRequested => {
                    info!("shutdown requested; stopping runtime");
                    break;
                }
            };

            // The units are already out of the waiting set; a failed
            // callback loses this release but must not stop the controller.
            if let Err(e) = self.release_ready(released).await {
                warn!(error = %e, "release callback failed; continuing");
            }
        }

        info!("runtime exiting");
        Ok(())
    }

    async fn release_ready(&mut self, units: Vec<UnitName>) -> Result<()> {
        if units.is_empty() {
            return Ok(());
        }

        debug!(?units, "releasing units");
        self.release.release_units(units).await
    }
}

fn reply_with<T>(reply: oneshot::Sender<T>, value: T) {
    if reply.send(value).is_err() {
        debug!("requester dropped before reply was sent");
    }
}

/// Cloneable host-side handle to a running [`Runtime`].
///
/// Every call is queued on the runtime's event channel, so host requests and
/// lifecycle events are handled in the order they were sent.
#[derive(Debug, Clone)]
pub struct RuntimeHandle {
    tx: mpsc::Sender<RuntimeEvent>,
}

impl RuntimeHandle {
    pub fn new(tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self { tx }
    }

    /// Raw sender, for feeding the runtime from an adapter task.
    pub fn sender(&self) -> mpsc::Sender<RuntimeEvent> {
        self.tx.clone()
    }

    pub async fn observe(&self, spec: UnitSpec, status: UnitStatus) -> Result<()> {
        self.send(RuntimeEvent::Unit(UnitEvent::Observed { spec, status }))
            .await
    }

    pub async fn transition(&self, unit: impl Into<UnitName>, status: UnitStatus) -> Result<()> {
        self.send(RuntimeEvent::Unit(UnitEvent::Transitioned {
            unit: unit.into(),
            status,
        }))
        .await
    }

    pub async fn remove(&self, unit: impl Into<UnitName>) -> Result<()> {
        self.send(RuntimeEvent::Unit(UnitEvent::Removed { unit: unit.into() }))
            .await
    }

    pub async fn evaluate(&self, spec: UnitSpec) -> Result<Admission> {
        let (reply, rx) = oneshot::channel();
        self.send(RuntimeEvent::Evaluate { spec, reply }).await?;
        await_reply(rx).await?
    }

    pub async fn admit(&self, unit: impl Into<UnitName>) -> Result<Admission> {
        let (reply, rx) = oneshot::channel();
        self.send(RuntimeEvent::Admit {
            unit: unit.into(),
            reply,
        })
        .await?;
        await_reply(rx).await?
    }

    pub async fn permit(&self, unit: impl Into<UnitName>) -> Result<PermitDecision> {
        let (reply, rx) = oneshot::channel();
        self.send(RuntimeEvent::Permit {
            unit: unit.into(),
            reply,
        })
        .await?;
        await_reply(rx).await?
    }

    /// Wait until every event sent before this call has been handled.
    /// Returns the number of units held at the permit checkpoint.
    pub async fn sync(&self) -> Result<usize> {
        let (reply, rx) = oneshot::channel();
        self.send(RuntimeEvent::Sync { reply }).await?;
        await_reply(rx).await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(RuntimeEvent::ShutdownRequested).await
    }

    async fn send(&self, event: RuntimeEvent) -> Result<()> {
        self.tx
            .send(event)
            .await
            .map_err(|_| anyhow!("depgate runtime is not running"))?;
        Ok(())
    }
}

async fn await_reply<T>(rx: oneshot::Receiver<T>) -> Result<T> {
    Ok(rx
        .await
        .map_err(|_| anyhow!("depgate runtime stopped before replying"))?)
}
