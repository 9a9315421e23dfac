// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil-rs

//! Engine handle - the imperative surface handed to presentation shells

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};

use crate::backend::{EventAction, SafeZone};
use crate::detectors::{MotionSample, PositionFix};

use super::engine::{Capability, EngineInput};
use super::event_bus::{EventBus, Notice};
use super::state::Snapshot;

/// The engine's input queue is gone; the session has ended.
#[derive(Debug, Error)]
#[error("engine is not running")]
pub struct EngineStopped;

/// Cheap cloneable handle to a running engine. Both client shells are
/// built exclusively against this surface, which is what guarantees they
/// cannot drift behaviorally.
#[derive(Clone)]
pub struct EngineHandle {
    input_tx: mpsc::Sender<EngineInput>,
    snapshot_rx: watch::Receiver<Snapshot>,
    bus: Arc<EventBus>,
}

impl EngineHandle {
    pub(crate) fn new(
        input_tx: mpsc::Sender<EngineInput>,
        snapshot_rx: watch::Receiver<Snapshot>,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            input_tx,
            snapshot_rx,
            bus,
        }
    }

    async fn send(&self, input: EngineInput) -> Result<(), EngineStopped> {
        self.input_tx.send(input).await.map_err(|_| EngineStopped)
    }

    /// Manual emergency button.
    pub async fn trigger_sos(&self) -> Result<(), EngineStopped> {
        self.send(EngineInput::Sos).await
    }

    /// "All good" press: claims liveness via a heartbeat and clears any
    /// open fall prompt.
    pub async fn confirm_ok(&self) -> Result<(), EngineStopped> {
        self.send(EngineInput::ConfirmOk).await
    }

    /// Dismiss an open fall prompt without any network traffic.
    pub async fn dismiss_fall_prompt(&self) -> Result<(), EngineStopped> {
        self.send(EngineInput::DismissFallPrompt).await
    }

    /// Feed one motion magnitude sample.
    pub async fn submit_motion(&self, sample: MotionSample) -> Result<(), EngineStopped> {
        self.send(EngineInput::Motion(sample)).await
    }

    /// Feed one position fix.
    pub async fn submit_position(&self, fix: PositionFix) -> Result<(), EngineStopped> {
        self.send(EngineInput::Position(fix)).await
    }

    /// Store a new safe zone on the backend and adopt it on success.
    pub async fn set_safe_zone(&self, zone: SafeZone) -> Result<(), EngineStopped> {
        self.send(EngineInput::SetZoneRequest(zone)).await
    }

    /// Resolve an open incident; on success the engine reconciles with
    /// the server immediately.
    pub async fn resolve_incident(
        &self,
        id: i64,
        action: EventAction,
    ) -> Result<(), EngineStopped> {
        self.send(EngineInput::ResolveIncident { id, action }).await
    }

    /// Report that the platform denied a capability for this session.
    pub async fn report_permission_denied(
        &self,
        capability: Capability,
    ) -> Result<(), EngineStopped> {
        self.send(EngineInput::PermissionDenied(capability)).await
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Watch channel of snapshots, for reactive shells.
    pub fn subscribe_snapshots(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_rx.clone()
    }

    /// Broadcast channel of notices (status changes, incidents, errors).
    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.bus.subscribe_notices()
    }
}
