// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil-rs

//! Engine runtime - one task, one logical event queue
//!
//! All components react to discrete events delivered here in sequence, so
//! the transition rules never race and need no locking. Backend calls are
//! spawned off the loop; their outcomes re-enter the queue as inputs, and
//! while one is pending the loop keeps draining samples, fixes and ticks.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info};

use crate::backend::EventBackend;
use crate::config::Config;
use crate::session::SessionContext;

use super::engine::{Effect, EngineInput, SafetyMonitor};
use super::event_bus::EventBus;
use super::handle::EngineHandle;
use super::state::Snapshot;

const INPUT_QUEUE_CAPACITY: usize = 256;

/// Display vitals are recomputed on their own fixed cadence, slower than
/// the engine tick.
const VITALS_REFRESH_PERIOD: Duration = Duration::from_secs(2);

/// Holds the last recomputed display vitals between refreshes, so the
/// published values change at most once per [`VITALS_REFRESH_PERIOD`]
/// while everything else in the snapshot stays live.
struct VitalsCache {
    display_heart_rate: u32,
    measure_percent: u32,
    refreshed_at: Option<Instant>,
}

impl Default for VitalsCache {
    fn default() -> Self {
        let initial = Snapshot::default();
        Self {
            display_heart_rate: initial.display_heart_rate,
            measure_percent: initial.measure_percent,
            refreshed_at: None,
        }
    }
}

impl VitalsCache {
    fn apply(&mut self, snapshot: &mut Snapshot, now: Instant) {
        match self.refreshed_at {
            Some(at) if now < at + VITALS_REFRESH_PERIOD => {
                snapshot.display_heart_rate = self.display_heart_rate;
                snapshot.measure_percent = self.measure_percent;
            }
            _ => {
                self.refreshed_at = Some(now);
                self.display_heart_rate = snapshot.display_heart_rate;
                self.measure_percent = snapshot.measure_percent;
            }
        }
    }
}

/// Drives a [`SafetyMonitor`] against real time and a real backend.
pub struct EngineRuntime {
    monitor: SafetyMonitor,
    backend: Arc<dyn EventBackend>,
    bus: Arc<EventBus>,
    input_rx: mpsc::Receiver<EngineInput>,
    input_tx: mpsc::Sender<EngineInput>,
    snapshot_tx: watch::Sender<Snapshot>,
    last_published: Snapshot,
    vitals: VitalsCache,
}

impl EngineRuntime {
    /// Build a runtime plus the handle the shells talk through.
    pub fn new(
        config: &Config,
        session: &SessionContext,
        backend: Arc<dyn EventBackend>,
        bus: Arc<EventBus>,
    ) -> (Self, EngineHandle) {
        let (input_tx, input_rx) = mpsc::channel(INPUT_QUEUE_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::default());
        let handle = EngineHandle::new(input_tx.clone(), snapshot_rx, bus.clone());
        let runtime = Self {
            monitor: SafetyMonitor::new(config, session.role, Instant::now()),
            backend,
            bus,
            input_rx,
            input_tx,
            snapshot_tx,
            last_published: Snapshot::default(),
            vitals: VitalsCache::default(),
        };
        (runtime, handle)
    }

    /// Run until the shutdown channel fires. Teardown is synchronous with
    /// the loop: once this returns, no timer or detector of this session
    /// can fire again.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        info!("starting safety engine");

        // Authoritative state first: one poll and the zone, up front.
        self.spawn_poll();
        self.spawn_zone_load();

        let mut tick = tokio::time::interval(Duration::from_secs(1));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = tick.tick() => self.step(EngineInput::Tick),
                Some(input) = self.input_rx.recv() => self.step(input),
                _ = shutdown.recv() => {
                    self.step(EngineInput::Shutdown);
                    break;
                }
            }
        }

        info!("safety engine stopped");
        Ok(())
    }

    fn step(&mut self, input: EngineInput) {
        let now = Instant::now();
        let before = self.monitor.status();

        let effects = self.monitor.handle(input, now);
        for effect in effects {
            self.dispatch(effect);
        }

        let after = self.monitor.status();
        if before != after {
            self.bus.publish_status_change(before, after);
        }

        let mut snapshot = self.monitor.snapshot(now);
        self.vitals.apply(&mut snapshot, now);
        if snapshot.last_error != self.last_published.last_error {
            if let Some(message) = &snapshot.last_error {
                self.bus.publish_error(message);
            }
        }
        self.last_published = snapshot.clone();
        self.bus.publish_snapshot(snapshot.clone());
        let _ = self.snapshot_tx.send(snapshot);
    }

    fn dispatch(&mut self, effect: Effect) {
        match effect {
            Effect::SendHeartbeat => {
                debug!("dispatching heartbeat");
                let backend = self.backend.clone();
                let tx = self.input_tx.clone();
                tokio::spawn(async move {
                    let result = backend.post_heartbeat().await;
                    let _ = tx.send(EngineInput::HeartbeatOutcome(result)).await;
                });
            }
            Effect::Emit(event) => {
                debug!(kind = event.kind.as_str(), "dispatching incident report");
                self.bus.publish_incident(event.clone());
                let backend = self.backend.clone();
                let tx = self.input_tx.clone();
                tokio::spawn(async move {
                    let result = backend.post_event(event.kind).await;
                    let _ = tx
                        .send(EngineInput::EmissionOutcome {
                            kind: event.kind,
                            result,
                        })
                        .await;
                });
            }
            Effect::Poll => self.spawn_poll(),
            Effect::Resolve { id, action } => {
                let backend = self.backend.clone();
                let tx = self.input_tx.clone();
                tokio::spawn(async move {
                    let result = backend.act_on_event(id, action).await;
                    let _ = tx.send(EngineInput::ResolveOutcome(result)).await;
                });
            }
            Effect::StoreZone(zone) => {
                let backend = self.backend.clone();
                let tx = self.input_tx.clone();
                tokio::spawn(async move {
                    let result = backend.set_safe_zone(zone).await;
                    let _ = tx.send(EngineInput::ZoneOutcome(result)).await;
                });
            }
        }
    }

    fn spawn_poll(&self) {
        let backend = self.backend.clone();
        let tx = self.input_tx.clone();
        tokio::spawn(async move {
            let result = backend.list_events().await;
            let _ = tx.send(EngineInput::PollOutcome(result)).await;
        });
    }

    fn spawn_zone_load(&self) {
        let backend = self.backend.clone();
        let tx = self.input_tx.clone();
        tokio::spawn(async move {
            match backend.get_safe_zone().await {
                Ok(zone) => {
                    let _ = tx.send(EngineInput::ZoneLoaded(zone)).await;
                }
                Err(err) => {
                    debug!(error = %err, "initial safe zone load failed");
                }
            }
        });
    }
}
