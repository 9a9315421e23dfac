// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil-rs

//! Safety monitor - the transition rules fusing all signal sources
//!
//! Every raw edge signal, user intent and network outcome is normalized
//! into [`EngineInput`] and applied here against one authoritative
//! [`SafetyState`]. The monitor is synchronous and takes its clock as an
//! argument, so the full transition table runs under a simulated clock in
//! tests. Side effects come back to the caller as [`Effect`] values; the
//! runtime carries them out.

use std::collections::HashSet;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::backend::{BackendError, EventAction, EventKind, EventRecord, SafeZone};
use crate::config::Config;
use crate::detectors::{
    vitals, FallDetector, GeofenceMonitor, HeartbeatScheduler, MotionSample, PositionFix,
};
use crate::session::Role;

use super::escalator::AlertEscalator;
use super::state::{MonitoringEvent, SafetyState, SafetyStatus, Snapshot};

/// A platform capability a detector depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Motion/acceleration sampling.
    Motion,
    /// Location fixes.
    Location,
}

/// Normalized inputs to the transition rules.
#[derive(Debug)]
pub enum EngineInput {
    /// Engine clock tick; drives every deadline-based component.
    Tick,
    /// Manual SOS press.
    Sos,
    /// One motion magnitude sample.
    Motion(MotionSample),
    /// One position fix.
    Position(PositionFix),
    /// Explicit "all good" press: claims liveness through a heartbeat.
    ConfirmOk,
    /// "I'm OK" response to an open fall prompt.
    DismissFallPrompt,
    /// Request to store a new safe zone.
    SetZoneRequest(SafeZone),
    /// Request to resolve an open incident (the caregiver's verdict).
    ResolveIncident {
        /// Server id of the record.
        id: i64,
        /// Confirm or cancel.
        action: EventAction,
    },
    /// Outcome of an in-flight heartbeat post.
    HeartbeatOutcome(Result<(), BackendError>),
    /// Outcome of an in-flight incident emission.
    EmissionOutcome {
        /// Which kind was being emitted.
        kind: EventKind,
        /// What the backend said.
        result: Result<EventRecord, BackendError>,
    },
    /// Outcome of a reconciliation poll.
    PollOutcome(Result<Vec<EventRecord>, BackendError>),
    /// Safe zone loaded (or replaced) from the backend.
    ZoneLoaded(Option<SafeZone>),
    /// Outcome of a zone store request.
    ZoneOutcome(Result<SafeZone, BackendError>),
    /// Outcome of an incident resolution request.
    ResolveOutcome(Result<EventRecord, BackendError>),
    /// A platform capability was denied for this session.
    PermissionDenied(Capability),
    /// Session teardown: stop every timer, emit nothing further.
    Shutdown,
}

/// Side effects for the runtime to execute asynchronously.
#[derive(Debug, Clone)]
pub enum Effect {
    /// Post a liveness heartbeat.
    SendHeartbeat,
    /// Report an incident to the backend.
    Emit(MonitoringEvent),
    /// Fetch the incident list for reconciliation.
    Poll,
    /// Store a safe zone on the backend.
    StoreZone(SafeZone),
    /// Resolve an open incident on the backend.
    Resolve {
        /// Server id of the record.
        id: i64,
        /// Confirm or cancel.
        action: EventAction,
    },
}

/// The concurrent safety-state machine.
pub struct SafetyMonitor {
    role: Role,
    state: SafetyState,
    fall: FallDetector,
    geofence: GeofenceMonitor,
    heartbeat: HeartbeatScheduler,
    escalator: AlertEscalator,
    poll_schedule: HeartbeatScheduler,

    heartbeat_in_flight: bool,
    poll_in_flight: bool,
    /// Emissions currently on the wire, per kind.
    in_flight: HashSet<EventKind>,
    /// Emissions acknowledged by the backend but not yet seen by a poll;
    /// suppresses re-reporting the same kind.
    reported: HashSet<EventKind>,
    denied: HashSet<Capability>,
    shutdown: bool,
}

impl SafetyMonitor {
    /// Build the machine for one session. Detector enablement is derived
    /// from the role here, once, for every shell alike.
    pub fn new(config: &Config, role: Role, now: Instant) -> Self {
        let monitored = role.is_monitored();
        Self {
            role,
            state: SafetyState::new(now),
            fall: FallDetector::new(
                config.fall.threshold,
                config.fall.settle_period(),
                monitored,
            ),
            geofence: GeofenceMonitor::new(monitored),
            heartbeat: HeartbeatScheduler::new(config.engine.heartbeat_period(), now, monitored),
            escalator: AlertEscalator::new(config.engine.countdown_duration()),
            // The reconciliation poll runs for every role.
            poll_schedule: HeartbeatScheduler::new(config.engine.poll_period(), now, true),
            heartbeat_in_flight: false,
            poll_in_flight: false,
            in_flight: HashSet::new(),
            reported: HashSet::new(),
            denied: HashSet::new(),
            shutdown: false,
        }
    }

    /// Apply one input, returning the side effects to execute.
    pub fn handle(&mut self, input: EngineInput, now: Instant) -> Vec<Effect> {
        if self.shutdown {
            return Vec::new();
        }
        match input {
            EngineInput::Tick => self.on_tick(now),
            EngineInput::Sos => self.on_sos(now),
            EngineInput::Motion(sample) => {
                self.fall.on_sample(now, sample.magnitude);
                Vec::new()
            }
            EngineInput::Position(fix) => self.on_position(&fix),
            EngineInput::ConfirmOk => self.on_confirm_ok(),
            EngineInput::DismissFallPrompt => {
                self.dismiss_warning();
                Vec::new()
            }
            EngineInput::SetZoneRequest(zone) => self.on_set_zone_request(zone),
            EngineInput::ResolveIncident { id, action } => {
                vec![Effect::Resolve { id, action }]
            }
            EngineInput::ResolveOutcome(result) => self.on_resolve_outcome(result),
            EngineInput::HeartbeatOutcome(result) => {
                self.on_heartbeat_outcome(result, now);
                Vec::new()
            }
            EngineInput::EmissionOutcome { kind, result } => {
                self.on_emission_outcome(kind, result);
                Vec::new()
            }
            EngineInput::PollOutcome(result) => {
                self.on_poll_outcome(result);
                Vec::new()
            }
            EngineInput::ZoneLoaded(zone) => {
                self.geofence.set_zone(zone);
                Vec::new()
            }
            EngineInput::ZoneOutcome(result) => {
                match result {
                    Ok(zone) => self.geofence.set_zone(Some(zone)),
                    Err(err) => self.note_error(&err),
                }
                Vec::new()
            }
            EngineInput::PermissionDenied(capability) => {
                self.on_permission_denied(capability);
                Vec::new()
            }
            EngineInput::Shutdown => {
                self.teardown();
                Vec::new()
            }
        }
    }

    fn on_tick(&mut self, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();

        if self.fall.poll(now) {
            self.on_fall_candidate(now);
        }

        if self.escalator.poll(now) {
            // Countdown ran out with no confirmation: escalate.
            if self.state.status == SafetyStatus::Warning {
                info!("fall confirmation window expired, escalating");
                self.state.status = SafetyStatus::Alert;
                effects.extend(self.emit(EventKind::Fall));
            }
        }

        if self.heartbeat.poll(now) && !self.heartbeat_in_flight {
            self.heartbeat_in_flight = true;
            effects.push(Effect::SendHeartbeat);
        }

        if self.poll_schedule.poll(now) && !self.poll_in_flight {
            self.poll_in_flight = true;
            effects.push(Effect::Poll);
        }

        effects
    }

    fn on_fall_candidate(&mut self, now: Instant) {
        match self.state.status {
            // Single-countdown invariant: the open window owns judgement.
            SafetyStatus::Warning => {
                debug!("fall candidate ignored, confirmation window already open");
            }
            // Nothing leaves ALERT automatically, including new candidates.
            SafetyStatus::Alert => {
                debug!("fall candidate ignored while in alert");
            }
            SafetyStatus::Ok => {
                info!("candidate fall, opening confirmation window");
                self.escalator.start(now);
                self.state.status = SafetyStatus::Warning;
            }
        }
    }

    fn on_sos(&mut self, now: Instant) -> Vec<Effect> {
        if !self.role.is_monitored() {
            return Vec::new();
        }
        info!("manual SOS");
        // Pressing SOS is itself proof of liveness.
        self.state.last_heartbeat_at = now;
        let effects = self.emit(EventKind::Sos);
        self.enter_alert();
        effects
    }

    fn on_position(&mut self, fix: &PositionFix) -> Vec<Effect> {
        if !self.geofence.check(fix) {
            return Vec::new();
        }
        info!(
            latitude = fix.point.latitude,
            longitude = fix.point.longitude,
            "safe zone breach"
        );
        let effects = self.emit(EventKind::GeofenceExit);
        self.enter_alert();
        effects
    }

    fn on_confirm_ok(&mut self) -> Vec<Effect> {
        if !self.role.is_monitored() {
            return Vec::new();
        }
        self.dismiss_warning();
        if self.heartbeat_in_flight {
            return Vec::new();
        }
        self.heartbeat_in_flight = true;
        vec![Effect::SendHeartbeat]
    }

    fn dismiss_warning(&mut self) {
        if self.state.status == SafetyStatus::Warning {
            info!("fall prompt dismissed by user");
            self.escalator.cancel();
            self.state.status = SafetyStatus::Ok;
        }
    }

    fn on_set_zone_request(&mut self, zone: SafeZone) -> Vec<Effect> {
        if !self.role.is_monitored() {
            return Vec::new();
        }
        if !zone.is_valid_geometry() {
            warn!("refusing to store safe zone with invalid geometry");
            self.state.last_error = Some("invalid safe zone geometry".to_string());
            return Vec::new();
        }
        vec![Effect::StoreZone(zone)]
    }

    fn on_heartbeat_outcome(&mut self, result: Result<(), BackendError>, now: Instant) {
        self.heartbeat_in_flight = false;
        match result {
            Ok(()) => {
                self.state.last_heartbeat_at = now;
                self.state.last_error = None;
                if self.state.status != SafetyStatus::Alert {
                    // A heartbeat also closes open incidents server-side,
                    // so a pending confirmation window is moot.
                    self.escalator.cancel();
                    self.state.status = SafetyStatus::Ok;
                }
            }
            Err(err) => {
                // A failed heartbeat must never silently claim liveness.
                warn!(error = %err, "heartbeat failed");
                self.note_error(&err);
            }
        }
    }

    fn on_emission_outcome(&mut self, kind: EventKind, result: Result<EventRecord, BackendError>) {
        self.in_flight.remove(&kind);
        match result {
            Ok(record) => {
                debug!(id = record.id, kind = kind.as_str(), "incident stored");
                self.reported.insert(kind);
                self.state.open_events.insert(0, record);
            }
            Err(err) => {
                // Nothing reached the server; the next signal of this
                // kind may try again on its own schedule.
                warn!(kind = kind.as_str(), error = %err, "incident emission failed");
                self.reported.remove(&kind);
                self.note_error(&err);
            }
        }
    }

    fn on_poll_outcome(&mut self, result: Result<Vec<EventRecord>, BackendError>) {
        self.poll_in_flight = false;
        match result {
            Ok(events) => {
                // Suppression ends for kinds the server no longer shows open.
                let open: HashSet<EventKind> = events
                    .iter()
                    .filter(|e| e.is_open())
                    .map(|e| e.kind)
                    .collect();
                self.reported.retain(|kind| open.contains(kind));

                let any_open = !open.is_empty();
                self.state.open_events = events;
                self.state.last_error = None;

                // Server state always wins on reconciliation.
                if any_open {
                    if self.state.status != SafetyStatus::Alert {
                        info!("poll shows open incident, entering alert");
                    }
                    self.enter_alert();
                } else if self.state.status != SafetyStatus::Ok {
                    info!("poll shows no open incidents, resolving to ok");
                    self.escalator.cancel();
                    self.state.status = SafetyStatus::Ok;
                }
            }
            Err(err) => self.note_error(&err),
        }
    }

    fn on_resolve_outcome(&mut self, result: Result<EventRecord, BackendError>) -> Vec<Effect> {
        match result {
            Ok(record) => {
                debug!(id = record.id, "incident resolved");
                if let Some(local) = self.state.open_events.iter_mut().find(|e| e.id == record.id)
                {
                    *local = record;
                }
                // Resolution changes the server's verdict; reconcile now
                // instead of waiting out the poll period.
                if self.poll_in_flight {
                    return Vec::new();
                }
                self.poll_in_flight = true;
                vec![Effect::Poll]
            }
            Err(err) => {
                self.note_error(&err);
                Vec::new()
            }
        }
    }

    fn on_permission_denied(&mut self, capability: Capability) {
        if !self.denied.insert(capability) {
            return;
        }
        let (name, message) = match capability {
            Capability::Motion => {
                self.fall.disable();
                ("motion", "motion permission denied, fall detection off")
            }
            Capability::Location => {
                self.geofence.disable();
                ("location", "location permission denied, geofencing off")
            }
        };
        warn!(capability = name, "platform capability denied for session");
        self.state.last_error = Some(message.to_string());
    }

    /// Move to ALERT; any confirmation countdown is moot from here since
    /// nothing leaves ALERT until the server reconciles it away.
    fn enter_alert(&mut self) {
        self.escalator.cancel();
        self.state.status = SafetyStatus::Alert;
    }

    /// Request an emission unless one of this kind is on the wire or
    /// already acknowledged and awaiting reconciliation.
    fn emit(&mut self, kind: EventKind) -> Vec<Effect> {
        if self.in_flight.contains(&kind) || self.reported.contains(&kind) {
            debug!(kind = kind.as_str(), "emission suppressed, duplicate");
            return Vec::new();
        }
        self.in_flight.insert(kind);
        vec![Effect::Emit(MonitoringEvent::new(kind))]
    }

    fn note_error(&mut self, err: &BackendError) {
        self.state.last_error = Some(err.to_string());
    }

    fn teardown(&mut self) {
        info!("session teardown, stopping all timers");
        self.shutdown = true;
        self.heartbeat.cancel();
        self.poll_schedule.cancel();
        self.escalator.cancel();
        self.fall.disable();
        self.geofence.disable();
    }

    /// Current verdict.
    pub fn status(&self) -> SafetyStatus {
        self.state.status
    }

    /// Most recent transient error, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.state.last_error.as_deref()
    }

    /// Whether any timer could still fire (invariant check in tests).
    pub fn has_live_timers(&self) -> bool {
        self.heartbeat.is_active()
            || self.poll_schedule.is_active()
            || self.escalator.is_active()
            || self.fall.is_settling()
    }

    /// Read-only view for the shells, computed against `now`.
    pub fn snapshot(&self, now: Instant) -> Snapshot {
        let minutes = now
            .saturating_duration_since(self.state.last_heartbeat_at)
            .as_secs()
            / 60;
        Snapshot {
            status: self.state.status,
            countdown_remaining_seconds: self.escalator.remaining_seconds(now),
            display_heart_rate: vitals::display_rate(self.state.status, minutes),
            measure_percent: vitals::measure_percent(minutes),
            last_error: self.state.last_error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::EventStatus;
    use crate::detectors::GeoPoint;
    use chrono::Utc;
    use std::time::Duration;

    fn monitor() -> (SafetyMonitor, Instant) {
        let base = Instant::now();
        (SafetyMonitor::new(&Config::default(), Role::User, base), base)
    }

    fn t(base: Instant, secs: u64) -> Instant {
        base + Duration::from_secs(secs)
    }

    fn emitted_kinds(effects: &[Effect]) -> Vec<EventKind> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Emit(ev) => Some(ev.kind),
                _ => None,
            })
            .collect()
    }

    fn open_record(id: i64, kind: EventKind) -> EventRecord {
        EventRecord {
            id,
            kind,
            status: EventStatus::Open,
            created_at: Utc::now(),
        }
    }

    fn zone() -> SafeZone {
        SafeZone::centered(GeoPoint::new(45.0, 9.0), 200)
    }

    fn fix_outside() -> PositionFix {
        // ~250 m north of the zone center.
        PositionFix::at(GeoPoint::new(45.0 + 250.0 / 111_195.0, 9.0))
    }

    fn fix_inside() -> PositionFix {
        PositionFix::at(GeoPoint::new(45.0 + 150.0 / 111_195.0, 9.0))
    }

    #[test]
    fn sos_goes_straight_to_alert() {
        let (mut m, base) = monitor();
        let effects = m.handle(EngineInput::Sos, base);
        assert_eq!(emitted_kinds(&effects), vec![EventKind::Sos]);
        assert_eq!(m.status(), SafetyStatus::Alert);
    }

    #[test]
    fn caregiver_session_generates_no_signals() {
        let base = Instant::now();
        let mut m = SafetyMonitor::new(&Config::default(), Role::Caregiver, base);

        assert!(m.handle(EngineInput::Sos, base).is_empty());
        m.handle(EngineInput::Motion(MotionSample::new(99.0)), base);
        m.handle(EngineInput::ZoneLoaded(Some(zone())), base);
        assert!(m
            .handle(EngineInput::Position(fix_outside()), t(base, 1))
            .is_empty());

        // No heartbeat across two full periods either.
        let mut effects = Vec::new();
        for s in (0..2 * 45 * 60).step_by(60) {
            effects.extend(m.handle(EngineInput::Tick, t(base, s)));
        }
        assert!(!effects.iter().any(|e| matches!(e, Effect::SendHeartbeat)));
        assert_eq!(m.status(), SafetyStatus::Ok);
    }

    #[test]
    fn fall_escalation_end_to_end() {
        let (mut m, base) = monitor();

        // Spike, then 30 s of stillness.
        m.handle(EngineInput::Motion(MotionSample::new(30.0)), base);
        assert!(m.handle(EngineInput::Tick, t(base, 29)).is_empty());
        m.handle(EngineInput::Tick, t(base, 30));
        assert_eq!(m.status(), SafetyStatus::Warning);
        assert_eq!(
            m.snapshot(t(base, 30)).countdown_remaining_seconds,
            Some(30)
        );

        // 29 ticks of the window pass without confirmation.
        for s in 31..60 {
            assert!(m.handle(EngineInput::Tick, t(base, s)).is_empty());
            assert_eq!(m.status(), SafetyStatus::Warning);
        }

        // The 30th second escalates: exactly one FALL emission.
        let effects = m.handle(EngineInput::Tick, t(base, 60));
        assert_eq!(emitted_kinds(&effects), vec![EventKind::Fall]);
        assert_eq!(m.status(), SafetyStatus::Alert);
    }

    #[test]
    fn dismissal_mid_countdown_cancels_without_emission() {
        let (mut m, base) = monitor();
        m.handle(EngineInput::Motion(MotionSample::new(30.0)), base);
        m.handle(EngineInput::Tick, t(base, 30));
        assert_eq!(m.status(), SafetyStatus::Warning);

        // Confirm at tick 15 of the window.
        m.handle(EngineInput::DismissFallPrompt, t(base, 45));
        assert_eq!(m.status(), SafetyStatus::Ok);
        assert_eq!(m.snapshot(t(base, 45)).countdown_remaining_seconds, None);

        // Well past the old deadline: nothing fires.
        let effects = m.handle(EngineInput::Tick, t(base, 90));
        assert!(emitted_kinds(&effects).is_empty());
        assert_eq!(m.status(), SafetyStatus::Ok);
    }

    #[test]
    fn single_countdown_invariant() {
        let mut config = Config::default();
        // Longer window than the settle period so a second candidate can
        // land while the first window is still open.
        config.engine.countdown_seconds = 90;
        let base = Instant::now();
        let mut m = SafetyMonitor::new(&config, Role::User, base);

        m.handle(EngineInput::Motion(MotionSample::new(30.0)), base);
        m.handle(EngineInput::Tick, t(base, 30));
        assert_eq!(m.status(), SafetyStatus::Warning);

        // Second candidate at t=61, mid-window.
        m.handle(EngineInput::Motion(MotionSample::new(30.0)), t(base, 31));
        m.handle(EngineInput::Tick, t(base, 61));
        assert_eq!(m.status(), SafetyStatus::Warning);
        // Deadline unchanged: still the first window (30 + 90 = 120).
        assert_eq!(
            m.snapshot(t(base, 61)).countdown_remaining_seconds,
            Some(59)
        );

        // Expiry of the one window emits exactly one FALL.
        let mut emissions = Vec::new();
        for s in 62..=130 {
            emissions.extend(emitted_kinds(&m.handle(EngineInput::Tick, t(base, s))));
        }
        assert_eq!(emissions, vec![EventKind::Fall]);
    }

    #[test]
    fn geofence_breach_emits_and_alerts() {
        let (mut m, base) = monitor();
        m.handle(EngineInput::ZoneLoaded(Some(zone())), base);

        assert!(m
            .handle(EngineInput::Position(fix_inside()), t(base, 1))
            .is_empty());
        assert_eq!(m.status(), SafetyStatus::Ok);

        let effects = m.handle(EngineInput::Position(fix_outside()), t(base, 2));
        assert_eq!(emitted_kinds(&effects), vec![EventKind::GeofenceExit]);
        assert_eq!(m.status(), SafetyStatus::Alert);
    }

    #[test]
    fn breach_without_zone_is_ignored() {
        let (mut m, base) = monitor();
        assert!(m
            .handle(EngineInput::Position(fix_outside()), base)
            .is_empty());
        assert_eq!(m.status(), SafetyStatus::Ok);
    }

    #[test]
    fn duplicate_emissions_suppressed_until_poll_clears() {
        let (mut m, base) = monitor();
        m.handle(EngineInput::ZoneLoaded(Some(zone())), base);

        // First breach emits; repeats while in flight do not.
        let first = m.handle(EngineInput::Position(fix_outside()), t(base, 1));
        assert_eq!(emitted_kinds(&first).len(), 1);
        assert!(m
            .handle(EngineInput::Position(fix_outside()), t(base, 2))
            .is_empty());

        // Acknowledged but not yet reconciled: still suppressed.
        m.handle(
            EngineInput::EmissionOutcome {
                kind: EventKind::GeofenceExit,
                result: Ok(open_record(1, EventKind::GeofenceExit)),
            },
            t(base, 3),
        );
        assert!(m
            .handle(EngineInput::Position(fix_outside()), t(base, 4))
            .is_empty());

        // Poll still shows the record open: suppression holds.
        m.handle(
            EngineInput::PollOutcome(Ok(vec![open_record(1, EventKind::GeofenceExit)])),
            t(base, 5),
        );
        assert!(m
            .handle(EngineInput::Position(fix_outside()), t(base, 6))
            .is_empty());
        assert_eq!(m.status(), SafetyStatus::Alert);

        // Server resolved it: status clears and a fresh breach reports again.
        m.handle(EngineInput::PollOutcome(Ok(Vec::new())), t(base, 7));
        assert_eq!(m.status(), SafetyStatus::Ok);
        let again = m.handle(EngineInput::Position(fix_outside()), t(base, 8));
        assert_eq!(emitted_kinds(&again), vec![EventKind::GeofenceExit]);
    }

    #[test]
    fn failed_emission_clears_suppression_for_retry() {
        let (mut m, base) = monitor();
        m.handle(EngineInput::ZoneLoaded(Some(zone())), base);
        m.handle(EngineInput::Position(fix_outside()), t(base, 1));

        m.handle(
            EngineInput::EmissionOutcome {
                kind: EventKind::GeofenceExit,
                result: Err(BackendError::Transport("boom".to_string())),
            },
            t(base, 2),
        );
        assert!(m.last_error().is_some());

        // The next breach retries.
        let retry = m.handle(EngineInput::Position(fix_outside()), t(base, 3));
        assert_eq!(emitted_kinds(&retry), vec![EventKind::GeofenceExit]);
    }

    #[test]
    fn empty_poll_cancels_countdown_without_emitting() {
        let (mut m, base) = monitor();
        m.handle(EngineInput::Motion(MotionSample::new(30.0)), base);
        m.handle(EngineInput::Tick, t(base, 30));
        assert_eq!(m.status(), SafetyStatus::Warning);

        // Reconciliation mid-flight: server has nothing open.
        m.handle(EngineInput::PollOutcome(Ok(Vec::new())), t(base, 40));
        assert_eq!(m.status(), SafetyStatus::Ok);
        assert_eq!(m.snapshot(t(base, 40)).countdown_remaining_seconds, None);

        // Past the old deadline: no FALL is ever emitted.
        let effects = m.handle(EngineInput::Tick, t(base, 61));
        assert!(emitted_kinds(&effects).is_empty());
    }

    #[test]
    fn server_only_kinds_still_drive_reconciliation() {
        let (mut m, base) = monitor();

        // A sweep-created INACTIVITY record is an open incident like any
        // other, as is a kind this client cannot name.
        m.handle(
            EngineInput::PollOutcome(Ok(vec![open_record(5, EventKind::Inactivity)])),
            base,
        );
        assert_eq!(m.status(), SafetyStatus::Alert);

        m.handle(
            EngineInput::PollOutcome(Ok(vec![open_record(6, EventKind::Other)])),
            t(base, 1),
        );
        assert_eq!(m.status(), SafetyStatus::Alert);

        m.handle(EngineInput::PollOutcome(Ok(Vec::new())), t(base, 2));
        assert_eq!(m.status(), SafetyStatus::Ok);
    }

    #[test]
    fn open_server_sos_suppresses_local_reemission() {
        let (mut m, base) = monitor();
        m.handle(EngineInput::Sos, base);
        m.handle(
            EngineInput::EmissionOutcome {
                kind: EventKind::Sos,
                result: Ok(open_record(1, EventKind::Sos)),
            },
            t(base, 1),
        );

        // The server lists the record back (its own MANUAL_SOS spelling
        // parses to the same kind); suppression must hold.
        m.handle(
            EngineInput::PollOutcome(Ok(vec![open_record(1, EventKind::Sos)])),
            t(base, 2),
        );
        assert!(emitted_kinds(&m.handle(EngineInput::Sos, t(base, 3))).is_empty());
    }

    #[test]
    fn poll_with_open_incident_wins_over_local_state() {
        let (mut m, base) = monitor();
        m.handle(
            EngineInput::PollOutcome(Ok(vec![open_record(9, EventKind::Sos)])),
            base,
        );
        assert_eq!(m.status(), SafetyStatus::Alert);

        // Nothing leaves ALERT except reconciliation.
        m.handle(EngineInput::DismissFallPrompt, t(base, 1));
        assert_eq!(m.status(), SafetyStatus::Alert);

        m.handle(EngineInput::PollOutcome(Ok(Vec::new())), t(base, 2));
        assert_eq!(m.status(), SafetyStatus::Ok);
    }

    #[test]
    fn heartbeat_due_once_per_period_and_gated_in_flight() {
        let (mut m, base) = monitor();
        let period = 45 * 60;

        let effects = m.handle(EngineInput::Tick, t(base, period));
        assert!(effects.iter().any(|e| matches!(e, Effect::SendHeartbeat)));

        // Due again a period later, but the first is still in flight.
        let effects = m.handle(EngineInput::Tick, t(base, 2 * period));
        assert!(!effects.iter().any(|e| matches!(e, Effect::SendHeartbeat)));

        m.handle(EngineInput::HeartbeatOutcome(Ok(())), t(base, 2 * period));
        let effects = m.handle(EngineInput::Tick, t(base, 3 * period));
        assert!(effects.iter().any(|e| matches!(e, Effect::SendHeartbeat)));
    }

    #[test]
    fn heartbeat_ack_resets_vitals_baseline() {
        let (mut m, base) = monitor();

        // Ten minutes of drift.
        let drifted = m.snapshot(t(base, 600));
        assert_eq!(drifted.display_heart_rate, 82);

        m.handle(EngineInput::HeartbeatOutcome(Ok(())), t(base, 600));
        let reset = m.snapshot(t(base, 600));
        assert_eq!(reset.display_heart_rate, 72);
        assert_eq!(m.status(), SafetyStatus::Ok);
    }

    #[test]
    fn failed_heartbeat_keeps_drifting_and_surfaces_error() {
        let (mut m, base) = monitor();

        m.handle(
            EngineInput::HeartbeatOutcome(Err(BackendError::Transport("down".to_string()))),
            t(base, 600),
        );
        let snap = m.snapshot(t(base, 600));
        assert_eq!(snap.display_heart_rate, 82);
        assert_eq!(m.status(), SafetyStatus::Ok);
        assert!(snap.last_error.is_some());
    }

    #[test]
    fn heartbeat_ack_never_downgrades_alert() {
        let (mut m, base) = monitor();
        m.handle(EngineInput::Sos, base);
        assert_eq!(m.status(), SafetyStatus::Alert);

        m.handle(EngineInput::HeartbeatOutcome(Ok(())), t(base, 1));
        assert_eq!(m.status(), SafetyStatus::Alert);
    }

    #[test]
    fn confirm_ok_sends_heartbeat_and_clears_warning() {
        let (mut m, base) = monitor();
        m.handle(EngineInput::Motion(MotionSample::new(30.0)), base);
        m.handle(EngineInput::Tick, t(base, 30));
        assert_eq!(m.status(), SafetyStatus::Warning);

        let effects = m.handle(EngineInput::ConfirmOk, t(base, 35));
        assert!(effects.iter().any(|e| matches!(e, Effect::SendHeartbeat)));
        assert_eq!(m.status(), SafetyStatus::Ok);
    }

    #[test]
    fn permission_denial_disables_detector_and_surfaces_once() {
        let (mut m, base) = monitor();
        m.handle(EngineInput::PermissionDenied(Capability::Motion), base);
        assert!(m.last_error().is_some());

        // Spikes no longer produce candidates.
        m.handle(EngineInput::Motion(MotionSample::new(99.0)), t(base, 1));
        m.handle(EngineInput::Tick, t(base, 60));
        assert_eq!(m.status(), SafetyStatus::Ok);

        // Second denial of the same capability is silent.
        m.handle(EngineInput::PollOutcome(Ok(Vec::new())), t(base, 61));
        assert!(m.last_error().is_none());
        m.handle(EngineInput::PermissionDenied(Capability::Motion), t(base, 62));
        assert!(m.last_error().is_none());
    }

    #[test]
    fn shutdown_stops_every_timer_for_good() {
        let (mut m, base) = monitor();
        m.handle(EngineInput::ZoneLoaded(Some(zone())), base);
        m.handle(EngineInput::Motion(MotionSample::new(30.0)), base);
        assert!(m.has_live_timers());

        m.handle(EngineInput::Shutdown, t(base, 1));
        assert!(!m.has_live_timers());

        // Nothing fires afterwards, ever.
        for s in 2..7200 {
            assert!(m.handle(EngineInput::Tick, t(base, s)).is_empty());
        }
        m.handle(EngineInput::Motion(MotionSample::new(99.0)), t(base, 20_000));
        assert!(m
            .handle(EngineInput::Position(fix_outside()), t(base, 20_001))
            .is_empty());
        assert!(!m.has_live_timers());
    }

    #[test]
    fn invalid_zone_request_is_refused_locally() {
        let (mut m, base) = monitor();
        let bad = SafeZone::centered(GeoPoint::new(91.0, 9.0), 200);
        let effects = m.handle(EngineInput::SetZoneRequest(bad), base);
        assert!(effects.is_empty());
        assert!(m.last_error().is_some());

        let good = zone();
        let effects = m.handle(EngineInput::SetZoneRequest(good.clone()), t(base, 1));
        assert!(matches!(&effects[..], [Effect::StoreZone(z)] if *z == good));
    }

    #[test]
    fn resolution_reconciles_immediately() {
        let (mut m, base) = monitor();
        m.handle(
            EngineInput::PollOutcome(Ok(vec![open_record(3, EventKind::Fall)])),
            base,
        );
        assert_eq!(m.status(), SafetyStatus::Alert);

        let effects = m.handle(
            EngineInput::ResolveIncident {
                id: 3,
                action: EventAction::Cancel,
            },
            t(base, 1),
        );
        assert!(matches!(
            &effects[..],
            [Effect::Resolve {
                id: 3,
                action: EventAction::Cancel
            }]
        ));

        // A successful resolution triggers an out-of-schedule poll.
        let mut resolved = open_record(3, EventKind::Fall);
        resolved.status = EventStatus::Cancelled;
        let effects = m.handle(EngineInput::ResolveOutcome(Ok(resolved)), t(base, 2));
        assert!(matches!(&effects[..], [Effect::Poll]));

        m.handle(EngineInput::PollOutcome(Ok(Vec::new())), t(base, 3));
        assert_eq!(m.status(), SafetyStatus::Ok);
    }

    #[test]
    fn poll_due_on_schedule_and_gated_in_flight() {
        let (mut m, base) = monitor();
        let effects = m.handle(EngineInput::Tick, t(base, 60));
        assert!(effects.iter().any(|e| matches!(e, Effect::Poll)));

        // Still in flight a period later.
        let effects = m.handle(EngineInput::Tick, t(base, 120));
        assert!(!effects.iter().any(|e| matches!(e, Effect::Poll)));

        m.handle(EngineInput::PollOutcome(Ok(Vec::new())), t(base, 121));
        let effects = m.handle(EngineInput::Tick, t(base, 180));
        assert!(effects.iter().any(|e| matches!(e, Effect::Poll)));
    }
}
