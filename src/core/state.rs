// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil-rs

//! Authoritative safety state and the read-only snapshot for the shells

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::{EventKind, EventRecord};

/// Current safety verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyStatus {
    /// No open concern.
    Ok,
    /// A fall is suspected; a confirmation countdown is running.
    Warning,
    /// An incident has been reported and is unresolved.
    Alert,
}

impl SafetyStatus {
    /// Whether an incident is considered open.
    pub fn is_alert(&self) -> bool {
        matches!(self, SafetyStatus::Alert)
    }
}

/// The engine's mutable state. Mutated exclusively by the transition rules
/// in [`crate::core::SafetyMonitor`]; never persisted - the backend is
/// authoritative and this is a best-effort local mirror between polls.
#[derive(Debug)]
pub struct SafetyState {
    /// Current verdict.
    pub status: SafetyStatus,
    /// Monotonic instant of the last successful liveness claim.
    pub last_heartbeat_at: Instant,
    /// Local mirror of the server's incident list, newest first.
    pub open_events: Vec<EventRecord>,
    /// Most recent transient error, if any, for the shells to display.
    pub last_error: Option<String>,
}

impl SafetyState {
    /// Fresh state at session start: OK, last contact now.
    pub fn new(now: Instant) -> Self {
        Self {
            status: SafetyStatus::Ok,
            last_heartbeat_at: now,
            open_events: Vec::new(),
            last_error: None,
        }
    }
}

/// Client-local request to create a server incident record. Not the
/// server's persisted record - this is the outbound intent.
#[derive(Debug, Clone, Serialize)]
pub struct MonitoringEvent {
    /// Client-side id, for correlating bus notices with outcomes.
    pub id: Uuid,
    /// Incident kind.
    pub kind: EventKind,
    /// When the engine decided to report.
    pub origin: DateTime<Utc>,
}

impl MonitoringEvent {
    /// Intent of the given kind, originating now.
    pub fn new(kind: EventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            origin: Utc::now(),
        }
    }
}

/// Read-only view handed to the presentation shells. Both shells render
/// exclusively from this, which is what keeps them from drifting apart.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// Current verdict.
    pub status: SafetyStatus,
    /// Seconds left in the fall-confirmation window, when one is open.
    pub countdown_remaining_seconds: Option<u64>,
    /// Presentational heart-rate value.
    pub display_heart_rate: u32,
    /// Presentational measuring-ring progress.
    pub measure_percent: u32,
    /// Most recent transient error, if any.
    pub last_error: Option<String>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            status: SafetyStatus::Ok,
            countdown_remaining_seconds: None,
            display_heart_rate: 72,
            measure_percent: 60,
            last_error: None,
        }
    }
}
