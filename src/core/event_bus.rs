// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil-rs

//! Event bus - pub/sub surface for the presentation shells

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use super::state::{MonitoringEvent, SafetyStatus, Snapshot};

/// What a notice is about.
#[derive(Debug, Clone, Serialize)]
pub enum NoticePayload {
    /// The safety verdict changed.
    StatusChanged {
        /// Previous verdict.
        from: SafetyStatus,
        /// New verdict.
        to: SafetyStatus,
    },
    /// The engine decided to report an incident.
    IncidentReported(MonitoringEvent),
    /// A transient backend failure was surfaced.
    TransientError {
        /// Human-readable description.
        message: String,
    },
}

/// One bus notice.
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    /// Monotonically increasing sequence number.
    pub id: u64,
    /// When the notice was published.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    pub payload: NoticePayload,
}

/// Broadcast pub/sub for engine output. Any number of shells subscribe;
/// lagging subscribers drop old messages rather than backpressure the
/// engine.
pub struct EventBus {
    snapshot_tx: broadcast::Sender<Snapshot>,
    notice_tx: broadcast::Sender<Notice>,
    counter: std::sync::atomic::AtomicU64,
}

impl EventBus {
    /// Bus with the given per-channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (snapshot_tx, _) = broadcast::channel(capacity);
        let (notice_tx, _) = broadcast::channel(capacity);
        Self {
            snapshot_tx,
            notice_tx,
            counter: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// Publish the latest snapshot.
    pub fn publish_snapshot(&self, snapshot: Snapshot) {
        let _ = self.snapshot_tx.send(snapshot);
    }

    /// Publish a verdict change.
    pub fn publish_status_change(&self, from: SafetyStatus, to: SafetyStatus) {
        self.publish(NoticePayload::StatusChanged { from, to });
    }

    /// Publish an outbound incident intent.
    pub fn publish_incident(&self, event: MonitoringEvent) {
        self.publish(NoticePayload::IncidentReported(event));
    }

    /// Publish a transient error.
    pub fn publish_error(&self, message: &str) {
        self.publish(NoticePayload::TransientError {
            message: message.to_string(),
        });
    }

    fn publish(&self, payload: NoticePayload) {
        let id = self
            .counter
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let _ = self.notice_tx.send(Notice {
            id,
            timestamp: Utc::now(),
            payload,
        });
    }

    /// Subscribe to snapshots.
    pub fn subscribe_snapshots(&self) -> broadcast::Receiver<Snapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Subscribe to notices.
    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.notice_tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
