// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil-rs

//! In-process backend for demo mode and tests
//!
//! Reproduces the server behaviors the client must tolerate: a heartbeat
//! cancels every open incident, and incident creation is rejected while
//! the per-user alert cooldown window is active.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::debug;

use super::{BackendError, EventAction, EventBackend, EventKind, EventRecord, EventStatus, SafeZone};

/// Production server default for the alert cooldown window.
pub const DEFAULT_ALERT_COOLDOWN: Duration = Duration::from_secs(60 * 60);

#[derive(Default)]
struct Inner {
    next_id: i64,
    events: Vec<EventRecord>,
    zone: Option<SafeZone>,
    last_event_at: Option<DateTime<Utc>>,
    heartbeat_count: u64,
    offline: bool,
}

/// In-memory [`EventBackend`].
pub struct MemoryBackend {
    inner: Mutex<Inner>,
    cooldown: Duration,
}

impl MemoryBackend {
    /// Backend with the production cooldown window.
    pub fn new() -> Self {
        Self::with_cooldown(DEFAULT_ALERT_COOLDOWN)
    }

    /// Backend with a custom cooldown window (tests shrink it to zero).
    pub fn with_cooldown(cooldown: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            cooldown,
        }
    }

    /// Simulate losing or regaining connectivity; while offline every call
    /// fails with a transport error.
    pub fn set_offline(&self, offline: bool) {
        self.inner.lock().offline = offline;
    }

    /// Number of heartbeats received.
    pub fn heartbeat_count(&self) -> u64 {
        self.inner.lock().heartbeat_count
    }

    /// Number of records currently open.
    pub fn open_event_count(&self) -> usize {
        self.inner.lock().events.iter().filter(|e| e.is_open()).count()
    }

    /// All records, newest first (test inspection).
    pub fn events(&self) -> Vec<EventRecord> {
        self.inner.lock().events.clone()
    }

    fn ensure_online(inner: &Inner) -> Result<(), BackendError> {
        if inner.offline {
            Err(BackendError::Transport("backend unreachable".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBackend for MemoryBackend {
    async fn post_heartbeat(&self) -> Result<(), BackendError> {
        let mut inner = self.inner.lock();
        Self::ensure_online(&inner)?;
        inner.heartbeat_count += 1;
        // Server semantics: a liveness ack closes everything still open.
        for event in inner.events.iter_mut().filter(|e| e.is_open()) {
            event.status = EventStatus::Cancelled;
        }
        Ok(())
    }

    async fn post_event(&self, kind: EventKind) -> Result<EventRecord, BackendError> {
        let now = Utc::now();
        let mut inner = self.inner.lock();
        Self::ensure_online(&inner)?;
        if let Some(last) = inner.last_event_at {
            let elapsed = (now - last).to_std().unwrap_or_default();
            if elapsed < self.cooldown {
                return Err(BackendError::CooldownActive);
            }
        }
        inner.next_id += 1;
        let record = EventRecord {
            id: inner.next_id,
            kind,
            status: EventStatus::Open,
            created_at: now,
        };
        debug!(id = record.id, kind = kind.as_str(), "stored incident");
        inner.last_event_at = Some(now);
        inner.events.insert(0, record.clone());
        Ok(record)
    }

    async fn list_events(&self) -> Result<Vec<EventRecord>, BackendError> {
        let inner = self.inner.lock();
        Self::ensure_online(&inner)?;
        Ok(inner.events.clone())
    }

    async fn act_on_event(
        &self,
        id: i64,
        action: EventAction,
    ) -> Result<EventRecord, BackendError> {
        let mut inner = self.inner.lock();
        Self::ensure_online(&inner)?;
        let event = inner
            .events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| BackendError::Rejected("event not found".to_string()))?;
        event.status = match action {
            EventAction::Confirm => EventStatus::Confirmed,
            EventAction::Cancel => EventStatus::Cancelled,
        };
        Ok(event.clone())
    }

    async fn get_safe_zone(&self) -> Result<Option<SafeZone>, BackendError> {
        let inner = self.inner.lock();
        Self::ensure_online(&inner)?;
        Ok(inner.zone.clone())
    }

    async fn set_safe_zone(&self, mut zone: SafeZone) -> Result<SafeZone, BackendError> {
        let mut inner = self.inner.lock();
        Self::ensure_online(&inner)?;
        zone.id = Some(inner.zone.as_ref().and_then(|z| z.id).unwrap_or(1));
        inner.zone = Some(zone.clone());
        Ok(zone)
    }
}
