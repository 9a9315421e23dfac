// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil-rs

//! Heartbeat scheduler - periodic liveness ping for the monitored user

use std::time::{Duration, Instant};

/// Production heartbeat period.
pub const HEARTBEAT_PERIOD: Duration = Duration::from_secs(45 * 60);

/// Fixed-period deadline scheduler for the liveness heartbeat.
///
/// The scheduler only decides *when* a heartbeat is due; whether the ping
/// succeeded, and what that means for the safety status, is the engine's
/// business. Cancellation is permanent for the session: once cancelled the
/// scheduler never reports due again.
#[derive(Debug)]
pub struct HeartbeatScheduler {
    period: Duration,
    next_due: Option<Instant>,
}

impl HeartbeatScheduler {
    /// Build a scheduler. Inactive from the start unless `enabled`
    /// (sessions without the monitored-user role never heartbeat).
    pub fn new(period: Duration, now: Instant, enabled: bool) -> Self {
        Self {
            period,
            next_due: enabled.then(|| now + period),
        }
    }

    /// Returns `true` when a heartbeat is due, scheduling the next one.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(now + self.period);
                true
            }
            _ => false,
        }
    }

    /// Stop for good (session end, role change, logout).
    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    /// Whether the scheduler will ever fire again.
    pub fn is_active(&self) -> bool {
        self.next_due.is_some()
    }
}
