// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil-rs

//! Alert escalator - the single-slot fall-confirmation countdown

use std::time::{Duration, Instant};

/// Production confirmation window.
pub const COUNTDOWN_DURATION: Duration = Duration::from_secs(30);

/// Single-slot deadline timer for the countdown-confirmation protocol.
///
/// At most one countdown is ever active; a start while one is running is a
/// no-op (the first candidate owns the window). Cancellation stops the
/// timer with no further effects, and expiry fires exactly once. Only the
/// deadline instant matters for correctness; per-second display values are
/// derived from it on demand.
#[derive(Debug)]
pub struct AlertEscalator {
    duration: Duration,
    deadline: Option<Instant>,
}

impl AlertEscalator {
    /// Escalator with the given window length.
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            deadline: None,
        }
    }

    /// Start a countdown if none is active. Returns `false` when one is
    /// already running.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.deadline.is_some() {
            return false;
        }
        self.deadline = Some(now + self.duration);
        true
    }

    /// Stop deterministically (user confirmed, session ended, or the
    /// server reconciled the incident away).
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Whether a countdown is running.
    pub fn is_active(&self) -> bool {
        self.deadline.is_some()
    }

    /// Whole seconds left, rounded up so the display opens on the full
    /// window value.
    pub fn remaining_seconds(&self, now: Instant) -> Option<u64> {
        self.deadline.map(|deadline| {
            deadline
                .checked_duration_since(now)
                .map(|d| (d.as_millis() as u64).div_ceil(1000))
                .unwrap_or(0)
        })
    }

    /// True exactly once when the deadline passes without cancellation.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for AlertEscalator {
    fn default() -> Self {
        Self::new(COUNTDOWN_DURATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(base: Instant, secs: u64) -> Instant {
        base + Duration::from_secs(secs)
    }

    #[test]
    fn first_candidate_owns_the_window() {
        let base = Instant::now();
        let mut esc = AlertEscalator::default();

        assert!(esc.start(t(base, 0)));
        assert!(!esc.start(t(base, 10)));
        // Re-entrant start did not move the deadline.
        assert_eq!(esc.remaining_seconds(t(base, 10)), Some(20));
    }

    #[test]
    fn expiry_fires_exactly_once() {
        let base = Instant::now();
        let mut esc = AlertEscalator::default();
        esc.start(t(base, 0));

        assert!(!esc.poll(t(base, 29)));
        assert!(esc.poll(t(base, 30)));
        assert!(!esc.poll(t(base, 31)));
        assert!(!esc.is_active());
    }

    #[test]
    fn cancellation_has_no_further_effects() {
        let base = Instant::now();
        let mut esc = AlertEscalator::default();
        esc.start(t(base, 0));
        esc.cancel();

        assert!(!esc.is_active());
        assert_eq!(esc.remaining_seconds(t(base, 5)), None);
        assert!(!esc.poll(t(base, 3600)));
    }

    #[test]
    fn remaining_counts_down_and_rounds_up() {
        let base = Instant::now();
        let mut esc = AlertEscalator::default();
        esc.start(t(base, 0));

        assert_eq!(esc.remaining_seconds(t(base, 0)), Some(30));
        assert_eq!(esc.remaining_seconds(t(base, 15)), Some(15));
        assert_eq!(
            esc.remaining_seconds(base + Duration::from_millis(29_500)),
            Some(1)
        );
    }
}
