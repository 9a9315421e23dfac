// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil-rs

//! Fall detector - threshold-and-settle over motion magnitude samples

use std::time::{Duration, Instant};
use tracing::debug;

/// Default spike threshold, in the units of the incoming magnitudes.
pub const FALL_THRESHOLD: f64 = 25.0;

/// Default calm period required after a spike before a candidate fires.
pub const SETTLE_PERIOD: Duration = Duration::from_secs(30);

/// Threshold-and-settle fall detector.
///
/// A magnitude above the threshold starts a settle window; every further
/// spike restarts it. Only when the window runs out uninterrupted does the
/// detector report a candidate fall: a spike followed by stillness is the
/// signature of an unrecovered fall, while continued violent motion keeps
/// deferring judgement instead of firing immediately.
///
/// The detector owns no timer of its own. Deadlines are plain `Instant`s
/// advanced by whatever clock drives [`FallDetector::poll`], so tests run
/// it against a simulated clock.
#[derive(Debug)]
pub struct FallDetector {
    threshold: f64,
    settle: Duration,
    enabled: bool,
    armed: bool,
    settle_deadline: Option<Instant>,
}

impl FallDetector {
    /// Build a detector. `enabled` is an explicit constructor input -
    /// sessions whose role is not the monitored user pass `false` and the
    /// detector stays inert for its whole life.
    pub fn new(threshold: f64, settle: Duration, enabled: bool) -> Self {
        Self {
            threshold,
            settle,
            enabled,
            armed: true,
            settle_deadline: None,
        }
    }

    /// Detector with the production threshold and settle period.
    pub fn with_defaults(enabled: bool) -> Self {
        Self::new(FALL_THRESHOLD, SETTLE_PERIOD, enabled)
    }

    /// Feed one magnitude sample.
    pub fn on_sample(&mut self, now: Instant, magnitude: f64) {
        if !self.enabled || magnitude <= self.threshold {
            return;
        }
        if self.armed {
            self.armed = false;
            debug!(magnitude, "motion spike, opening settle window");
        }
        // Restart on every spike: only a sustained absence of violent
        // motion after the impact counts as "went still".
        self.settle_deadline = Some(now + self.settle);
    }

    /// Advance the settle window. Returns `true` exactly once per elapsed
    /// window; the detector re-arms afterwards.
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.enabled {
            return false;
        }
        match self.settle_deadline {
            Some(deadline) if now >= deadline => {
                self.settle_deadline = None;
                self.armed = true;
                debug!("settle window elapsed, candidate fall");
                true
            }
            _ => false,
        }
    }

    /// Session teardown or permission denial: cancel any pending settle
    /// window and guarantee no further emission.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.settle_deadline = None;
        self.armed = true;
    }

    /// Whether the detector is running for this session.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether a settle window is currently open.
    pub fn is_settling(&self) -> bool {
        self.settle_deadline.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(base: Instant, secs: u64) -> Instant {
        base + Duration::from_secs(secs)
    }

    #[test]
    fn candidate_after_uninterrupted_settle() {
        let base = Instant::now();
        let mut det = FallDetector::with_defaults(true);

        det.on_sample(t(base, 0), 30.0);
        assert!(!det.poll(t(base, 29)));
        assert!(det.poll(t(base, 30)));
        // Fires once, then re-arms with no pending window.
        assert!(!det.poll(t(base, 31)));
        assert!(!det.is_settling());
    }

    #[test]
    fn repeated_spikes_restart_the_window() {
        let base = Instant::now();
        let mut det = FallDetector::with_defaults(true);

        // Danger-zone sample train: spikes at 0s and 10s, calm after.
        det.on_sample(t(base, 0), 30.0);
        det.on_sample(t(base, 5), 10.0);
        det.on_sample(t(base, 10), 30.0);
        det.on_sample(t(base, 15), 10.0);
        det.on_sample(t(base, 20), 10.0);

        // 30s after the *first* spike: still settling.
        assert!(!det.poll(t(base, 30)));
        assert!(!det.poll(t(base, 39)));
        // 30s after the *last* above-threshold sample.
        assert!(det.poll(t(base, 40)));
    }

    #[test]
    fn below_threshold_never_fires() {
        let base = Instant::now();
        let mut det = FallDetector::with_defaults(true);

        for s in 0..120 {
            det.on_sample(t(base, s), 12.0);
            assert!(!det.poll(t(base, s)));
        }
        assert!(!det.poll(t(base, 600)));
    }

    #[test]
    fn disable_cancels_pending_window() {
        let base = Instant::now();
        let mut det = FallDetector::with_defaults(true);

        det.on_sample(t(base, 0), 40.0);
        assert!(det.is_settling());
        det.disable();
        assert!(!det.is_settling());
        assert!(!det.poll(t(base, 3600)));
        // Samples after teardown are ignored too.
        det.on_sample(t(base, 3601), 40.0);
        assert!(!det.poll(t(base, 7200)));
    }

    #[test]
    fn disabled_role_is_inert() {
        let base = Instant::now();
        let mut det = FallDetector::with_defaults(false);
        det.on_sample(t(base, 0), 99.0);
        assert!(!det.is_settling());
        assert!(!det.poll(t(base, 60)));
    }
}
