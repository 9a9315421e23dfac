// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil-rs

//! Vitals estimator - presentational heart-rate heuristic
//!
//! These are display values only, derived from the safety status and the
//! time since last contact. They never feed back into status transitions,
//! and they are not measurements of anything.

use crate::core::SafetyStatus;

/// Resting baseline per status, in bpm.
fn baseline(status: SafetyStatus) -> u64 {
    match status {
        SafetyStatus::Ok => 72,
        SafetyStatus::Warning => 90,
        SafetyStatus::Alert => 110,
    }
}

/// Displayed heart rate:
/// `clamp(baseline(status) + min(12, minutes_since_heartbeat), 55, 110)`.
pub fn display_rate(status: SafetyStatus, minutes_since_heartbeat: u64) -> u32 {
    (baseline(status) + minutes_since_heartbeat.min(12)).clamp(55, 110) as u32
}

/// Displayed "measuring" ring progress: `min(95, 60 + min(35, minutes))`.
pub fn measure_percent(minutes_since_heartbeat: u64) -> u32 {
    (60 + minutes_since_heartbeat.min(35)).min(95) as u32
}
