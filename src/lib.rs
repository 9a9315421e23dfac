// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil-rs

//! Vigil - Personal-Safety Monitoring Engine
//!
//! A client-side safety monitor for vulnerable users and their caregivers:
//! - Manual SOS with immediate escalation
//! - Accelerometer fall detection with a settle debounce
//! - Safe-zone geofencing over raw position fixes
//! - Automatic periodic heartbeats while the app is in the foreground
//! - A 30-second alert countdown the user can dismiss
//! - Server reconciliation polls keeping two devices in agreement
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Vigil Engine                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │
//! │  │ Device  │→ │ Detectors │→ │  Safety   │→ │  Backend  │  │
//! │  │ Streams │  │           │  │  Monitor  │  │  Client   │  │
//! │  └─────────┘  └───────────┘  └───────────┘  └───────────┘  │
//! │       ↓             ↓             ↓              ↓         │
//! │  ┌─────────────────────────────────────────────────────┐   │
//! │  │                     Event Bus                       │   │
//! │  └─────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything observable flows through a single logical event queue inside
//! [`core::EngineRuntime`], so the transition rules in [`core::SafetyMonitor`]
//! run strictly one event at a time with no locking.

#![warn(missing_docs)]
#![allow(dead_code)]

pub mod backend;
pub mod config;
pub mod core;
pub mod detectors;
pub mod session;

// Re-exports for convenience
pub use backend::{EventBackend, EventKind, HttpBackend, MemoryBackend, SafeZone};
pub use config::Config;
pub use crate::core::{EngineHandle, EngineRuntime, EventBus, SafetyStatus, Snapshot};
pub use detectors::{GeoPoint, MotionSample, PositionFix};
pub use session::{Role, SessionContext};

/// Vigil version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Vigil name
pub const NAME: &str = "Vigil";
