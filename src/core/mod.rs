// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil-rs

//! Core safety engine: state machine, escalation, event bus and runtime.

pub mod engine;
pub mod escalator;
pub mod event_bus;
pub mod handle;
pub mod runtime;
pub mod state;

pub use engine::{Capability, Effect, EngineInput, SafetyMonitor};
pub use escalator::AlertEscalator;
pub use event_bus::{EventBus, Notice, NoticePayload};
pub use handle::{EngineHandle, EngineStopped};
pub use runtime::EngineRuntime;
pub use state::{MonitoringEvent, SafetyState, SafetyStatus, Snapshot};
