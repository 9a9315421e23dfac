// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil-rs

//! Event backend boundary - the remote collaborator that stores incidents

mod http;
mod memory;
mod types;

pub use http::HttpBackend;
pub use memory::MemoryBackend;
pub use types::{EventAction, EventKind, EventRecord, EventStatus, SafeZone};

use async_trait::async_trait;
use thiserror::Error;

/// Errors crossing the backend boundary.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Request never completed (network, timeout, server down). Retried
    /// only on the next natural schedule tick.
    #[error("network error: {0}")]
    Transport(String),
    /// Session token was rejected.
    #[error("unauthorized")]
    Unauthorized,
    /// The server-side alert cooldown window is active.
    #[error("alert cooldown active")]
    CooldownActive,
    /// The server refused the request for some other reason.
    #[error("request rejected: {0}")]
    Rejected(String),
}

impl BackendError {
    /// Transient failures are surfaced as a non-fatal `last_error` and
    /// never alter the safety status on their own.
    pub fn is_transient(&self) -> bool {
        matches!(self, BackendError::Transport(_) | BackendError::CooldownActive)
    }
}

/// Abstract contract of the remote event/account backend. The exact wire
/// format belongs to the server; the engine only depends on this seam.
#[async_trait]
pub trait EventBackend: Send + Sync {
    /// Liveness acknowledgment for the monitored user.
    async fn post_heartbeat(&self) -> Result<(), BackendError>;

    /// Create an incident record.
    async fn post_event(&self, kind: EventKind) -> Result<EventRecord, BackendError>;

    /// All incident records visible to this session, newest first.
    async fn list_events(&self) -> Result<Vec<EventRecord>, BackendError>;

    /// Resolve an open incident.
    async fn act_on_event(&self, id: i64, action: EventAction)
        -> Result<EventRecord, BackendError>;

    /// The most recently stored safe zone, if any.
    async fn get_safe_zone(&self) -> Result<Option<SafeZone>, BackendError>;

    /// Store (upsert) the safe zone.
    async fn set_safe_zone(&self, zone: SafeZone) -> Result<SafeZone, BackendError>;
}
