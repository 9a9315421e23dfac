// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil-rs

//! Session context - explicit auth/role state handed to the engine

use serde::{Deserialize, Serialize};

/// Account role. Only the monitored user generates safety signals;
/// caregivers receive and act on incidents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// The monitored user (heartbeat, motion, location).
    User,
    /// Receives and resolves incidents; no detectors run for this role.
    Caregiver,
}

impl Role {
    /// Whether this role produces safety signals.
    pub fn is_monitored(&self) -> bool {
        matches!(self, Role::User)
    }
}

/// Session state passed into the engine at construction and dropped on
/// logout. There is no ambient global auth state anywhere in the crate;
/// tearing this down (dropping the runtime) stops every timer it owns.
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Bearer token for the backend.
    pub token: String,
    /// Role of the signed-in account.
    pub role: Role,
}

impl SessionContext {
    /// Create a session for an authenticated account.
    pub fn new(token: impl Into<String>, role: Role) -> Self {
        Self {
            token: token.into(),
            role,
        }
    }
}
