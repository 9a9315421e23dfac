// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil-rs

//! HTTP implementation of the event backend

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;
use tracing::debug;

use super::{BackendError, EventAction, EventBackend, EventKind, EventRecord, SafeZone};

/// Client for the production REST backend. One instance per session; the
/// bearer token is fixed at construction and dies with it.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpBackend {
    /// Build a client against `base_url` with the session's bearer token.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map an HTTP response into the error taxonomy, passing successes on.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        // The server reports details as {"detail": "..."}.
        let detail = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str().map(String::from)))
            .unwrap_or_else(|| status.to_string());
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(BackendError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => Err(BackendError::CooldownActive),
            _ => Err(BackendError::Rejected(detail)),
        }
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, BackendError> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Self::check(response).await
    }

    async fn post(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, BackendError> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Self::check(response).await
    }
}

#[async_trait]
impl EventBackend for HttpBackend {
    async fn post_heartbeat(&self) -> Result<(), BackendError> {
        debug!("posting heartbeat");
        self.post("/heartbeat", &json!({})).await?;
        Ok(())
    }

    async fn post_event(&self, kind: EventKind) -> Result<EventRecord, BackendError> {
        debug!(kind = kind.as_str(), "posting incident");
        let response = match kind {
            // Manual SOS has its own route; the server names the record.
            EventKind::Sos => self.post("/events/sos", &json!({})).await?,
            other => {
                self.post("/events/auto", &json!({ "type": other.as_str() }))
                    .await?
            }
        };
        response
            .json()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))
    }

    async fn list_events(&self) -> Result<Vec<EventRecord>, BackendError> {
        self.get("/events")
            .await?
            .json()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))
    }

    async fn act_on_event(
        &self,
        id: i64,
        action: EventAction,
    ) -> Result<EventRecord, BackendError> {
        let path = format!("/events/{id}/action");
        self.post(&path, &json!({ "action": action }))
            .await?
            .json()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))
    }

    async fn get_safe_zone(&self) -> Result<Option<SafeZone>, BackendError> {
        let zones: Vec<SafeZone> = self
            .get("/safe-zones")
            .await?
            .json()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Ok(zones.into_iter().next())
    }

    async fn set_safe_zone(&self, zone: SafeZone) -> Result<SafeZone, BackendError> {
        let body = json!({
            "latitude": zone.latitude,
            "longitude": zone.longitude,
            "radius_meters": zone.radius_meters,
        });
        self.post("/safe-zones", &body)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))
    }
}
