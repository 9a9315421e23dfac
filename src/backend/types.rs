// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil-rs

//! Wire types shared with the event backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::detectors::GeoPoint;

/// Kind of reportable incident.
///
/// Inbound parsing is deliberately tolerant: the server owns this
/// vocabulary and grows it independently of client releases. Records of a
/// kind this client cannot name still count as open incidents during
/// reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// Manual emergency button. The server stores its own SOS route's
    /// records as `MANUAL_SOS`; both spellings are one kind here, so an
    /// open server-side SOS keeps suppressing local re-emission.
    #[serde(alias = "MANUAL_SOS")]
    Sos,
    /// Escalated fall candidate.
    Fall,
    /// Left the configured safe zone.
    GeofenceExit,
    /// Created by the server's missed-check-in sweep; never emitted by
    /// the client.
    Inactivity,
    /// Any kind unknown to this client version.
    #[serde(other)]
    Other,
}

impl EventKind {
    /// Wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Sos => "SOS",
            EventKind::Fall => "FALL",
            EventKind::GeofenceExit => "GEOFENCE_EXIT",
            EventKind::Inactivity => "INACTIVITY",
            EventKind::Other => "OTHER",
        }
    }
}

/// Server-side lifecycle of an incident record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    /// Unresolved; the client treats any open record as ALERT.
    Open,
    /// Acknowledged as a real incident.
    Confirmed,
    /// Dismissed as a false alarm.
    Cancelled,
}

/// One server-persisted incident record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Server-assigned id.
    pub id: i64,
    /// Incident kind.
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Current lifecycle state.
    pub status: EventStatus,
    /// Creation time on the server.
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// The server stamps rows with naive UTC datetimes and serializes them
/// without an offset (`2026-02-01T10:00:00`). Accept both that form and
/// proper RFC 3339; emit RFC 3339.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(dt.with_timezone(&Utc));
        }
        raw.parse::<NaiveDateTime>()
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}

impl EventRecord {
    /// Whether the record still demands attention.
    pub fn is_open(&self) -> bool {
        self.status == EventStatus::Open
    }
}

/// Resolution action on an open incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventAction {
    /// Acknowledge the incident as real.
    Confirm,
    /// Dismiss it.
    Cancel,
}

/// A circular safe zone owned by the monitored user's account. At most one
/// is active in the client's view; the backend upserts on write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafeZone {
    /// Server-assigned id, absent for a zone not yet stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Center latitude in degrees.
    pub latitude: f64,
    /// Center longitude in degrees.
    pub longitude: f64,
    /// Radius in meters.
    pub radius_meters: u32,
}

impl SafeZone {
    /// Zone centered on a point.
    pub fn centered(center: GeoPoint, radius_meters: u32) -> Self {
        Self {
            id: None,
            latitude: center.latitude,
            longitude: center.longitude,
            radius_meters,
        }
    }

    /// Center as a [`GeoPoint`].
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    /// Whether center and radius describe a usable circle.
    pub fn is_valid_geometry(&self) -> bool {
        self.center().is_valid() && self.radius_meters > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kinds_on_the_wire() {
        assert_eq!(serde_json::to_string(&EventKind::Sos).unwrap(), "\"SOS\"");
        assert_eq!(
            serde_json::to_string(&EventKind::GeofenceExit).unwrap(),
            "\"GEOFENCE_EXIT\""
        );
        assert_eq!(EventKind::Fall.as_str(), "FALL");
    }

    #[test]
    fn record_round_trips_type_field() {
        let json = r#"{"id":7,"type":"FALL","status":"OPEN","created_at":"2026-02-01T10:00:00Z"}"#;
        let record: EventRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.kind, EventKind::Fall);
        assert!(record.is_open());
    }

    #[test]
    fn server_shaped_event_list_parses() {
        // Exactly what GET /events returns: the server's MANUAL_SOS
        // spelling, a sweep-created INACTIVITY record, a kind newer than
        // this client, extra fields, and offset-less naive timestamps.
        let json = r#"[
            {"id":1,"user_id":7,"type":"MANUAL_SOS","status":"OPEN","created_at":"2026-02-01T10:00:00"},
            {"id":2,"user_id":7,"type":"INACTIVITY","status":"OPEN","created_at":"2026-02-01T10:05:00.123456"},
            {"id":3,"user_id":7,"type":"WELLNESS_CHECK","status":"CANCELLED","created_at":"2026-02-01T10:06:00Z"}
        ]"#;
        let records: Vec<EventRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records[0].kind, EventKind::Sos);
        assert!(records[0].is_open());
        assert_eq!(records[1].kind, EventKind::Inactivity);
        assert_eq!(records[2].kind, EventKind::Other);
        assert!(!records[2].is_open());
    }

    #[test]
    fn naive_timestamp_is_read_as_utc() {
        let json = r#"{"id":1,"type":"SOS","status":"OPEN","created_at":"2026-02-01T10:00:00"}"#;
        let record: EventRecord = serde_json::from_str(json).unwrap();
        let explicit: EventRecord = serde_json::from_str(
            r#"{"id":1,"type":"SOS","status":"OPEN","created_at":"2026-02-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(record.created_at, explicit.created_at);
    }

    #[test]
    fn zone_geometry_validation() {
        let good = SafeZone::centered(GeoPoint::new(45.0, 9.0), 200);
        assert!(good.is_valid_geometry());

        let bad_radius = SafeZone::centered(GeoPoint::new(45.0, 9.0), 0);
        assert!(!bad_radius.is_valid_geometry());

        let bad_center = SafeZone::centered(GeoPoint::new(91.0, 9.0), 200);
        assert!(!bad_center.is_valid_geometry());
    }
}
