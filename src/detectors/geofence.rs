// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil-rs

//! Geofence monitor - great-circle distance against a configured safe zone

use tracing::warn;

use super::{GeoPoint, PositionFix};
use crate::backend::SafeZone;

/// Mean Earth radius in meters, as used by the haversine formula.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance between two points in meters (haversine).
pub fn haversine_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}

/// Stateless breach evaluator over incoming fixes plus the configured zone.
///
/// Deliberately applies no hysteresis or re-entry suppression: every fix
/// outside the zone independently satisfies the breach predicate.
/// Rate-limiting repeated reports belongs to the engine's transition rules,
/// not here.
#[derive(Debug)]
pub struct GeofenceMonitor {
    zone: Option<SafeZone>,
    enabled: bool,
}

impl GeofenceMonitor {
    /// Build a monitor. As with the fall detector, `enabled` is derived
    /// from the session role by the caller and never inferred ambiently.
    pub fn new(enabled: bool) -> Self {
        Self {
            zone: None,
            enabled,
        }
    }

    /// Install or replace the active zone. Malformed geometry fails
    /// closed: the monitor reverts to "no zone configured" rather than
    /// ever evaluating to "always breached".
    pub fn set_zone(&mut self, zone: Option<SafeZone>) {
        self.zone = match zone {
            Some(z) if z.is_valid_geometry() => Some(z),
            Some(z) => {
                warn!(
                    latitude = z.latitude,
                    longitude = z.longitude,
                    radius_meters = z.radius_meters,
                    "rejecting safe zone with invalid geometry"
                );
                None
            }
            None => None,
        };
    }

    /// The currently configured zone, if any.
    pub fn zone(&self) -> Option<&SafeZone> {
        self.zone.as_ref()
    }

    /// Evaluate one fix. `true` means the fix lies outside the zone.
    pub fn check(&self, fix: &PositionFix) -> bool {
        if !self.enabled {
            return false;
        }
        let Some(zone) = &self.zone else {
            return false;
        };
        if !fix.point.is_valid() {
            return false;
        }
        haversine_meters(fix.point, zone.center()) > f64::from(zone.radius_meters)
    }

    /// Session teardown or permission denial.
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Whether the monitor is running for this session.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
