// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil-rs

//! Edge detectors - they normalize raw samples into engine events

pub mod fall;
pub mod geofence;
pub mod heartbeat;
pub mod simulator;
pub mod vitals;

pub use fall::FallDetector;
pub use geofence::{haversine_meters, GeofenceMonitor};
pub use heartbeat::HeartbeatScheduler;
pub use simulator::DeviceSimulator;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees, valid range [-90, 90].
    pub latitude: f64,
    /// Longitude in degrees, valid range [-180, 180].
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a point from raw degrees.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both coordinates are finite and within range.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// One position fix from the platform location source, already decoded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PositionFix {
    /// Reported coordinate.
    pub point: GeoPoint,
    /// Horizontal accuracy in meters, when the platform reports one.
    pub accuracy: Option<f64>,
    /// Wall-clock time of the fix.
    pub timestamp: DateTime<Utc>,
}

impl PositionFix {
    /// Fix at a coordinate, stamped now.
    pub fn at(point: GeoPoint) -> Self {
        Self {
            point,
            accuracy: None,
            timestamp: Utc::now(),
        }
    }
}

/// One acceleration-magnitude sample, gravity included.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MotionSample {
    /// Scalar magnitude in the platform's acceleration units.
    pub magnitude: f64,
}

impl MotionSample {
    /// Wrap an already-computed magnitude.
    pub fn new(magnitude: f64) -> Self {
        Self { magnitude }
    }

    /// Magnitude of a raw three-axis acceleration vector.
    pub fn from_components(x: f64, y: f64, z: f64) -> Self {
        Self {
            magnitude: (x * x + y * y + z * z).sqrt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geopoint_range_validation() {
        assert!(GeoPoint::new(45.0, 9.0).is_valid());
        assert!(GeoPoint::new(-90.0, 180.0).is_valid());
        assert!(!GeoPoint::new(90.5, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, -181.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn magnitude_from_components() {
        let sample = MotionSample::from_components(3.0, 4.0, 12.0);
        assert!((sample.magnitude - 13.0).abs() < 1e-9);
    }
}
