// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil-rs

//! Device stream simulator for demo mode
//!
//! Generates motion samples and position fixes the way a phone's
//! accelerometer and GPS would deliver them: a quiet baseline around
//! gravity with occasional hard spikes, and a position random-walking
//! near a home point that sometimes wanders outside the zone.

use std::time::Duration;

use rand::prelude::*;
use rand_distr::Normal;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::core::EngineHandle;

use super::{GeoPoint, MotionSample, PositionFix};

const GRAVITY: f64 = 9.81;
const SAMPLE_PERIOD: Duration = Duration::from_millis(500);
const FIX_PERIOD: Duration = Duration::from_secs(5);

/// Simulates realistic device streams for demo/testing
pub struct DeviceSimulator {
    rng: rand::rngs::StdRng,
    home: GeoPoint,

    // Simulation state
    position: GeoPoint,
    spike_probability: f64,
    wander_probability: f64,
    wandering: bool,
}

impl DeviceSimulator {
    pub fn new(home: GeoPoint) -> Self {
        Self {
            rng: rand::rngs::StdRng::from_entropy(),
            home,
            position: home,
            spike_probability: 0.01,
            wander_probability: 0.005,
            wandering: false,
        }
    }

    fn next_sample(&mut self) -> MotionSample {
        let mut magnitude = GRAVITY + self.rng.sample::<f64, _>(Normal::new(0.0, 0.25).unwrap());

        if self.rng.gen::<f64>() < self.spike_probability {
            magnitude += self.rng.gen_range(20.0..40.0);
            debug!(magnitude, "simulated impact spike");
        }

        MotionSample::new(magnitude.abs())
    }

    fn next_fix(&mut self) -> PositionFix {
        if !self.wandering && self.rng.gen::<f64>() < self.wander_probability {
            self.wandering = true;
            info!("simulated wander begins");
        }

        // Roughly 111,195 m per degree of latitude.
        let step_degrees = if self.wandering { 5e-4 } else { 5e-6 };
        self.position = GeoPoint::new(
            self.position.latitude + self.rng.gen_range(-step_degrees..step_degrees),
            self.position.longitude
                + self.rng.gen_range(-step_degrees..step_degrees)
                + if self.wandering { step_degrees } else { 0.0 },
        );

        // Wanderers come home eventually.
        if self.wandering && self.rng.gen::<f64>() < 0.02 {
            self.wandering = false;
            self.position = self.home;
            info!("simulated wander ends");
        }

        PositionFix::at(self.position)
    }

    /// Feed the engine until shutdown fires.
    pub async fn run(mut self, handle: EngineHandle, mut shutdown: broadcast::Receiver<()>) {
        info!("starting device simulator");

        let mut sample_tick = tokio::time::interval(SAMPLE_PERIOD);
        let mut fix_tick = tokio::time::interval(FIX_PERIOD);

        loop {
            tokio::select! {
                _ = sample_tick.tick() => {
                    let sample = self.next_sample();
                    if handle.submit_motion(sample).await.is_err() {
                        warn!("engine gone, stopping simulator");
                        break;
                    }
                }
                _ = fix_tick.tick() => {
                    let fix = self.next_fix();
                    if handle.submit_position(fix).await.is_err() {
                        warn!("engine gone, stopping simulator");
                        break;
                    }
                }
                _ = shutdown.recv() => break,
            }
        }

        info!("device simulator stopped");
    }
}
