//! Demand model inputs: the time-of-day curve, localized special events, and
//! noise sampling.
//!
//! These are plain lookup tables and pure helpers; the per-step generation
//! itself lives in [`crate::systems::demand`].

use std::collections::HashSet;

use bevy_ecs::prelude::Resource;
use rand::rngs::StdRng;
use rand::Rng;

use crate::network::StopId;

/// Piecewise multiplier over the hour of day: a deep night trough, two
/// commute peaks, and plateaus in between.
pub fn time_of_day_multiplier(hour: f64) -> f64 {
    if hour < 6.0 {
        0.1
    } else if hour < 9.0 {
        1.8
    } else if hour < 12.0 {
        0.9
    } else if hour < 14.0 {
        1.1
    } else if hour < 17.0 {
        0.85
    } else if hour < 20.0 {
        1.9
    } else if hour < 22.0 {
        0.7
    } else {
        0.2
    }
}

/// A localized demand surge: active on `start_step..end_step`, multiplying
/// demand at the listed stops.
#[derive(Debug, Clone)]
pub struct SpecialEvent {
    pub name: String,
    pub start_step: usize,
    pub end_step: usize,
    pub stops: Vec<StopId>,
    pub multiplier: f64,
}

impl SpecialEvent {
    pub fn is_active(&self, step: usize) -> bool {
        self.start_step <= step && step < self.end_step
    }

    pub fn affects(&self, stop: StopId) -> bool {
        self.stops.contains(&stop)
    }
}

/// All scheduled events for the run.
#[derive(Debug, Clone, Default, Resource)]
pub struct EventCalendar(pub Vec<SpecialEvent>);

impl EventCalendar {
    pub fn active(&self, step: usize) -> impl Iterator<Item = &SpecialEvent> {
        self.0.iter().filter(move |e| e.is_active(step))
    }

    pub fn active_names(&self, step: usize) -> Vec<String> {
        self.active(step).map(|e| e.name.clone()).collect()
    }

    pub fn active_stops(&self, step: usize) -> HashSet<StopId> {
        self.active(step)
            .flat_map(|e| e.stops.iter().copied())
            .collect()
    }

    /// Max multiplier across active events covering the stop, 1.0 otherwise.
    pub fn multiplier_for(&self, stop: StopId, step: usize) -> f64 {
        self.active(step)
            .filter(|e| e.affects(stop))
            .map(|e| e.multiplier)
            .fold(1.0, f64::max)
    }

    /// Two canned surges matching the sample city's stop layout.
    pub fn sample_events() -> Self {
        Self(vec![
            SpecialEvent {
                name: "City Festival".to_string(),
                start_step: 24,
                end_step: 32,
                stops: vec![StopId(0), StopId(2), StopId(7), StopId(16)],
                multiplier: 2.2,
            },
            SpecialEvent {
                name: "Stadium Match".to_string(),
                start_step: 44,
                end_step: 52,
                stops: vec![StopId(5), StopId(6), StopId(20)],
                multiplier: 3.5,
            },
        ])
    }
}

/// Demand noise configuration: sigma as a fraction of the raw demand.
#[derive(Debug, Clone, Copy, Resource)]
pub struct DemandNoise {
    pub ratio: f64,
}

impl Default for DemandNoise {
    fn default() -> Self {
        Self { ratio: 0.09 }
    }
}

/// The run's demand RNG, seeded once at scenario build.
#[derive(Debug, Resource)]
pub struct DemandRng(pub StdRng);

/// Standard normal sample via Box-Muller on uniform draws.
pub fn sample_standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-12); // avoid ln(0)
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}
