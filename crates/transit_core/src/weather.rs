//! Per-run weather sequence.
//!
//! Weather is sampled once at scenario build time as a first-order Markov
//! chain over the whole horizon, so a run stays deterministic for a seed and
//! every step can look its weather up without touching the RNG again.

use bevy_ecs::prelude::Resource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Weather {
    Clear,
    Cloudy,
    Rain,
    HeavyRain,
    Storm,
}

pub const ALL_WEATHER: [Weather; 5] = [
    Weather::Clear,
    Weather::Cloudy,
    Weather::Rain,
    Weather::HeavyRain,
    Weather::Storm,
];

impl Weather {
    /// Demand multiplier: worse weather pushes more people onto transit.
    pub fn demand_multiplier(self) -> f64 {
        match self {
            Weather::Clear => 1.0,
            Weather::Cloudy => 1.05,
            Weather::Rain => 1.3,
            Weather::HeavyRain => 1.55,
            Weather::Storm => 1.8,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Weather::Clear => "clear",
            Weather::Cloudy => "cloudy",
            Weather::Rain => "rain",
            Weather::HeavyRain => "heavy_rain",
            Weather::Storm => "storm",
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Weather::Clear => 0,
            Weather::Cloudy => 1,
            Weather::Rain => 2,
            Weather::HeavyRain => 3,
            Weather::Storm => 4,
        }
    }

    fn transition_row(self) -> [f64; 5] {
        match self {
            Weather::Clear => [0.70, 0.20, 0.07, 0.02, 0.01],
            Weather::Cloudy => [0.30, 0.45, 0.18, 0.05, 0.02],
            Weather::Rain => [0.10, 0.20, 0.45, 0.20, 0.05],
            Weather::HeavyRain => [0.05, 0.10, 0.30, 0.40, 0.15],
            Weather::Storm => [0.02, 0.05, 0.20, 0.35, 0.38],
        }
    }
}

/// One weather value per step, fixed for the whole run.
#[derive(Debug, Clone, Resource)]
pub struct WeatherSequence(Vec<Weather>);

impl WeatherSequence {
    /// Markov-chain sequence starting from clear skies.
    pub fn generate(seed: u64, horizon: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut current = Weather::Clear;
        let mut sequence = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            sequence.push(current);
            let row = current.transition_row();
            let draw: f64 = rng.gen();
            let mut acc = 0.0;
            current = Weather::Clear;
            for (weather, p) in ALL_WEATHER.iter().zip(row) {
                acc += p;
                if draw < acc {
                    current = *weather;
                    break;
                }
            }
        }
        Self(sequence)
    }

    /// The same weather for every step; used for controlled comparisons.
    pub fn constant(weather: Weather, horizon: usize) -> Self {
        Self(vec![weather; horizon])
    }

    pub fn at(&self, step: usize) -> Weather {
        self.0.get(step).copied().unwrap_or(Weather::Clear)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
