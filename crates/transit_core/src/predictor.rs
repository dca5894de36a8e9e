//! Demand predictor seam.
//!
//! The rebalancer runs off either observed route demand or an external
//! prediction; this module defines the boundary. The predictor is an
//! explicitly constructed object injected as a resource, never ambient
//! state, and its unavailability is reported distinctly from a prediction
//! failure so callers can fall back to observed demand.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use thiserror::Error;

use crate::demand::time_of_day_multiplier;
use crate::network::{Route, RouteId, StopId};
use crate::weather::Weather;

#[derive(Debug, Error)]
pub enum PredictorError {
    /// Model or feature metadata missing; callers should fall back to
    /// observed demand.
    #[error("demand model unavailable: {0}")]
    Unavailable(String),
    #[error("demand prediction failed: {0}")]
    Prediction(String),
}

/// Estimates per-route demand for a step from engineered features.
pub trait DemandPredictor: Send + Sync + std::fmt::Debug {
    fn predict(
        &self,
        step: usize,
        hour: f64,
        routes: &HashMap<RouteId, Route>,
        weather: Weather,
        active_event_stops: &HashSet<StopId>,
        previous_demand: &HashMap<RouteId, u32>,
    ) -> Result<HashMap<RouteId, f64>, PredictorError>;
}

/// Injected predictor handle. Absent resource means observed demand only.
#[derive(Debug, Clone, Resource)]
pub struct PredictorHandle(pub Arc<dyn DemandPredictor>);

/// Model-free reference predictor: scales the previous step's demand by the
/// ratio of time-of-day multipliers, the weather multiplier, and a flat
/// bump for routes touched by an active event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrendPredictor {
    /// Extra multiplier applied when any of the route's stops has an
    /// active event.
    pub event_bump: f64,
}

impl TrendPredictor {
    pub fn new() -> Self {
        Self { event_bump: 1.4 }
    }
}

impl DemandPredictor for TrendPredictor {
    fn predict(
        &self,
        _step: usize,
        hour: f64,
        routes: &HashMap<RouteId, Route>,
        weather: Weather,
        active_event_stops: &HashSet<StopId>,
        previous_demand: &HashMap<RouteId, u32>,
    ) -> Result<HashMap<RouteId, f64>, PredictorError> {
        let step_hours = 0.25;
        let prev_mult = time_of_day_multiplier((hour - step_hours).max(0.0)).max(1e-6);
        let trend = time_of_day_multiplier(hour) / prev_mult;

        let mut out = HashMap::with_capacity(routes.len());
        for (id, route) in routes {
            let prev = previous_demand.get(id).copied().unwrap_or(0) as f64;
            let event = if route.stops.iter().any(|s| active_event_stops.contains(s)) {
                self.event_bump.max(1.0)
            } else {
                1.0
            };
            let predicted = prev * trend * weather.demand_multiplier() * event;
            out.insert(*id, predicted.max(0.0));
        }
        Ok(out)
    }
}
