//! Components and per-step scratch resources.
//!
//! Stops and vehicles are entities. Static stop/route data lives in the
//! [`TransitNetwork`](crate::network::TransitNetwork) resource; the only
//! mutable fields during a run are the stop backlog and the vehicle's route
//! assignment and load.

use std::collections::HashMap;

use bevy_ecs::prelude::{Component, Resource};

use crate::network::{RouteId, StopId, VehicleId};

/// Ties a stop entity back to its network id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Component)]
pub struct StopRef(pub StopId);

/// Passengers generated but not yet served at a stop. Never negative;
/// carried forward across steps until served.
#[derive(Debug, Clone, Copy, Default, Component)]
pub struct Waiting(pub u32);

/// A vehicle in the fleet. `route` is the one field the rebalancer mutates;
/// `load` is clamped to `capacity` by the service simulator.
#[derive(Debug, Clone, Copy, Component)]
pub struct Vehicle {
    pub id: VehicleId,
    pub route: RouteId,
    pub capacity: u32,
    pub load: u32,
}

/// Per-step load factors, appended by the service simulator.
#[derive(Debug, Clone, Default, Component)]
pub struct UtilizationHistory(pub Vec<f64>);

/// Stop-level demand generated this step.
#[derive(Debug, Default, Resource)]
pub struct StepDemand(pub HashMap<StopId, u32>);

/// Route-level aggregate of this step's demand.
#[derive(Debug, Default, Resource)]
pub struct RouteDemand(pub HashMap<RouteId, u32>);

/// Last step's route demand, kept as a predictor feature.
#[derive(Debug, Default, Resource)]
pub struct PreviousRouteDemand(pub HashMap<RouteId, u32>);
