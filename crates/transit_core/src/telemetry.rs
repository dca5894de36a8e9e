//! Per-step snapshots and the rebalancing audit log.
//!
//! Snapshots are the only thing the simulation exposes to consumers: an
//! append-only, never-mutated sequence, one record per step. The rebalance
//! log mirrors that for control-loop moves.

use std::collections::HashMap;

use bevy_ecs::prelude::Resource;
use serde::Serialize;

use crate::network::{RouteId, StopId, VehicleId};
use crate::weather::Weather;

/// Immutable record of one time step.
#[derive(Debug, Clone)]
pub struct StepSnapshot {
    pub step: usize,
    pub time_label: String,
    pub weather: Weather,
    pub active_events: Vec<String>,
    pub stop_demand: HashMap<StopId, u32>,
    /// Estimated wait in minutes; stops served by no route have no entry.
    pub stop_wait_min: HashMap<StopId, f64>,
    pub route_demand: HashMap<RouteId, u32>,
    pub route_capacity: HashMap<RouteId, u32>,
    pub route_vehicles: HashMap<RouteId, u32>,
    pub total_demand: u64,
    pub total_capacity: u64,
    pub total_utilization: f64,
}

impl StepSnapshot {
    pub fn utilization(&self, route: RouteId) -> f64 {
        let demand = self.route_demand.get(&route).copied().unwrap_or(0) as f64;
        let capacity = self.route_capacity.get(&route).copied().unwrap_or(0).max(1) as f64;
        demand / capacity
    }
}

/// Ordered, append-only snapshot sequence for the run.
#[derive(Debug, Default, Resource)]
pub struct SimSnapshots {
    pub snapshots: Vec<StepSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Warning,
    Critical,
}

/// One vehicle move made by the rebalancer.
#[derive(Debug, Clone, Serialize)]
pub struct RebalanceEvent {
    pub step: usize,
    pub time_label: String,
    pub from_route: RouteId,
    pub to_route: RouteId,
    pub vehicle: VehicleId,
    pub reason: String,
    pub severity: Severity,
    pub weather: Weather,
    pub active_events: Vec<String>,
}

/// Append-only audit log of rebalancing moves.
#[derive(Debug, Default, Resource)]
pub struct RebalanceLog {
    pub events: Vec<RebalanceEvent>,
}
