//! End-of-step snapshot capture.
//!
//! Runs last in the per-step schedule, after demand, service, and
//! rebalancing, so a snapshot always reflects a fully completed step.

use std::collections::HashMap;

use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::clock::StepClock;
use crate::demand::EventCalendar;
use crate::ecs::{RouteDemand, StepDemand, Vehicle};
use crate::network::{RouteId, StopId, TransitNetwork};
use crate::telemetry::{SimSnapshots, StepSnapshot};
use crate::weather::WeatherSequence;

pub fn capture_snapshot_system(
    network: Res<TransitNetwork>,
    clock: Res<StepClock>,
    weather: Res<WeatherSequence>,
    events: Res<EventCalendar>,
    step_demand: Res<StepDemand>,
    route_demand: Res<RouteDemand>,
    vehicles: Query<&Vehicle>,
    mut snapshots: ResMut<SimSnapshots>,
) {
    let step = clock.step();

    let mut fleet: HashMap<RouteId, (u32, u32)> = HashMap::new(); // (capacity, count)
    for vehicle in vehicles.iter() {
        let entry = fleet.entry(vehicle.route).or_insert((0, 0));
        entry.0 += vehicle.capacity;
        entry.1 += 1;
    }

    let mut route_capacity = HashMap::with_capacity(network.routes.len());
    let mut route_vehicles = HashMap::with_capacity(network.routes.len());
    for id in network.routes.keys() {
        let (capacity, count) = fleet.get(id).copied().unwrap_or((0, 0));
        route_capacity.insert(*id, capacity);
        route_vehicles.insert(*id, count);
    }

    let stop_wait_min = estimate_stop_waits(&network, &step_demand.0, &route_capacity, &route_vehicles);

    let total_demand: u64 = route_demand.0.values().map(|d| *d as u64).sum();
    let total_capacity: u64 = route_capacity.values().map(|c| *c as u64).sum();

    snapshots.snapshots.push(StepSnapshot {
        step,
        time_label: clock.time_label(),
        weather: weather.at(step),
        active_events: events.active_names(step),
        stop_demand: step_demand.0.clone(),
        stop_wait_min,
        route_demand: route_demand.0.clone(),
        route_capacity,
        route_vehicles,
        total_demand,
        total_capacity,
        total_utilization: total_demand as f64 / total_capacity.max(1) as f64,
    });
}

/// Headway-based stop wait estimate: half the effective headway of the
/// stop's serving routes, inflated by up to 75% under heavy load. Stops no
/// route serves get no estimate.
fn estimate_stop_waits(
    network: &TransitNetwork,
    stop_demand: &HashMap<StopId, u32>,
    route_capacity: &HashMap<RouteId, u32>,
    route_vehicles: &HashMap<RouteId, u32>,
) -> HashMap<StopId, f64> {
    let mut waits = HashMap::new();
    for stop in network.stops.values() {
        let serving: Vec<RouteId> = network
            .routes
            .values()
            .filter(|r| r.stops.contains(&stop.id))
            .map(|r| r.id)
            .collect();
        if serving.is_empty() {
            continue;
        }

        let vehicles: u32 = serving
            .iter()
            .map(|id| route_vehicles.get(id).copied().unwrap_or(0))
            .sum();
        let best_frequency = serving
            .iter()
            .map(|id| network.routes[id].frequency_min)
            .min()
            .unwrap_or(60);
        let headway = (60.0 / vehicles.max(1) as f64).min(2.0 * best_frequency as f64);

        let mean_capacity: f64 = serving
            .iter()
            .map(|id| route_capacity.get(id).copied().unwrap_or(0) as f64)
            .sum::<f64>()
            / serving.len() as f64;
        let demand = stop_demand.get(&stop.id).copied().unwrap_or(0) as f64;
        let load_factor = (demand / mean_capacity.max(1.0)).min(1.5);

        waits.insert(stop.id, headway / 2.0 * (1.0 + 0.5 * load_factor));
    }
    waits
}
