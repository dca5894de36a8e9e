//! Vehicle service: distributes route capacity over waiting passengers.
//!
//! Per route, `served = min(total capacity, total backlog)`. The served load
//! is split evenly across the route's vehicles (each clamped to its own
//! capacity) and stop backlogs shrink proportionally to their share of the
//! route's backlog. Integer truncation in both splits is intentional; it
//! under-serves slightly, like real boarding friction. Afterwards a fixed
//! fraction of every vehicle's load alights, freeing capacity for the next
//! step.

use std::collections::HashMap;

use bevy_ecs::prelude::{Query, Res};

use crate::ecs::{StopRef, UtilizationHistory, Vehicle, Waiting};
use crate::network::{RouteId, StopId, TransitNetwork};
use crate::scenario::ServiceConfig;

pub fn service_system(
    network: Res<TransitNetwork>,
    config: Res<ServiceConfig>,
    mut stops: Query<(&StopRef, &mut Waiting)>,
    mut vehicles: Query<(&mut Vehicle, Option<&mut UtilizationHistory>)>,
) {
    let backlog: HashMap<StopId, u32> = stops
        .iter()
        .map(|(stop_ref, waiting)| (stop_ref.0, waiting.0))
        .collect();

    let mut fleet: HashMap<RouteId, (u32, u32)> = HashMap::new(); // (capacity, count)
    for (vehicle, _) in vehicles.iter() {
        let entry = fleet.entry(vehicle.route).or_insert((0, 0));
        entry.0 += vehicle.capacity;
        entry.1 += 1;
    }

    let mut served_share: HashMap<RouteId, u32> = HashMap::new();
    let mut reductions: HashMap<StopId, u32> = HashMap::new();

    for route in network.routes.values() {
        let Some((capacity, count)) = fleet.get(&route.id).copied() else {
            continue;
        };
        if count == 0 {
            continue;
        }
        let total_waiting: u32 = route
            .stops
            .iter()
            .map(|s| backlog.get(s).copied().unwrap_or(0))
            .sum();
        let served = capacity.min(total_waiting);
        served_share.insert(route.id, served / count);

        if total_waiting > 0 {
            for stop in &route.stops {
                let share = backlog.get(stop).copied().unwrap_or(0) as u64;
                let reduction = (served as u64 * share / total_waiting as u64) as u32;
                *reductions.entry(*stop).or_insert(0) += reduction;
            }
        }
    }

    for (stop_ref, mut waiting) in &mut stops {
        if let Some(reduction) = reductions.get(&stop_ref.0) {
            waiting.0 = waiting.0.saturating_sub(*reduction);
        }
    }

    for (mut vehicle, history) in &mut vehicles {
        let share = served_share.get(&vehicle.route).copied().unwrap_or(0);
        vehicle.load = share.min(vehicle.capacity);
        if let Some(mut history) = history {
            history.0.push(vehicle.load as f64 / vehicle.capacity.max(1) as f64);
        }
        let alighting = (vehicle.load as f64 * config.alight_fraction) as u32;
        vehicle.load -= alighting.min(vehicle.load);
    }
}
