//! Capacity rebalancing control loop.
//!
//! Once per step, after service: pair the most overloaded route with the
//! most idle one and move a single vehicle between them, for up to a small
//! number of rounds. Cooldowns keep a route out of the pool after it takes
//! part in a move; the donor side waits longer than the recipient side,
//! which stops immediate back-and-forth thrashing. Greedy pairing is
//! deliberate: each move gets a one-line reason a dispatcher can read.

use std::collections::HashMap;

use bevy_ecs::prelude::{Query, Res, ResMut, Resource};
use log::{info, warn};

use crate::clock::StepClock;
use crate::demand::EventCalendar;
use crate::ecs::{PreviousRouteDemand, RouteDemand, Vehicle};
use crate::network::{RouteId, TransitNetwork};
use crate::predictor::{PredictorError, PredictorHandle};
use crate::scenario::RebalancePolicyConfig;
use crate::telemetry::{RebalanceEvent, RebalanceLog, Severity};
use crate::weather::WeatherSequence;

/// Per-route cooldown counters; a route with a positive counter is neither
/// donor nor recipient.
#[derive(Debug, Default, Resource)]
pub struct RebalanceState {
    pub cooldowns: HashMap<RouteId, u32>,
}

#[allow(clippy::too_many_arguments)]
pub fn rebalance_system(
    network: Res<TransitNetwork>,
    clock: Res<StepClock>,
    weather: Res<WeatherSequence>,
    events: Res<EventCalendar>,
    policy: Res<RebalancePolicyConfig>,
    predictor: Option<Res<PredictorHandle>>,
    route_demand: Res<RouteDemand>,
    previous: Res<PreviousRouteDemand>,
    mut state: ResMut<RebalanceState>,
    mut log: ResMut<RebalanceLog>,
    mut vehicles: Query<&mut Vehicle>,
) {
    let step = clock.step();
    for id in network.routes.keys() {
        let counter = state.cooldowns.entry(*id).or_insert(0);
        *counter = counter.saturating_sub(1);
    }
    if !policy.enabled {
        return;
    }

    let demand = demand_input(
        &network,
        step,
        clock.hour(),
        &weather,
        &events,
        predictor.as_deref(),
        &route_demand,
        &previous,
    );

    for _ in 0..policy.max_moves_per_step {
        let mut fleet: HashMap<RouteId, (u32, u32)> = HashMap::new(); // (capacity, count)
        for vehicle in vehicles.iter() {
            let entry = fleet.entry(vehicle.route).or_insert((0, 0));
            entry.0 += vehicle.capacity;
            entry.1 += 1;
        }

        let utilization: Vec<(RouteId, f64, u32)> = network
            .routes
            .keys()
            .map(|id| {
                let (capacity, count) = fleet.get(id).copied().unwrap_or((0, 0));
                let util = demand.get(id).copied().unwrap_or(0.0) / capacity.max(1) as f64;
                (*id, util, count)
            })
            .collect();

        let mut overloaded: Vec<(RouteId, f64)> = utilization
            .iter()
            .filter(|(id, util, _)| {
                *util > policy.overload_threshold && state.cooldowns[id] == 0
            })
            .map(|(id, util, _)| (*id, *util))
            .collect();
        overloaded.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut idle: Vec<(RouteId, f64)> = utilization
            .iter()
            .filter(|(id, util, count)| {
                *util < policy.idle_threshold
                    && *count > policy.min_fleet
                    && state.cooldowns[id] == 0
            })
            .map(|(id, util, _)| (*id, *util))
            .collect();
        idle.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

        let (Some(&(recipient, recipient_util)), Some(&(donor, _))) =
            (overloaded.first(), idle.first())
        else {
            break;
        };
        if recipient == donor {
            break;
        }

        let Some(mut vehicle) = vehicles.iter_mut().find(|v| v.route == donor) else {
            break;
        };
        let moved = vehicle.id;
        vehicle.route = recipient;
        vehicle.load = 0;

        state.cooldowns.insert(donor, policy.donor_cooldown);
        state.cooldowns.insert(recipient, policy.recipient_cooldown);

        let severity = if recipient_util > policy.critical_threshold {
            Severity::Critical
        } else {
            Severity::Warning
        };
        let reason = format!(
            "{} at {:.0}% of capacity",
            network.routes[&recipient].name,
            recipient_util * 100.0
        );
        info!("rebalance: {moved} moved {donor} -> {recipient} ({reason})");

        log.events.push(RebalanceEvent {
            step,
            time_label: clock.time_label(),
            from_route: donor,
            to_route: recipient,
            vehicle: moved,
            reason,
            severity,
            weather: weather.at(step),
            active_events: events.active_names(step),
        });
    }
}

/// Predicted demand when a predictor is injected and answers, observed
/// route demand otherwise. `Unavailable` falls back quietly; any other
/// predictor failure is logged louder but also falls back, so a step always
/// completes.
#[allow(clippy::too_many_arguments)]
fn demand_input(
    network: &TransitNetwork,
    step: usize,
    hour: f64,
    weather: &WeatherSequence,
    events: &EventCalendar,
    predictor: Option<&PredictorHandle>,
    observed: &RouteDemand,
    previous: &PreviousRouteDemand,
) -> HashMap<RouteId, f64> {
    if let Some(handle) = predictor {
        let active_stops = events.active_stops(step);
        match handle.0.predict(
            step,
            hour,
            &network.routes,
            weather.at(step),
            &active_stops,
            &previous.0,
        ) {
            Ok(predicted) => return predicted,
            Err(PredictorError::Unavailable(msg)) => {
                warn!("demand model unavailable ({msg}); rebalancing on observed demand");
            }
            Err(err) => {
                warn!("demand prediction failed ({err}); rebalancing on observed demand");
            }
        }
    }
    observed
        .0
        .iter()
        .map(|(id, demand)| (*id, *demand as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use bevy_ecs::prelude::{Schedule, World};

    use super::*;
    use crate::network::{Route, StopId, VehicleId};
    use crate::predictor::DemandPredictor;
    use crate::scenario::{build_scenario, ScenarioParams};
    use crate::test_helpers::three_route_network;
    use crate::weather::Weather;

    fn rebalance_world(params: ScenarioParams) -> (World, Schedule) {
        let mut world = World::new();
        build_scenario(&mut world, three_route_network(), params).expect("valid test network");
        let mut schedule = Schedule::default();
        schedule.add_systems(rebalance_system);
        (world, schedule)
    }

    fn set_route_demand(world: &mut World, entries: &[(u32, u32)]) {
        let mut demand = world.resource_mut::<RouteDemand>();
        demand.0.clear();
        for (route, value) in entries {
            demand.0.insert(RouteId(*route), *value);
        }
    }

    fn fleet_size(world: &mut World, route: RouteId) -> u32 {
        let mut query = world.query::<&Vehicle>();
        query.iter(world).filter(|v| v.route == route).count() as u32
    }

    #[test]
    fn sustained_overload_triggers_a_move_within_five_steps() {
        let (mut world, mut schedule) = rebalance_world(ScenarioParams::default());
        // Route 0: two buses, 100 seats, demand 130 -> utilization 1.3.
        set_route_demand(&mut world, &[(0, 130), (1, 0), (2, 0)]);

        for _ in 0..5 {
            schedule.run(&mut world);
        }

        let events = world.resource::<RebalanceLog>().events.clone();
        assert!(!events.is_empty(), "overload must trigger at least one move");
        let first = &events[0];
        assert_eq!(first.to_route, RouteId(0));

        let moved: Vec<VehicleId> = events.iter().map(|e| e.vehicle).collect();
        let mut query = world.query::<&Vehicle>();
        for vehicle in query.iter(&world) {
            if vehicle.id == *moved.last().unwrap() {
                assert_eq!(vehicle.route, events.last().unwrap().to_route);
            }
        }
        assert!(fleet_size(&mut world, RouteId(0)) > 2);
    }

    #[test]
    fn fleet_is_conserved_and_floored_at_min() {
        let (mut world, mut schedule) = rebalance_world(ScenarioParams::default());
        let total_before: u32 = world.query::<&Vehicle>().iter(&world).count() as u32;
        set_route_demand(&mut world, &[(0, 10_000), (1, 0), (2, 0)]);

        for _ in 0..50 {
            schedule.run(&mut world);
            let total: u32 = world.query::<&Vehicle>().iter(&world).count() as u32;
            assert_eq!(total, total_before, "moves never create or destroy vehicles");
            assert!(fleet_size(&mut world, RouteId(1)) >= 1);
            assert!(fleet_size(&mut world, RouteId(2)) >= 1);
        }
        // Both donors drained down to the floor.
        assert_eq!(fleet_size(&mut world, RouteId(1)), 1);
        assert_eq!(fleet_size(&mut world, RouteId(2)), 1);
        assert_eq!(fleet_size(&mut world, RouteId(0)), total_before - 2);
    }

    #[test]
    fn cooldown_keeps_recent_participants_out() {
        let (mut world, mut schedule) = rebalance_world(ScenarioParams::default());
        set_route_demand(&mut world, &[(0, 130), (1, 0), (2, 0)]);

        schedule.run(&mut world);
        let after_first = world.resource::<RebalanceLog>().events.len();
        assert_eq!(after_first, 1);
        assert_eq!(world.resource::<RebalanceLog>().events[0].from_route, RouteId(1));

        // Step 2: recipient still cooling down, nothing can happen.
        schedule.run(&mut world);
        assert_eq!(world.resource::<RebalanceLog>().events.len(), 1);

        // Step 3: recipient is free again but route 1 still cools down, so
        // the second donor must be route 2.
        schedule.run(&mut world);
        let events = &world.resource::<RebalanceLog>().events;
        if events.len() > 1 {
            assert_eq!(events[1].from_route, RouteId(2));
        }
    }

    #[test]
    fn disabled_policy_never_moves() {
        let (mut world, mut schedule) =
            rebalance_world(ScenarioParams::default().with_rebalancing(false));
        set_route_demand(&mut world, &[(0, 10_000), (1, 0), (2, 0)]);
        for _ in 0..10 {
            schedule.run(&mut world);
        }
        assert!(world.resource::<RebalanceLog>().events.is_empty());
    }

    #[test]
    fn severity_reflects_the_critical_threshold() {
        let (mut world, mut schedule) = rebalance_world(ScenarioParams::default());
        // 130 / 100 = 1.3, well past the 0.95 critical bound.
        set_route_demand(&mut world, &[(0, 130), (1, 0), (2, 0)]);
        schedule.run(&mut world);
        assert_eq!(world.resource::<RebalanceLog>().events[0].severity, Severity::Critical);

        let (mut world, mut schedule) = rebalance_world(ScenarioParams::default());
        // 90 / 100 = 0.9: overloaded but not critical.
        set_route_demand(&mut world, &[(0, 90), (1, 0), (2, 0)]);
        schedule.run(&mut world);
        assert_eq!(world.resource::<RebalanceLog>().events[0].severity, Severity::Warning);
    }

    #[derive(Debug)]
    struct FixedPredictor(f64);

    impl DemandPredictor for FixedPredictor {
        fn predict(
            &self,
            _step: usize,
            _hour: f64,
            routes: &HashMap<RouteId, Route>,
            _weather: Weather,
            _active_event_stops: &HashSet<StopId>,
            _previous_demand: &HashMap<RouteId, u32>,
        ) -> Result<HashMap<RouteId, f64>, PredictorError> {
            Ok(routes
                .keys()
                .map(|id| (*id, if *id == RouteId(0) { self.0 } else { 0.0 }))
                .collect())
        }
    }

    #[derive(Debug)]
    struct MissingModel;

    impl DemandPredictor for MissingModel {
        fn predict(
            &self,
            _step: usize,
            _hour: f64,
            _routes: &HashMap<RouteId, Route>,
            _weather: Weather,
            _active_event_stops: &HashSet<StopId>,
            _previous_demand: &HashMap<RouteId, u32>,
        ) -> Result<HashMap<RouteId, f64>, PredictorError> {
            Err(PredictorError::Unavailable("no model on disk".into()))
        }
    }

    #[test]
    fn predicted_demand_drives_moves_when_observed_is_quiet() {
        let (mut world, mut schedule) = rebalance_world(ScenarioParams::default());
        world.insert_resource(PredictorHandle(Arc::new(FixedPredictor(130.0))));
        // Observed demand is zero everywhere; only the prediction overloads.
        set_route_demand(&mut world, &[(0, 0), (1, 0), (2, 0)]);
        schedule.run(&mut world);

        let events = &world.resource::<RebalanceLog>().events;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].to_route, RouteId(0));
    }

    #[test]
    fn unavailable_predictor_falls_back_to_observed_demand() {
        let (mut world, mut schedule) = rebalance_world(ScenarioParams::default());
        world.insert_resource(PredictorHandle(Arc::new(MissingModel)));
        set_route_demand(&mut world, &[(0, 130), (1, 0), (2, 0)]);
        schedule.run(&mut world);

        let events = &world.resource::<RebalanceLog>().events;
        assert_eq!(events.len(), 1, "fallback must still rebalance");
        assert_eq!(events[0].to_route, RouteId(0));
    }
}
