//! Per-step passenger demand generation.
//!
//! For every stop: base rate x time-of-day x weather x event multipliers,
//! plus Gaussian noise proportional to the raw value, floored at zero and
//! truncated to an integer. Generated demand lands on the stop's waiting
//! backlog; unserved passengers carry over to the next step.

use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::clock::StepClock;
use crate::demand::{sample_standard_normal, time_of_day_multiplier, DemandNoise, DemandRng, EventCalendar};
use crate::ecs::{PreviousRouteDemand, RouteDemand, StepDemand, StopRef, Waiting};
use crate::network::TransitNetwork;
use crate::weather::WeatherSequence;

#[allow(clippy::too_many_arguments)]
pub fn demand_system(
    network: Res<TransitNetwork>,
    clock: Res<StepClock>,
    weather: Res<WeatherSequence>,
    events: Res<EventCalendar>,
    noise: Res<DemandNoise>,
    mut rng: ResMut<DemandRng>,
    mut step_demand: ResMut<StepDemand>,
    mut route_demand: ResMut<RouteDemand>,
    mut previous: ResMut<PreviousRouteDemand>,
    mut stops: Query<(&StopRef, &mut Waiting)>,
) {
    let step = clock.step();
    let time_mult = time_of_day_multiplier(clock.hour());
    let weather_mult = weather.at(step).demand_multiplier();

    previous.0 = route_demand.0.clone();
    step_demand.0.clear();

    for (stop_ref, mut waiting) in &mut stops {
        let Some(stop) = network.stops.get(&stop_ref.0) else {
            continue;
        };
        let event_mult = events.multiplier_for(stop.id, step);
        let raw = stop.base_demand * time_mult * weather_mult * event_mult;
        let noised = raw + sample_standard_normal(&mut rng.0) * raw * noise.ratio;
        let demand = noised.max(0.0) as u32;

        waiting.0 += demand;
        step_demand.0.insert(stop.id, demand);
    }

    route_demand.0.clear();
    for route in network.routes.values() {
        let total: u32 = route
            .stops
            .iter()
            .map(|s| step_demand.0.get(s).copied().unwrap_or(0))
            .sum();
        route_demand.0.insert(route.id, total);
    }
}

#[cfg(test)]
mod tests {
    use bevy_ecs::prelude::{Schedule, World};

    use super::*;
    use crate::ecs::StepDemand;
    use crate::network::StopId;
    use crate::scenario::{build_scenario, ScenarioParams};
    use crate::test_helpers::test_network;

    fn demand_only_world(params: ScenarioParams) -> (World, Schedule) {
        let mut world = World::new();
        build_scenario(&mut world, test_network(), params).expect("valid test network");
        let mut schedule = Schedule::default();
        schedule.add_systems(demand_system);
        (world, schedule)
    }

    #[test]
    fn backlog_accumulates_when_nothing_is_served() {
        let (mut world, mut schedule) = demand_only_world(ScenarioParams::default().with_seed(7));
        // Jump to the morning peak so demand is non-trivial.
        for _ in 0..28 {
            world.resource_mut::<StepClock>().advance();
        }
        schedule.run(&mut world);
        let after_one: u32 = world
            .query::<&Waiting>()
            .iter(&world)
            .map(|w| w.0)
            .sum();
        schedule.run(&mut world);
        let after_two: u32 = world
            .query::<&Waiting>()
            .iter(&world)
            .map(|w| w.0)
            .sum();

        assert!(after_one > 0, "peak-hour demand should be positive");
        assert!(after_two > after_one, "unserved demand must compound");
    }

    #[test]
    fn route_demand_sums_member_stops() {
        let (mut world, mut schedule) = demand_only_world(ScenarioParams::default().with_seed(7));
        for _ in 0..30 {
            world.resource_mut::<StepClock>().advance();
        }
        schedule.run(&mut world);

        let network = world.resource::<TransitNetwork>().clone();
        let step_demand = world.resource::<StepDemand>();
        let route_demand = world.resource::<RouteDemand>();
        for route in network.routes.values() {
            let expected: u32 = route
                .stops
                .iter()
                .map(|s| step_demand.0.get(s).copied().unwrap_or(0))
                .sum();
            assert_eq!(route_demand.0[&route.id], expected);
        }
    }

    #[test]
    fn same_seed_generates_identical_demand() {
        let (mut a, mut sched_a) = demand_only_world(ScenarioParams::default().with_seed(11));
        let (mut b, mut sched_b) = demand_only_world(ScenarioParams::default().with_seed(11));
        sched_a.run(&mut a);
        sched_b.run(&mut b);

        let da = a.resource::<StepDemand>().0.clone();
        let db = b.resource::<StepDemand>().0.clone();
        assert_eq!(da, db);
        assert!(da.keys().any(|s| *s == StopId(0)));
    }
}
