//! Simulation runner: drives the per-step schedule over the operating day.
//!
//! One step = demand generation, then service, then rebalancing rounds,
//! then snapshot capture, strictly in that order. The clock advances only
//! after the whole schedule ran, so step `t+1` always sees the state step
//! `t` left behind. Callers can drive the loop one step at a time.

use bevy_ecs::prelude::{Schedule, World};
use bevy_ecs::schedule::IntoSystemConfigs;

use crate::clock::StepClock;
use crate::systems::demand::demand_system;
use crate::systems::rebalance::rebalance_system;
use crate::systems::service::service_system;
use crate::systems::snapshot::capture_snapshot_system;

/// The chained per-step schedule.
pub fn simulation_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            demand_system,
            service_system,
            rebalance_system,
            capture_snapshot_system,
        )
            .chain(),
    );
    schedule
}

/// Runs one full step and advances the clock. Returns `false` once the
/// horizon is reached (the step is not run).
pub fn run_step(world: &mut World, schedule: &mut Schedule) -> bool {
    if world.resource::<StepClock>().is_finished() {
        return false;
    }
    schedule.run(world);
    world.resource_mut::<StepClock>().advance();
    true
}

/// Runs the remaining steps to the horizon; returns how many ran.
pub fn run_to_completion(world: &mut World, schedule: &mut Schedule) -> usize {
    let mut steps = 0;
    while run_step(world, schedule) {
        steps += 1;
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{build_scenario, ScenarioParams};
    use crate::telemetry::SimSnapshots;
    use crate::test_helpers::test_network;

    #[test]
    fn run_stops_exactly_at_the_horizon() {
        let mut world = World::new();
        build_scenario(
            &mut world,
            test_network(),
            ScenarioParams::default().with_horizon(12),
        )
        .expect("valid test network");
        let mut schedule = simulation_schedule();

        assert_eq!(run_to_completion(&mut world, &mut schedule), 12);
        assert!(!run_step(&mut world, &mut schedule), "horizon is final");
        assert_eq!(world.resource::<SimSnapshots>().snapshots.len(), 12);
    }

    #[test]
    fn incremental_stepping_matches_full_runs() {
        let params = ScenarioParams::default().with_seed(9).with_horizon(10);

        let mut full = World::new();
        build_scenario(&mut full, test_network(), params.clone()).unwrap();
        let mut schedule = simulation_schedule();
        run_to_completion(&mut full, &mut schedule);

        let mut stepped = World::new();
        build_scenario(&mut stepped, test_network(), params).unwrap();
        let mut schedule = simulation_schedule();
        for _ in 0..4 {
            assert!(run_step(&mut stepped, &mut schedule));
        }
        run_to_completion(&mut stepped, &mut schedule);

        let a = &full.resource::<SimSnapshots>().snapshots;
        let b = &stepped.resource::<SimSnapshots>().snapshots;
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.step, y.step);
            assert_eq!(x.route_demand, y.route_demand);
            assert_eq!(x.route_vehicles, y.route_vehicles);
        }
    }
}
