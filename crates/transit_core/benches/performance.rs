//! Performance benchmarks for transit_core using Criterion.rs.

use bevy_ecs::prelude::World;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use transit_core::network::TransitNetwork;
use transit_core::runner::{run_to_completion, simulation_schedule};
use transit_core::scenario::{build_scenario, ScenarioParams};

fn bench_simulation_run(c: &mut Criterion) {
    let horizons = vec![("quarter_day", 24), ("full_day", 96), ("week", 96 * 7)];

    let mut group = c.benchmark_group("simulation_run");
    for (name, horizon) in horizons {
        group.bench_with_input(BenchmarkId::from_parameter(name), &horizon, |b, &horizon| {
            b.iter(|| {
                let mut world = World::new();
                let params = ScenarioParams::default()
                    .with_seed(42)
                    .with_horizon(horizon);
                build_scenario(&mut world, TransitNetwork::sample_city(42), params)
                    .expect("sample city should validate");
                let mut schedule = simulation_schedule();
                black_box(run_to_completion(&mut world, &mut schedule));
            });
        });
    }
    group.finish();
}

fn bench_rebalancing_overhead(c: &mut Criterion) {
    let mut group = c.benchmark_group("rebalancing_overhead");
    for (name, enabled) in [("static_fleet", false), ("rebalancing", true)] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut world = World::new();
                let params = ScenarioParams::default().with_rebalancing(enabled);
                build_scenario(&mut world, TransitNetwork::sample_city(42), params)
                    .expect("sample city should validate");
                let mut schedule = simulation_schedule();
                black_box(run_to_completion(&mut world, &mut schedule));
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_simulation_run, bench_rebalancing_overhead);
criterion_main!(benches);
