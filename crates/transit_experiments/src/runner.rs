//! Parallel simulation execution using rayon.
//!
//! Runs single parameter sets to completion, executes whole parameter
//! sweeps across available CPU cores, and drives the baseline-vs-rebalancing
//! comparison.

use bevy_ecs::prelude::World;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use rayon::prelude::*;
use serde::Serialize;
use transit_core::metrics::{
    compute_all_metrics, compute_improvement, ImprovementReport, MetricsReport,
};
use transit_core::network::TransitNetwork;
use transit_core::runner::{run_to_completion, simulation_schedule};
use transit_core::scenario::{build_scenario, ScenarioParams};
use transit_core::telemetry::{RebalanceLog, SimSnapshots};

use crate::parameters::ParameterSet;

/// Aggregated outcome of a single simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    pub experiment_id: String,
    pub run_id: usize,
    pub seed: u64,
    pub rebalancing_enabled: bool,
    pub rebalance_moves: usize,
    pub total_demand: u64,
    pub metrics: MetricsReport,
}

/// Run a single simulation with the given parameter set on `network`.
///
/// Creates a new world, builds the scenario, runs it to completion, and
/// computes metrics over the captured snapshots.
pub fn run_single_simulation(
    network: &TransitNetwork,
    param_set: &ParameterSet,
) -> Result<SimulationResult, Box<dyn std::error::Error>> {
    let params = param_set.scenario_params();
    let rebalancing_enabled = params.policy.enabled;

    let mut world = World::new();
    build_scenario(&mut world, network.clone(), params)?;
    let mut schedule = simulation_schedule();
    run_to_completion(&mut world, &mut schedule);

    let snapshots = &world.resource::<SimSnapshots>().snapshots;
    let metrics = compute_all_metrics(snapshots, &param_set.experiment_id);
    let total_demand = snapshots.iter().map(|s| s.total_demand).sum();
    let rebalance_moves = world.resource::<RebalanceLog>().events.len();

    Ok(SimulationResult {
        experiment_id: param_set.experiment_id.clone(),
        run_id: param_set.run_id,
        seed: param_set.seed,
        rebalancing_enabled,
        rebalance_moves,
        total_demand,
        metrics,
    })
}

/// Run multiple simulations in parallel.
///
/// Uses rayon to execute simulations concurrently across available CPU
/// cores; each run is independent with no shared state. Results come back
/// in the same order as the input parameter sets.
pub fn run_parallel_experiments(
    network: &TransitNetwork,
    parameter_sets: Vec<ParameterSet>,
    num_threads: Option<usize>,
) -> Vec<SimulationResult> {
    run_parallel_experiments_with_progress(network, parameter_sets, num_threads, true)
}

/// Run multiple simulations in parallel with an optional progress bar.
pub fn run_parallel_experiments_with_progress(
    network: &TransitNetwork,
    parameter_sets: Vec<ParameterSet>,
    num_threads: Option<usize>,
    show_progress: bool,
) -> Vec<SimulationResult> {
    let total = parameter_sets.len();
    let pb = if show_progress && total > 0 {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
                )
                .expect("progress template should parse")
                .progress_chars("#>-"),
        );
        Some(bar)
    } else {
        None
    };

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = num_threads {
        builder = builder.num_threads(threads);
    }
    let pool = builder.build().expect("thread pool should build");

    let pb_clone = pb.clone();
    let results = pool.install(|| {
        parameter_sets
            .par_iter()
            .map(|param_set| {
                let result = run_single_simulation(network, param_set)
                    .expect("simulation should run on a validated network");
                if let Some(ref progress_bar) = pb_clone {
                    progress_bar.inc(1);
                }
                result
            })
            .collect()
    });

    if let Some(ref progress_bar) = pb {
        progress_bar.finish_with_message("Completed");
    }

    results
}

/// Baseline-vs-rebalancing comparison for one scenario configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonOutcome {
    pub baseline: MetricsReport,
    pub rebalancing: MetricsReport,
    pub improvement: ImprovementReport,
    pub rebalance_moves: usize,
}

/// Run the same scenario twice, once with a static fleet and once with
/// rebalancing enabled, and report the improvement. Both arms share the
/// seed, so demand, weather, and events are identical.
pub fn run_comparison(
    network: &TransitNetwork,
    params: ScenarioParams,
) -> Result<ComparisonOutcome, Box<dyn std::error::Error>> {
    let baseline_set = ParameterSet::new(
        params.clone().with_rebalancing(false),
        "baseline".to_string(),
        0,
        params.seed,
    );
    let treatment_set = ParameterSet::new(
        params.clone().with_rebalancing(true),
        "rebalancing".to_string(),
        0,
        params.seed,
    );

    let baseline = run_single_simulation(network, &baseline_set)?;
    let treatment = run_single_simulation(network, &treatment_set)?;
    let improvement = compute_improvement(&baseline.metrics, &treatment.metrics);

    info!(
        "comparison complete: wait {:.1}% better, {} moves",
        improvement.wait_time_pct, treatment.rebalance_moves
    );

    Ok(ComparisonOutcome {
        baseline: baseline.metrics,
        rebalancing: treatment.metrics,
        improvement,
        rebalance_moves: treatment.rebalance_moves,
    })
}
