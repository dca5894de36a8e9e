//! Example: grid sweep over rebalancing thresholds and cooldowns.
//!
//! Runs every combination in parallel on the sample city, prints the best
//! configuration by frustration index, and exports all results to CSV.

use transit_core::network::TransitNetwork;
use transit_experiments::{
    export_to_csv, find_best_result_index, run_parallel_experiments, ParameterSpace,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("Starting parameter sweep...");
    let space = ParameterSpace::grid()
        .overload_threshold(vec![0.75, 0.82, 0.9])
        .idle_threshold(vec![0.2, 0.25, 0.3])
        .donor_cooldown(vec![2, 4, 8])
        .seeds(vec![1, 2, 3]);

    let parameter_sets = space.generate();
    println!("Generated {} parameter combinations", parameter_sets.len());

    let network = TransitNetwork::sample_city(42);
    let results = run_parallel_experiments(&network, parameter_sets.clone(), None);
    println!("Completed {} simulations", results.len());

    let best_idx = find_best_result_index(&results).expect("no results to analyze");
    let best = &results[best_idx];
    let best_policy = &parameter_sets[best_idx].params.policy;

    println!("\n=== Best Configuration ===");
    println!("Experiment:         {}", best.experiment_id);
    println!("Overload threshold: {:.2}", best_policy.overload_threshold);
    println!("Idle threshold:     {:.2}", best_policy.idle_threshold);
    println!("Donor cooldown:     {}", best_policy.donor_cooldown);
    println!("Frustration index:  {:.1}", best.metrics.frustration_index);
    println!("Avg wait:           {:.1} min", best.metrics.avg_wait_time_min);
    println!("Unserved:           {}", best.metrics.unserved_passengers);

    export_to_csv(&results, &parameter_sets, "sweep_results.csv")?;
    println!("\nExported to sweep_results.csv");

    Ok(())
}
