//! Result export and ranking utilities.
//!
//! Experiment results go to JSON (raw result objects) or CSV (one row per
//! run, parameters and metrics side by side for spreadsheet analysis).

use std::fs::File;
use std::path::Path;

use crate::parameters::ParameterSet;
use crate::runner::SimulationResult;

/// Export simulation results to JSON format.
pub fn export_to_json(
    results: &[SimulationResult],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, results)?;
    Ok(())
}

/// Export simulation results with their parameters to CSV format.
///
/// Results and parameter sets are paired by index, so `results[i]` must
/// come from `parameter_sets[i]`.
pub fn export_to_csv(
    results: &[SimulationResult],
    parameter_sets: &[ParameterSet],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    if results.is_empty() {
        return Err("no results to export".into());
    }
    if results.len() != parameter_sets.len() {
        return Err(format!(
            "results length ({}) doesn't match parameter_sets length ({})",
            results.len(),
            parameter_sets.len()
        )
        .into());
    }

    let file = File::create(path)?;
    let mut wtr = csv::Writer::from_writer(file);

    wtr.write_record([
        "experiment_id",
        "run_id",
        "seed",
        "horizon",
        "rebalancing_enabled",
        "overload_threshold",
        "idle_threshold",
        "donor_cooldown",
        "recipient_cooldown",
        "min_fleet",
        "rebalance_moves",
        "total_demand",
        "avg_wait_time_min",
        "overcrowding_pct",
        "idle_vehicle_pct",
        "frustration_index",
        "unserved_passengers",
    ])?;

    for (result, param_set) in results.iter().zip(parameter_sets.iter()) {
        let policy = &param_set.params.policy;
        wtr.write_record([
            result.experiment_id.as_str(),
            &result.run_id.to_string(),
            &result.seed.to_string(),
            &param_set.params.horizon.to_string(),
            &result.rebalancing_enabled.to_string(),
            &policy.overload_threshold.to_string(),
            &policy.idle_threshold.to_string(),
            &policy.donor_cooldown.to_string(),
            &policy.recipient_cooldown.to_string(),
            &policy.min_fleet.to_string(),
            &result.rebalance_moves.to_string(),
            &result.total_demand.to_string(),
            &result.metrics.avg_wait_time_min.to_string(),
            &result.metrics.overcrowding_pct.to_string(),
            &result.metrics.idle_vehicle_pct.to_string(),
            &result.metrics.frustration_index.to_string(),
            &result.metrics.unserved_passengers.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Find the result with the lowest frustration index.
pub fn find_best_result_index(results: &[SimulationResult]) -> Option<usize> {
    results
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            a.metrics
                .frustration_index
                .partial_cmp(&b.metrics.frustration_index)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(idx, _)| idx)
}
