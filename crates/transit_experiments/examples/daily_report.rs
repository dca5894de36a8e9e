//! Example: one simulated day on the sample city, with and without
//! rebalancing, printed as a comparison report.

use std::sync::Arc;

use transit_core::demand::EventCalendar;
use transit_core::network::TransitNetwork;
use transit_core::predictor::{PredictorHandle, TrendPredictor};
use transit_core::scenario::ScenarioParams;
use transit_experiments::run_comparison;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let network = TransitNetwork::sample_city(42);
    let params = ScenarioParams::default()
        .with_events(EventCalendar::sample_events().0)
        .with_predictor(PredictorHandle(Arc::new(TrendPredictor::new())));
    let outcome = run_comparison(&network, params)?;

    println!("=== Daily Report: sample city, 96 steps of 15 min ===\n");

    println!("{:<24} {:>12} {:>12}", "metric", "baseline", "rebalanced");
    println!(
        "{:<24} {:>12.1} {:>12.1}",
        "avg wait (min)",
        outcome.baseline.avg_wait_time_min,
        outcome.rebalancing.avg_wait_time_min
    );
    println!(
        "{:<24} {:>12.1} {:>12.1}",
        "overcrowding (%)",
        outcome.baseline.overcrowding_pct,
        outcome.rebalancing.overcrowding_pct
    );
    println!(
        "{:<24} {:>12.1} {:>12.1}",
        "idle vehicles (%)",
        outcome.baseline.idle_vehicle_pct,
        outcome.rebalancing.idle_vehicle_pct
    );
    println!(
        "{:<24} {:>12.1} {:>12.1}",
        "frustration index",
        outcome.baseline.frustration_index,
        outcome.rebalancing.frustration_index
    );
    println!(
        "{:<24} {:>12} {:>12}",
        "unserved passengers",
        outcome.baseline.unserved_passengers,
        outcome.rebalancing.unserved_passengers
    );

    println!("\nRebalancing moves made: {}", outcome.rebalance_moves);
    println!(
        "Wait time improvement:  {:.1}%",
        outcome.improvement.wait_time_pct
    );
    println!(
        "Frustration improvement: {:.1}%",
        outcome.improvement.frustration_pct
    );

    Ok(())
}
