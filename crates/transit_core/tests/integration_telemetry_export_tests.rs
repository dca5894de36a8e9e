use std::fs::File;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use bevy_ecs::prelude::World;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use transit_core::network::TransitNetwork;
use transit_core::runner::{run_to_completion, simulation_schedule};
use transit_core::scenario::{build_scenario, ScenarioParams};
use transit_core::telemetry::{RebalanceLog, SimSnapshots};
use transit_core::telemetry_export::{
    write_rebalance_log_parquet, write_route_observations_parquet,
};

fn temp_parquet_path(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock should be after epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("{prefix}_{nanos}.parquet"))
}

fn parquet_field_specs(path: &PathBuf) -> Vec<(String, String, bool)> {
    let file = File::open(path).expect("parquet file should exist");
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).expect("parquet reader should build");
    builder
        .schema()
        .fields()
        .iter()
        .map(|field| {
            (
                field.name().to_string(),
                field.data_type().to_string(),
                field.is_nullable(),
            )
        })
        .collect()
}

fn parquet_row_count(path: &PathBuf) -> usize {
    let file = File::open(path).expect("parquet file should exist");
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .expect("parquet reader should build")
        .build()
        .expect("parquet reader should open");
    reader
        .map(|batch| batch.expect("batch should decode").num_rows())
        .sum()
}

fn run_short_simulation() -> World {
    let mut world = World::new();
    let network = TransitNetwork::sample_city(42);
    build_scenario(
        &mut world,
        network,
        ScenarioParams::default().with_horizon(24),
    )
    .expect("sample city should validate");
    let mut schedule = simulation_schedule();
    run_to_completion(&mut world, &mut schedule);
    world
}

#[test]
fn route_observations_schema_and_row_count() {
    let world = run_short_simulation();
    let snapshots = world.resource::<SimSnapshots>();
    let path = temp_parquet_path("route_observations");

    write_route_observations_parquet(&path, snapshots).expect("export should succeed");

    let specs = parquet_field_specs(&path);
    assert_eq!(
        specs,
        vec![
            ("step".to_string(), "UInt64".to_string(), false),
            ("route_id".to_string(), "UInt32".to_string(), false),
            ("demand".to_string(), "UInt64".to_string(), false),
            ("capacity".to_string(), "UInt64".to_string(), false),
            ("vehicles".to_string(), "UInt32".to_string(), false),
            ("utilization".to_string(), "Float64".to_string(), false),
            ("weather".to_string(), "UInt8".to_string(), false),
        ]
    );

    // 24 steps, 8 routes, one row per (step, route).
    assert_eq!(parquet_row_count(&path), 24 * 8);
    std::fs::remove_file(&path).ok();
}

#[test]
fn rebalance_log_schema_and_row_count() {
    let world = run_short_simulation();
    let log = world.resource::<RebalanceLog>();
    let path = temp_parquet_path("rebalance_log");

    write_rebalance_log_parquet(&path, log).expect("export should succeed");

    let specs = parquet_field_specs(&path);
    assert_eq!(
        specs,
        vec![
            ("step".to_string(), "UInt64".to_string(), false),
            ("from_route".to_string(), "UInt32".to_string(), false),
            ("to_route".to_string(), "UInt32".to_string(), false),
            ("vehicle".to_string(), "UInt32".to_string(), false),
            ("severity".to_string(), "UInt8".to_string(), false),
            ("weather".to_string(), "UInt8".to_string(), false),
            ("reason".to_string(), "Utf8".to_string(), false),
        ]
    );

    assert_eq!(parquet_row_count(&path), log.events.len());
    std::fs::remove_file(&path).ok();
}
