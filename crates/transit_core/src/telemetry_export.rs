//! Parquet export of run telemetry for offline analysis.

use std::error::Error;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray, UInt32Array, UInt64Array, UInt8Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use crate::telemetry::{RebalanceLog, Severity, SimSnapshots};

/// One row per (step, route) observation: demand, deployed capacity,
/// vehicle count, and utilization under the weather at that step.
pub fn write_route_observations_parquet<P: AsRef<Path>>(
    path: P,
    snapshots: &SimSnapshots,
) -> Result<(), Box<dyn Error>> {
    let mut step = Vec::new();
    let mut route_id = Vec::new();
    let mut demand = Vec::new();
    let mut capacity = Vec::new();
    let mut vehicles = Vec::new();
    let mut utilization = Vec::new();
    let mut weather = Vec::new();

    for snapshot in &snapshots.snapshots {
        let mut routes: Vec<_> = snapshot.route_demand.keys().copied().collect();
        routes.sort_unstable();
        for route in routes {
            step.push(snapshot.step as u64);
            route_id.push(route.0);
            demand.push(snapshot.route_demand.get(&route).copied().unwrap_or(0) as u64);
            capacity.push(snapshot.route_capacity.get(&route).copied().unwrap_or(0) as u64);
            vehicles.push(snapshot.route_vehicles.get(&route).copied().unwrap_or(0));
            utilization.push(snapshot.utilization(route));
            weather.push(snapshot.weather.code());
        }
    }

    let schema = Schema::new(vec![
        Field::new("step", DataType::UInt64, false),
        Field::new("route_id", DataType::UInt32, false),
        Field::new("demand", DataType::UInt64, false),
        Field::new("capacity", DataType::UInt64, false),
        Field::new("vehicles", DataType::UInt32, false),
        Field::new("utilization", DataType::Float64, false),
        Field::new("weather", DataType::UInt8, false),
    ]);

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(UInt64Array::from(step)),
        Arc::new(UInt32Array::from(route_id)),
        Arc::new(UInt64Array::from(demand)),
        Arc::new(UInt64Array::from(capacity)),
        Arc::new(UInt32Array::from(vehicles)),
        Arc::new(Float64Array::from(utilization)),
        Arc::new(UInt8Array::from(weather)),
    ];

    write_record_batch(path, schema, arrays)
}

/// One row per rebalancing move, in the order the moves happened.
pub fn write_rebalance_log_parquet<P: AsRef<Path>>(
    path: P,
    log: &RebalanceLog,
) -> Result<(), Box<dyn Error>> {
    let mut step = Vec::with_capacity(log.events.len());
    let mut from_route = Vec::with_capacity(log.events.len());
    let mut to_route = Vec::with_capacity(log.events.len());
    let mut vehicle = Vec::with_capacity(log.events.len());
    let mut severity = Vec::with_capacity(log.events.len());
    let mut weather = Vec::with_capacity(log.events.len());
    let mut reason = Vec::with_capacity(log.events.len());

    for event in &log.events {
        step.push(event.step as u64);
        from_route.push(event.from_route.0);
        to_route.push(event.to_route.0);
        vehicle.push(event.vehicle.0);
        severity.push(severity_code(event.severity));
        weather.push(event.weather.code());
        reason.push(event.reason.clone());
    }

    let schema = Schema::new(vec![
        Field::new("step", DataType::UInt64, false),
        Field::new("from_route", DataType::UInt32, false),
        Field::new("to_route", DataType::UInt32, false),
        Field::new("vehicle", DataType::UInt32, false),
        Field::new("severity", DataType::UInt8, false),
        Field::new("weather", DataType::UInt8, false),
        Field::new("reason", DataType::Utf8, false),
    ]);

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(UInt64Array::from(step)),
        Arc::new(UInt32Array::from(from_route)),
        Arc::new(UInt32Array::from(to_route)),
        Arc::new(UInt32Array::from(vehicle)),
        Arc::new(UInt8Array::from(severity)),
        Arc::new(UInt8Array::from(weather)),
        Arc::new(StringArray::from(reason)),
    ];

    write_record_batch(path, schema, arrays)
}

fn write_record_batch<P: AsRef<Path>>(
    path: P,
    schema: Schema,
    arrays: Vec<ArrayRef>,
) -> Result<(), Box<dyn Error>> {
    let schema = Arc::new(schema);
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn severity_code(severity: Severity) -> u8 {
    match severity {
        Severity::Warning => 0,
        Severity::Critical => 1,
    }
}
