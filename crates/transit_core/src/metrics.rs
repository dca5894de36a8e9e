//! Quality metrics over a snapshot sequence.
//!
//! Everything here is a pure function of `&[StepSnapshot]`: safe to run on
//! a live run's feed, a replay, or a synthetic baseline, and calling twice
//! gives identical results. The improvement report compares a
//! with-rebalancing run against a static baseline.

use serde::Serialize;

use crate::telemetry::StepSnapshot;

/// Utilization above which a (route, step) observation counts as
/// overcrowded.
pub const OVERCROWDED_UTILIZATION: f64 = 0.8;
/// Utilization below which a (route, step) observation counts as idle.
pub const IDLE_UTILIZATION: f64 = 0.2;
/// Wait beyond this many minutes saturates the frustration index's wait
/// term.
pub const MAX_TOLERABLE_WAIT_MIN: f64 = 30.0;

/// Mean estimated wait in minutes across all (route, step) observations.
/// Headway is `60 / vehicles`, inflated by the unserved share of demand.
pub fn avg_wait_time_min(snapshots: &[StepSnapshot]) -> f64 {
    let mut total = 0.0;
    let mut observations = 0usize;
    for snapshot in snapshots {
        for (route, demand) in &snapshot.route_demand {
            let capacity = snapshot.route_capacity.get(route).copied().unwrap_or(0);
            let vehicles = snapshot.route_vehicles.get(route).copied().unwrap_or(0);
            let headway = 60.0 / vehicles.max(1) as f64;
            let unserved_ratio =
                (*demand as f64 - capacity as f64).max(0.0) / (*demand).max(1) as f64;
            total += headway * (1.0 + unserved_ratio);
            observations += 1;
        }
    }
    if observations == 0 {
        0.0
    } else {
        total / observations as f64
    }
}

/// Fraction of (route, step) observations with utilization above 0.8.
pub fn overcrowding_ratio(snapshots: &[StepSnapshot]) -> f64 {
    let (mut overcrowded, mut total) = (0usize, 0usize);
    for snapshot in snapshots {
        for route in snapshot.route_demand.keys() {
            total += 1;
            if snapshot.utilization(*route) > OVERCROWDED_UTILIZATION {
                overcrowded += 1;
            }
        }
    }
    overcrowded as f64 / total.max(1) as f64
}

/// Percentage of (route, step) observations with utilization below 0.2.
pub fn idle_vehicle_pct(snapshots: &[StepSnapshot]) -> f64 {
    let (mut idle, mut total) = (0usize, 0usize);
    for snapshot in snapshots {
        for route in snapshot.route_demand.keys() {
            total += 1;
            if snapshot.utilization(*route) < IDLE_UTILIZATION {
                idle += 1;
            }
        }
    }
    idle as f64 / total.max(1) as f64 * 100.0
}

/// Composite 0-100 score, lower is better: 40% normalized wait, 40%
/// overcrowding, 20% idle capacity, clamped to 100.
pub fn frustration_index(avg_wait_min: f64, overcrowding: f64, idle_pct: f64) -> f64 {
    let normalized_wait = (avg_wait_min / MAX_TOLERABLE_WAIT_MIN).min(1.0) * 100.0;
    let score = 0.4 * normalized_wait + 0.4 * overcrowding * 100.0 + 0.2 * idle_pct;
    score.min(100.0)
}

/// Total passengers who could not board because demand exceeded capacity.
pub fn unserved_passengers(snapshots: &[StepSnapshot]) -> u64 {
    let mut total = 0u64;
    for snapshot in snapshots {
        for (route, demand) in &snapshot.route_demand {
            let capacity = snapshot.route_capacity.get(route).copied().unwrap_or(0);
            total += (*demand).saturating_sub(capacity) as u64;
        }
    }
    total
}

/// All scalar quality indicators for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub label: String,
    pub avg_wait_time_min: f64,
    pub overcrowding_pct: f64,
    pub idle_vehicle_pct: f64,
    pub frustration_index: f64,
    pub unserved_passengers: u64,
}

pub fn compute_all_metrics(snapshots: &[StepSnapshot], label: &str) -> MetricsReport {
    let avg_wait = avg_wait_time_min(snapshots);
    let overcrowding = overcrowding_ratio(snapshots);
    let idle_pct = idle_vehicle_pct(snapshots);
    MetricsReport {
        label: label.to_string(),
        avg_wait_time_min: avg_wait,
        overcrowding_pct: overcrowding * 100.0,
        idle_vehicle_pct: idle_pct,
        frustration_index: frustration_index(avg_wait, overcrowding, idle_pct),
        unserved_passengers: unserved_passengers(snapshots),
    }
}

/// Percentage improvement of `treatment` over `baseline` per metric;
/// positive means the treatment did better. Zero when the baseline is zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImprovementReport {
    pub wait_time_pct: f64,
    pub overcrowding_pct: f64,
    pub idle_pct: f64,
    pub frustration_pct: f64,
    pub unserved_pct: f64,
}

pub fn compute_improvement(baseline: &MetricsReport, treatment: &MetricsReport) -> ImprovementReport {
    fn pct(baseline: f64, treatment: f64) -> f64 {
        if baseline == 0.0 {
            0.0
        } else {
            (baseline - treatment) / baseline * 100.0
        }
    }

    ImprovementReport {
        wait_time_pct: pct(baseline.avg_wait_time_min, treatment.avg_wait_time_min),
        overcrowding_pct: pct(baseline.overcrowding_pct, treatment.overcrowding_pct),
        idle_pct: pct(baseline.idle_vehicle_pct, treatment.idle_vehicle_pct),
        frustration_pct: pct(baseline.frustration_index, treatment.frustration_index),
        unserved_pct: pct(
            baseline.unserved_passengers as f64,
            treatment.unserved_passengers as f64,
        ),
    }
}

/// Per-step aggregates for time-series consumers.
#[derive(Debug, Clone, Serialize)]
pub struct StepMetrics {
    pub step: usize,
    pub time_label: String,
    pub avg_utilization: f64,
    pub overcrowded_routes: usize,
    pub total_demand: u64,
    pub total_capacity: u64,
    pub weather: &'static str,
}

pub fn per_step_metrics(snapshots: &[StepSnapshot]) -> Vec<StepMetrics> {
    snapshots
        .iter()
        .map(|snapshot| {
            let routes = snapshot.route_demand.len();
            let avg_utilization = if routes == 0 {
                0.0
            } else {
                snapshot
                    .route_demand
                    .keys()
                    .map(|r| snapshot.utilization(*r))
                    .sum::<f64>()
                    / routes as f64
            };
            StepMetrics {
                step: snapshot.step,
                time_label: snapshot.time_label.clone(),
                avg_utilization,
                overcrowded_routes: snapshot
                    .route_demand
                    .keys()
                    .filter(|r| snapshot.utilization(**r) > OVERCROWDED_UTILIZATION)
                    .count(),
                total_demand: snapshot.total_demand,
                total_capacity: snapshot.total_capacity,
                weather: snapshot.weather.label(),
            }
        })
        .collect()
}
