//! Small hand-built networks for tests and benches.
//!
//! Compiled into downstream crates through the `test-helpers` feature so
//! experiment code can exercise the same fixtures the unit tests use.

use std::collections::HashMap;

use crate::network::{Route, RouteClass, RouteId, Stop, StopId, TransitNetwork};

fn stop(id: u32, base_demand: f64) -> Stop {
    Stop {
        id: StopId(id),
        name: format!("stop {id}"),
        x: (id as f64) * 0.1,
        y: 0.5,
        base_demand,
    }
}

fn bus_route(id: u32, stops: &[u32], frequency_min: u32) -> Route {
    Route {
        id: RouteId(id),
        name: format!("line {id}"),
        stops: stops.iter().map(|s| StopId(*s)).collect(),
        frequency_min,
        class: RouteClass::Bus,
    }
}

/// Two disjoint bus routes: a busy pair of stops on route 0 (2 vehicles,
/// 100 seats) and a quiet pair on route 1 (3 vehicles).
pub fn test_network() -> TransitNetwork {
    TransitNetwork::new(
        vec![stop(0, 20.0), stop(1, 10.0), stop(2, 2.0), stop(3, 2.0)],
        vec![bus_route(0, &[0, 1], 10), bus_route(1, &[2, 3], 12)],
        HashMap::from([(RouteId(0), 2), (RouteId(1), 3)]),
    )
}

/// Three disjoint bus routes with an undersized fleet on route 0, so a
/// rebalancer has two equally idle donors to choose from.
pub fn three_route_network() -> TransitNetwork {
    TransitNetwork::new(
        vec![
            stop(0, 25.0),
            stop(1, 15.0),
            stop(2, 3.0),
            stop(3, 3.0),
            stop(4, 3.0),
            stop(5, 3.0),
        ],
        vec![
            bus_route(0, &[0, 1], 8),
            bus_route(1, &[2, 3], 12),
            bus_route(2, &[4, 5], 12),
        ],
        HashMap::from([(RouteId(0), 2), (RouteId(1), 3), (RouteId(2), 3)]),
    )
}

/// One overloaded route and one oversupplied near-empty route; the
/// strongest possible case for moving vehicles around.
pub fn asymmetric_network() -> TransitNetwork {
    TransitNetwork::new(
        vec![stop(0, 60.0), stop(1, 40.0), stop(2, 0.5), stop(3, 0.5)],
        vec![bus_route(0, &[0, 1], 8), bus_route(1, &[2, 3], 15)],
        HashMap::from([(RouteId(0), 1), (RouteId(1), 4)]),
    )
}
