//! Static transit network: stops, routes, and the base fleet allocation.
//!
//! Topology is built once per run and never changes afterwards. Everything is
//! keyed by id newtypes; callers never index routes or stops positionally.

use std::collections::HashMap;
use std::fmt;

use bevy_ecs::prelude::Resource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct StopId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RouteId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VehicleId(pub u32);

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", self.0)
    }
}

/// A stop on the network. Position is in the unit square; `base_demand` is
/// passengers per interval at nominal conditions.
#[derive(Debug, Clone)]
pub struct Stop {
    pub id: StopId,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub base_demand: f64,
}

/// Vehicle class served by a route; fixes per-vehicle seat capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RouteClass {
    Bus,
    Metro,
}

impl RouteClass {
    pub fn vehicle_capacity(self) -> u32 {
        match self {
            RouteClass::Bus => 50,
            RouteClass::Metro => 180,
        }
    }
}

/// An ordered sequence of at least two stops. Cycles through the same stop
/// are valid; `frequency_min` is the nominal interval between vehicles.
#[derive(Debug, Clone)]
pub struct Route {
    pub id: RouteId,
    pub name: String,
    pub stops: Vec<StopId>,
    pub frequency_min: u32,
    pub class: RouteClass,
}

/// Errors that make a network unusable. Surfaced before the first step;
/// a run never starts on an inconsistent graph.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("route {route} references unknown stop {stop}")]
    UnknownStop { route: RouteId, stop: StopId },
    #[error("route {route} has {count} stops, need at least 2")]
    TooFewStops { route: RouteId, count: usize },
    #[error("route {route} has no vehicles in the base fleet")]
    EmptyFleet { route: RouteId },
    #[error("network has no routes")]
    Empty,
}

/// The immutable route/stop graph plus the initial per-route fleet sizes.
#[derive(Debug, Clone, Resource)]
pub struct TransitNetwork {
    pub stops: HashMap<StopId, Stop>,
    pub routes: HashMap<RouteId, Route>,
    pub base_fleet: HashMap<RouteId, u32>,
}

impl TransitNetwork {
    pub fn new(stops: Vec<Stop>, routes: Vec<Route>, base_fleet: HashMap<RouteId, u32>) -> Self {
        Self {
            stops: stops.into_iter().map(|s| (s.id, s)).collect(),
            routes: routes.into_iter().map(|r| (r.id, r)).collect(),
            base_fleet,
        }
    }

    /// Checks the graph for fatal configuration errors.
    pub fn validate(&self) -> Result<(), NetworkError> {
        if self.routes.is_empty() {
            return Err(NetworkError::Empty);
        }
        for route in self.routes.values() {
            if route.stops.len() < 2 {
                return Err(NetworkError::TooFewStops {
                    route: route.id,
                    count: route.stops.len(),
                });
            }
            for stop in &route.stops {
                if !self.stops.contains_key(stop) {
                    return Err(NetworkError::UnknownStop {
                        route: route.id,
                        stop: *stop,
                    });
                }
            }
            if self.base_fleet.get(&route.id).copied().unwrap_or(0) == 0 {
                return Err(NetworkError::EmptyFleet { route: route.id });
            }
        }
        Ok(())
    }

    pub fn total_fleet(&self) -> u32 {
        self.base_fleet.values().sum()
    }

    /// Route ids in ascending order, for deterministic iteration.
    pub fn route_ids(&self) -> Vec<RouteId> {
        let mut ids: Vec<RouteId> = self.routes.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// A 40-stop, 8-route sample city with seeded positions and base demand.
    /// Deterministic for a given seed.
    pub fn sample_city(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let stops: Vec<Stop> = SAMPLE_STOP_NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| Stop {
                id: StopId(i as u32),
                name: (*name).to_string(),
                x: rng.gen_range(0.0..1.0),
                y: rng.gen_range(0.0..1.0),
                base_demand: rng.gen_range(5.0..25.0),
            })
            .collect();

        let specs: [(&str, &[u32], u32, RouteClass, u32); 8] = [
            ("Airport Express", &[0, 1, 2, 3, 4], 8, RouteClass::Bus, 3),
            ("Tech Shuttle", &[0, 5, 6, 7, 8], 10, RouteClass::Bus, 3),
            ("Old Town Loop", &[9, 10, 11, 12, 13], 12, RouteClass::Bus, 2),
            ("Market Residential", &[14, 15, 16, 17, 18], 15, RouteClass::Bus, 3),
            ("Suburb Ring", &[19, 20, 21, 22, 23], 20, RouteClass::Bus, 2),
            ("Civic Connector", &[24, 25, 26, 27, 28], 10, RouteClass::Bus, 2),
            ("Leisure Line", &[29, 30, 31, 32, 33], 12, RouteClass::Bus, 2),
            ("Harbor Rail Link", &[34, 35, 36, 37, 38], 7, RouteClass::Metro, 3),
        ];

        let mut routes = Vec::with_capacity(specs.len());
        let mut base_fleet = HashMap::new();
        for (i, (name, stop_ids, frequency_min, class, fleet)) in specs.iter().enumerate() {
            let id = RouteId(i as u32);
            routes.push(Route {
                id,
                name: (*name).to_string(),
                stops: stop_ids.iter().map(|s| StopId(*s)).collect(),
                frequency_min: *frequency_min,
                class: *class,
            });
            base_fleet.insert(id, *fleet);
        }

        Self::new(stops, routes, base_fleet)
    }
}

const SAMPLE_STOP_NAMES: [&str; 40] = [
    "Central Station",
    "City Hall",
    "University",
    "Hospital",
    "Airport",
    "Mall East",
    "Mall West",
    "Stadium",
    "Tech Park",
    "Old Town",
    "Harbor",
    "Museum",
    "Library",
    "Park North",
    "Park South",
    "Market Square",
    "Industrial Zone",
    "Residential A",
    "Residential B",
    "Residential C",
    "Suburb North",
    "Suburb South",
    "Suburb East",
    "Suburb West",
    "School District",
    "Business Hub",
    "Finance District",
    "Convention Ctr",
    "Sports Complex",
    "Night Market",
    "Hill Top",
    "River Crossing",
    "Botanical Garden",
    "Zoo",
    "Train Depot",
    "Bus Terminal",
    "Civic Center",
    "Arts District",
    "Waterfront",
    "Gateway Plaza",
];

#[cfg(test)]
mod tests {
    use super::*;

    fn two_stop_route(id: u32, stops: &[u32]) -> Route {
        Route {
            id: RouteId(id),
            name: format!("line {id}"),
            stops: stops.iter().map(|s| StopId(*s)).collect(),
            frequency_min: 10,
            class: RouteClass::Bus,
        }
    }

    fn stop(id: u32) -> Stop {
        Stop {
            id: StopId(id),
            name: format!("stop {id}"),
            x: 0.0,
            y: 0.0,
            base_demand: 10.0,
        }
    }

    #[test]
    fn valid_network_passes_validation() {
        let network = TransitNetwork::new(
            vec![stop(0), stop(1)],
            vec![two_stop_route(0, &[0, 1])],
            HashMap::from([(RouteId(0), 2)]),
        );
        assert!(network.validate().is_ok());
    }

    #[test]
    fn unknown_stop_is_fatal() {
        let network = TransitNetwork::new(
            vec![stop(0)],
            vec![two_stop_route(0, &[0, 9])],
            HashMap::from([(RouteId(0), 2)]),
        );
        assert!(matches!(
            network.validate(),
            Err(NetworkError::UnknownStop {
                route: RouteId(0),
                stop: StopId(9)
            })
        ));
    }

    #[test]
    fn single_stop_route_is_fatal() {
        let network = TransitNetwork::new(
            vec![stop(0)],
            vec![two_stop_route(0, &[0])],
            HashMap::from([(RouteId(0), 2)]),
        );
        assert!(matches!(
            network.validate(),
            Err(NetworkError::TooFewStops { count: 1, .. })
        ));
    }

    #[test]
    fn route_without_vehicles_is_fatal() {
        let network = TransitNetwork::new(
            vec![stop(0), stop(1)],
            vec![two_stop_route(0, &[0, 1])],
            HashMap::new(),
        );
        assert!(matches!(
            network.validate(),
            Err(NetworkError::EmptyFleet { route: RouteId(0) })
        ));
    }

    #[test]
    fn sample_city_is_deterministic_and_valid() {
        let a = TransitNetwork::sample_city(42);
        let b = TransitNetwork::sample_city(42);
        assert!(a.validate().is_ok());
        assert_eq!(a.stops.len(), 40);
        assert_eq!(a.routes.len(), 8);
        assert_eq!(a.total_fleet(), 20);
        for id in a.route_ids() {
            let (sa, sb) = (&a.stops[&a.routes[&id].stops[0]], &b.stops[&b.routes[&id].stops[0]]);
            assert_eq!(sa.base_demand, sb.base_demand);
            assert_eq!(sa.x, sb.x);
        }
    }

    #[test]
    fn metro_vehicles_carry_more_than_buses() {
        assert_eq!(RouteClass::Bus.vehicle_capacity(), 50);
        assert_eq!(RouteClass::Metro.vehicle_capacity(), 180);
    }
}
