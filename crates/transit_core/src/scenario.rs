//! Scenario setup: run configuration and world construction.
//!
//! `build_scenario` validates the network up front (a run never starts on a
//! broken graph), inserts every resource the per-step systems need, and
//! spawns one entity per stop and per vehicle.

use bevy_ecs::prelude::{Resource, World};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::clock::StepClock;
use crate::demand::{DemandNoise, DemandRng, EventCalendar, SpecialEvent};
use crate::ecs::{PreviousRouteDemand, RouteDemand, StepDemand, StopRef, UtilizationHistory, Vehicle, Waiting};
use crate::network::{NetworkError, TransitNetwork, VehicleId};
use crate::predictor::PredictorHandle;
use crate::systems::rebalance::RebalanceState;
use crate::telemetry::{RebalanceLog, SimSnapshots};
use crate::weather::WeatherSequence;

/// Rebalancing policy knobs. All of these are configuration, injected per
/// run; none are hard-wired into the control loop.
#[derive(Debug, Clone, Copy, Resource)]
pub struct RebalancePolicyConfig {
    pub enabled: bool,
    pub overload_threshold: f64,
    pub idle_threshold: f64,
    pub critical_threshold: f64,
    pub donor_cooldown: u32,
    pub recipient_cooldown: u32,
    pub min_fleet: u32,
    pub max_moves_per_step: u32,
}

impl Default for RebalancePolicyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            overload_threshold: 0.82,
            idle_threshold: 0.25,
            critical_threshold: 0.95,
            donor_cooldown: 4,
            recipient_cooldown: 2,
            min_fleet: 1,
            max_moves_per_step: 2,
        }
    }
}

/// Service simulator knobs.
#[derive(Debug, Clone, Copy, Resource)]
pub struct ServiceConfig {
    /// Fraction of each vehicle's load that disembarks after boarding.
    pub alight_fraction: f64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self { alight_fraction: 0.4 }
    }
}

/// Parameters for one simulation run. A run is a pure function of these.
#[derive(Debug, Clone)]
pub struct ScenarioParams {
    pub seed: u64,
    pub horizon: usize,
    pub minutes_per_step: u32,
    pub demand_noise_ratio: f64,
    pub alight_fraction: f64,
    pub policy: RebalancePolicyConfig,
    pub events: Vec<SpecialEvent>,
    pub predictor: Option<PredictorHandle>,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            seed: 42,
            horizon: 96,
            minutes_per_step: 15,
            demand_noise_ratio: 0.09,
            alight_fraction: 0.4,
            policy: RebalancePolicyConfig::default(),
            events: Vec::new(),
            predictor: None,
        }
    }
}

impl ScenarioParams {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn with_rebalancing(mut self, enabled: bool) -> Self {
        self.policy.enabled = enabled;
        self
    }

    pub fn with_thresholds(mut self, overload: f64, idle: f64) -> Self {
        self.policy.overload_threshold = overload;
        self.policy.idle_threshold = idle;
        self
    }

    pub fn with_cooldowns(mut self, donor: u32, recipient: u32) -> Self {
        self.policy.donor_cooldown = donor;
        self.policy.recipient_cooldown = recipient;
        self
    }

    pub fn with_min_fleet(mut self, min_fleet: u32) -> Self {
        self.policy.min_fleet = min_fleet;
        self
    }

    pub fn with_events(mut self, events: Vec<SpecialEvent>) -> Self {
        self.events = events;
        self
    }

    pub fn with_predictor(mut self, predictor: PredictorHandle) -> Self {
        self.predictor = Some(predictor);
        self
    }
}

/// Populates `world` with resources, stop entities, and vehicle entities.
/// Fails before touching the world's entities if the network is inconsistent.
pub fn build_scenario(
    world: &mut World,
    network: TransitNetwork,
    params: ScenarioParams,
) -> Result<(), NetworkError> {
    network.validate()?;

    world.insert_resource(StepClock::new(params.horizon, params.minutes_per_step));
    world.insert_resource(WeatherSequence::generate(params.seed, params.horizon));
    world.insert_resource(EventCalendar(params.events.clone()));
    world.insert_resource(DemandNoise { ratio: params.demand_noise_ratio });
    world.insert_resource(DemandRng(StdRng::seed_from_u64(params.seed)));
    world.insert_resource(ServiceConfig { alight_fraction: params.alight_fraction });
    world.insert_resource(params.policy);
    world.insert_resource(RebalanceState::default());
    world.insert_resource(StepDemand::default());
    world.insert_resource(RouteDemand::default());
    world.insert_resource(PreviousRouteDemand::default());
    world.insert_resource(SimSnapshots::default());
    world.insert_resource(RebalanceLog::default());
    if let Some(predictor) = params.predictor.clone() {
        world.insert_resource(predictor);
    }

    // Spawn in ascending id order so per-stop RNG draws are deterministic.
    let mut stop_ids: Vec<_> = network.stops.keys().copied().collect();
    stop_ids.sort_unstable();
    for stop_id in stop_ids {
        world.spawn((StopRef(stop_id), Waiting(0)));
    }

    let mut next_vehicle = 0u32;
    for route_id in network.route_ids() {
        let route = &network.routes[&route_id];
        let fleet = network.base_fleet.get(&route_id).copied().unwrap_or(0);
        for _ in 0..fleet {
            world.spawn((
                Vehicle {
                    id: VehicleId(next_vehicle),
                    route: route_id,
                    capacity: route.class.vehicle_capacity(),
                    load: 0,
                },
                UtilizationHistory::default(),
            ));
            next_vehicle += 1;
        }
    }

    world.insert_resource(network);
    Ok(())
}
