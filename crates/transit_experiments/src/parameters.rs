//! Parameter variation framework for exploring rebalancing configurations.
//!
//! Supports grid search (Cartesian product over the specified dimensions)
//! and random sampling. Dimensions left unspecified fall back to the base
//! scenario's values.

use std::collections::HashSet;

use transit_core::scenario::ScenarioParams;

/// A single parameter configuration for a simulation run.
///
/// Wraps `ScenarioParams` with experiment metadata for tracking and
/// reproducibility.
#[derive(Debug, Clone)]
pub struct ParameterSet {
    /// Base scenario parameters.
    pub params: ScenarioParams,
    /// Unique experiment ID for this parameter configuration.
    pub experiment_id: String,
    /// Run ID within the experiment (for multiple runs with same params).
    pub run_id: usize,
    /// Seed used for this run (ensures reproducibility).
    pub seed: u64,
}

impl ParameterSet {
    pub fn new(params: ScenarioParams, experiment_id: String, run_id: usize, seed: u64) -> Self {
        Self {
            params,
            experiment_id,
            run_id,
            seed,
        }
    }

    /// Get the scenario params with this run's seed applied.
    pub fn scenario_params(&self) -> ScenarioParams {
        self.params.clone().with_seed(self.seed)
    }
}

/// Defines a parameter space for exploration.
#[derive(Debug, Clone)]
pub struct ParameterSpace {
    /// Base parameters (used as defaults for unspecified dimensions).
    base: ScenarioParams,
    seeds: Vec<u64>,
    rebalancing: Vec<bool>,
    overload_thresholds: Vec<f64>,
    idle_thresholds: Vec<f64>,
    donor_cooldowns: Vec<u32>,
    recipient_cooldowns: Vec<u32>,
    horizons: Vec<usize>,
}

impl ParameterSpace {
    pub fn new() -> Self {
        Self {
            base: ScenarioParams::default(),
            seeds: vec![],
            rebalancing: vec![],
            overload_thresholds: vec![],
            idle_thresholds: vec![],
            donor_cooldowns: vec![],
            recipient_cooldowns: vec![],
            horizons: vec![],
        }
    }

    /// Create a new parameter space for grid search.
    pub fn grid() -> Self {
        Self::new()
    }

    pub fn seeds(mut self, seeds: Vec<u64>) -> Self {
        self.seeds = seeds;
        self
    }

    pub fn rebalancing(mut self, enabled: Vec<bool>) -> Self {
        self.rebalancing = enabled;
        self
    }

    pub fn overload_threshold(mut self, thresholds: Vec<f64>) -> Self {
        self.overload_thresholds = thresholds;
        self
    }

    pub fn idle_threshold(mut self, thresholds: Vec<f64>) -> Self {
        self.idle_thresholds = thresholds;
        self
    }

    pub fn donor_cooldown(mut self, cooldowns: Vec<u32>) -> Self {
        self.donor_cooldowns = cooldowns;
        self
    }

    pub fn recipient_cooldown(mut self, cooldowns: Vec<u32>) -> Self {
        self.recipient_cooldowns = cooldowns;
        self
    }

    pub fn horizon(mut self, horizons: Vec<usize>) -> Self {
        self.horizons = horizons;
        self
    }

    /// Set base parameters (used as defaults).
    pub fn with_base(mut self, base: ScenarioParams) -> Self {
        self.base = base;
        self
    }

    fn seeds_or_default(&self) -> Vec<u64> {
        if self.seeds.is_empty() {
            vec![self.base.seed]
        } else {
            self.seeds.clone()
        }
    }

    fn dimension<T: Clone>(values: &[T], default: T) -> Vec<T> {
        if values.is_empty() {
            vec![default]
        } else {
            values.to_vec()
        }
    }

    /// Generate all parameter sets using grid search (Cartesian product).
    pub fn generate(&self) -> Vec<ParameterSet> {
        let seeds = self.seeds_or_default();
        let rebalancing = Self::dimension(&self.rebalancing, self.base.policy.enabled);
        let overload = Self::dimension(&self.overload_thresholds, self.base.policy.overload_threshold);
        let idle = Self::dimension(&self.idle_thresholds, self.base.policy.idle_threshold);
        let donor = Self::dimension(&self.donor_cooldowns, self.base.policy.donor_cooldown);
        let recipient = Self::dimension(&self.recipient_cooldowns, self.base.policy.recipient_cooldown);
        let horizons = Self::dimension(&self.horizons, self.base.horizon);

        let mut sets = Vec::new();
        for &enabled in &rebalancing {
            for &overload_threshold in &overload {
                for &idle_threshold in &idle {
                    for &donor_cooldown in &donor {
                        for &recipient_cooldown in &recipient {
                            for &horizon in &horizons {
                                for (run_id, &seed) in seeds.iter().enumerate() {
                                    let params = self
                                        .base
                                        .clone()
                                        .with_rebalancing(enabled)
                                        .with_thresholds(overload_threshold, idle_threshold)
                                        .with_cooldowns(donor_cooldown, recipient_cooldown)
                                        .with_horizon(horizon);
                                    let experiment_id = format!("exp_{}", sets.len() / seeds.len());
                                    sets.push(ParameterSet::new(params, experiment_id, run_id, seed));
                                }
                            }
                        }
                    }
                }
            }
        }
        sets
    }

    /// Generate random parameter sets (Monte Carlo sampling).
    ///
    /// Samples `count` unique parameter sets from the defined space. Stops
    /// early if the space is too small to yield `count` distinct sets.
    pub fn sample_random(&self, count: usize, seed: u64) -> Vec<ParameterSet> {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(seed);
        let seeds = self.seeds_or_default();
        let rebalancing = Self::dimension(&self.rebalancing, self.base.policy.enabled);
        let overload = Self::dimension(&self.overload_thresholds, self.base.policy.overload_threshold);
        let idle = Self::dimension(&self.idle_thresholds, self.base.policy.idle_threshold);
        let donor = Self::dimension(&self.donor_cooldowns, self.base.policy.donor_cooldown);
        let recipient = Self::dimension(&self.recipient_cooldowns, self.base.policy.recipient_cooldown);
        let horizons = Self::dimension(&self.horizons, self.base.horizon);

        let mut sets = Vec::new();
        let mut seen = HashSet::new();
        let mut attempts = 0;
        const MAX_ATTEMPTS: usize = 10_000;

        while sets.len() < count && attempts < MAX_ATTEMPTS {
            attempts += 1;
            let run_seed = seeds[rng.gen_range(0..seeds.len())];
            let params = self
                .base
                .clone()
                .with_seed(run_seed)
                .with_rebalancing(rebalancing[rng.gen_range(0..rebalancing.len())])
                .with_thresholds(
                    overload[rng.gen_range(0..overload.len())],
                    idle[rng.gen_range(0..idle.len())],
                )
                .with_cooldowns(
                    donor[rng.gen_range(0..donor.len())],
                    recipient[rng.gen_range(0..recipient.len())],
                )
                .with_horizon(horizons[rng.gen_range(0..horizons.len())]);

            let fingerprint = format!("{params:?}");
            if !seen.insert(fingerprint) {
                continue;
            }

            sets.push(ParameterSet::new(
                params,
                format!("random_{}", sets.len()),
                0,
                run_seed,
            ));
        }

        sets
    }
}

impl Default for ParameterSpace {
    fn default() -> Self {
        Self::new()
    }
}
