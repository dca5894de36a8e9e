//! Parallel experimentation framework for transit network simulations.
//!
//! This crate runs many simulations with varying rebalancing parameters,
//! compares rebalanced runs against a static-fleet baseline, and exports
//! the results for offline analysis.
//!
//! # Quick Start
//!
//! ```no_run
//! use transit_core::network::TransitNetwork;
//! use transit_experiments::{run_parallel_experiments, ParameterSpace};
//!
//! // Define parameter space (grid search)
//! let space = ParameterSpace::grid()
//!     .overload_threshold(vec![0.75, 0.82, 0.9])
//!     .donor_cooldown(vec![2, 4, 8])
//!     .seeds(vec![1, 2, 3]);
//!
//! let parameter_sets = space.generate();
//! let network = TransitNetwork::sample_city(42);
//! let results = run_parallel_experiments(&network, parameter_sets, None);
//! ```
//!
//! # Architecture
//!
//! - [`parameters`]: Parameter variation framework (grid search, random sampling)
//! - [`runner`]: Parallel simulation execution using rayon, plus the
//!   baseline-vs-rebalancing comparison
//! - [`export`]: Result export to CSV/JSON and result ranking

pub mod export;
pub mod parameters;
pub mod runner;

pub use export::{export_to_csv, export_to_json, find_best_result_index};
pub use parameters::{ParameterSet, ParameterSpace};
pub use runner::{run_comparison, run_parallel_experiments, run_single_simulation, SimulationResult};
