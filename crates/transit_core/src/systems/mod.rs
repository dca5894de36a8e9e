pub mod demand;
pub mod rebalance;
pub mod service;
pub mod snapshot;
