pub mod clock;
pub mod demand;
pub mod ecs;
pub mod metrics;
pub mod network;
pub mod predictor;
pub mod runner;
pub mod scenario;
pub mod systems;
pub mod telemetry;
pub mod telemetry_export;
pub mod weather;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
