// Infrastructure layer: configuration and logging setup

pub mod config;
pub mod telemetry;

pub use config::{ConfigError, PlannerConfig};
pub use telemetry::init_tracing;
