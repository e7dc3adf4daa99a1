pub mod alignment;
pub mod assembler;
pub mod config;
pub mod core;
pub mod error;
pub mod exporter;
pub mod loader;
pub mod planner;
pub mod routing;
pub mod utils;

pub use config::{ConfigError, MissionConfig, OutputPaths, PlannerConfig};
pub use error::{PlanError, Result};
pub use planner::{PlannedRoute, RoutePlanner, run_mission};
