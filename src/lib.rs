// Library crate for the box score engine
// This file exposes the public API for the CLI and integration tests

pub mod config;
pub mod game;
pub mod shared;
pub mod stats;

// Re-export commonly used types for easier access in tests
pub use config::{AppConfig, EngineConfig};
pub use shared::{AppError, DanglingReference};
pub use stats::{AggregationEngine, StatsService};
