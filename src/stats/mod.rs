pub mod calculators;
pub mod clock;
pub mod engine;
pub mod ledger;
pub mod models;
pub mod repository;
pub mod service;
pub mod shot_chart;
pub mod trackers;

pub use engine::{AggregationEngine, Touched};
pub use ledger::GameLedger;
pub use models::*;
pub use repository::{AggregateStore, InMemoryAggregateStore, PostgresAggregateStore};
pub use service::{StatsService, StatsServiceBuilder};
pub use shot_chart::{ShotChart, ShotChartEntry, ShotChartFilter};
pub use trackers::ReboundKind;
