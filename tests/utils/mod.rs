pub mod actions;
pub mod assertions;
pub mod event_script;
pub mod mocks;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use assertions::{assert_counters_decompose, assert_period_points_add_up};
#[allow(unused_imports)]
pub use event_script::{permutations, EventScript};
#[allow(unused_imports)]
pub use mocks::FlakyAggregateStore;
#[allow(unused_imports)]
pub use setup::{TestSetup, TestSetupBuilder, AWAY, HOME};
