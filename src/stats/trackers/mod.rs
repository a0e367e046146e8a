mod lineup;
mod plus_minus;
mod rebound;

pub use lineup::LineupTracker;
pub use plus_minus::PlusMinusDistributor;
pub use rebound::{MissIndex, ReboundAttributor, ReboundKind};
