pub mod efficiency;
mod shot;

pub use efficiency::ShootingSplits;
pub use shot::ShotOutcome;
