// Public API
pub use intake::{EventError, EventPatch, NewEvent};
pub use models::{
    sort_canonical, ClockMark, CourtLocation, EventFilter, EventId, EventKind, GameContext,
    GameEvent, GameId, Period, Player, PlayerId, ScoreSnapshot, ShotCategory, TeamId, VideoMarker,
};
pub use repository::{
    EventStore, GameDirectory, InMemoryEventStore, InMemoryGameDirectory, PostgresGameStore,
};

// Internal modules
mod intake;
mod models;
mod repository;
