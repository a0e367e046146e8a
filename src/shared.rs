use std::fmt;
use thiserror::Error;

use crate::game::{EventError, EventId, GameId, PlayerId, TeamId};

/// An event names an entity that does not exist for its game
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DanglingReference {
    Player(PlayerId),
    Team(TeamId),
}

impl fmt::Display for DanglingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DanglingReference::Player(id) => write!(f, "player {id} does not exist"),
            DanglingReference::Team(id) => write!(f, "team '{id}' does not play in this game"),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Game {0} not found")]
    GameNotFound(GameId),

    #[error("Event {event} not found in game {game}")]
    EventNotFound { game: GameId, event: EventId },

    #[error("Dangling reference in game {game}: {reference}")]
    DanglingReference {
        game: GameId,
        reference: DanglingReference,
    },

    #[error("Invalid event: {0}")]
    InvalidEvent(#[from] EventError),

    /// A stored kind outside the closed set: engine and schema disagree
    #[error("Unknown event kind '{0}'")]
    UnknownEventKind(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
