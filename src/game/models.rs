use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use strum_macros::{AsRefStr, EnumIter, EnumString};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

numeric_id!(
    /// Identifier of a single game between two teams
    GameId
);
numeric_id!(PlayerId);
numeric_id!(
    /// Engine-assigned sequence number. Strictly increasing in append order.
    EventId
);

/// Team identifiers are free-form strings chosen by the league ("team_home", "hawks", ...)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub String);

impl TeamId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TeamId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TeamId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Closed set of event kinds a tagger can record.
///
/// Stored as its SCREAMING_SNAKE_CASE name; decoding any other string is an
/// engine/schema mismatch and fails loudly at the storage boundary.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    ShotMade,
    ShotMissed,
    Foul,
    /// Primary participant exits, secondary participant enters
    Substitution,
    Timeout,
    Turnover,
    Rebound,
    Steal,
    Block,
    /// Primary participant is the passer, secondary the scorer
    Assist,
    GameStart,
    GameEnd,
}

impl EventKind {
    pub fn is_shot(&self) -> bool {
        matches!(self, EventKind::ShotMade | EventKind::ShotMissed)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Game periods in chronological order. Declaration order is the ordinal.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    AsRefStr,
)]
pub enum Period {
    Q1,
    Q2,
    Q3,
    Q4,
    OT1,
    OT2,
}

impl Period {
    pub fn ordinal(&self) -> i16 {
        *self as i16
    }

    pub fn from_ordinal(ordinal: i16) -> Option<Self> {
        match ordinal {
            0 => Some(Period::Q1),
            1 => Some(Period::Q2),
            2 => Some(Period::Q3),
            3 => Some(Period::Q4),
            4 => Some(Period::OT1),
            5 => Some(Period::OT2),
            _ => None,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ShotCategory {
    TwoPoint,
    ThreePoint,
    FreeThrow,
}

/// A reading of the game clock: the period plus seconds remaining in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClockMark {
    pub period: Period,
    pub clock_seconds: u32,
}

impl ClockMark {
    pub fn new(period: Period, clock_seconds: u32) -> Self {
        Self {
            period,
            clock_seconds,
        }
    }
}

/// Loaded game context: the two participating teams
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameContext {
    pub id: GameId,
    pub name: String,
    pub home_team: TeamId,
    pub away_team: TeamId,
}

impl GameContext {
    pub fn participates(&self, team: &TeamId) -> bool {
        &self.home_team == team || &self.away_team == team
    }

    /// The other team of the game, or `None` if `team` is not playing in it
    pub fn opponent_of(&self, team: &TeamId) -> Option<&TeamId> {
        if team == &self.home_team {
            Some(&self.away_team)
        } else if team == &self.away_team {
            Some(&self.home_team)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub team_id: TeamId,
    pub jersey_number: Option<String>,
}

/// Position on the court in feet (x: 0-50, y: 0-47)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CourtLocation {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    pub home: u32,
    pub away: u32,
}

/// Where the moment can be found in raw footage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMarker {
    pub camera_id: String,
    pub timestamp_seconds: f64,
}

/// One immutable, recorded occurrence within a game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    pub id: EventId,
    pub game_id: GameId,
    pub kind: EventKind,
    pub period: Period,
    /// Seconds remaining in the period. Counts down.
    pub clock_seconds: u32,
    pub player_id: Option<PlayerId>,
    pub second_player_id: Option<PlayerId>,
    /// Team responsible for / in possession during the event
    pub team_id: TeamId,
    pub shot_category: Option<ShotCategory>,
    pub location: Option<CourtLocation>,
    pub score: Option<ScoreSnapshot>,
    pub video: Option<VideoMarker>,
    pub confidence: f64,
    pub recorded_at: DateTime<Utc>,
}

impl GameEvent {
    pub fn clock_mark(&self) -> ClockMark {
        ClockMark::new(self.period, self.clock_seconds)
    }

    pub fn involves(&self, player: PlayerId) -> bool {
        self.player_id == Some(player) || self.second_player_id == Some(player)
    }

    /// Ascending period, then descending clock, then ascending sequence id
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.period
            .cmp(&other.period)
            .then_with(|| other.clock_seconds.cmp(&self.clock_seconds))
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Optional narrowing of an event query. Empty matches everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct EventFilter {
    pub kind: Option<EventKind>,
    pub period: Option<Period>,
    /// Primary or secondary participant
    pub player_id: Option<PlayerId>,
}

impl EventFilter {
    pub fn matches(&self, event: &GameEvent) -> bool {
        self.kind.map_or(true, |k| event.kind == k)
            && self.period.map_or(true, |p| event.period == p)
            && self.player_id.map_or(true, |p| event.involves(p))
    }
}

/// Sorts events into canonical chronological order. Used for both replay and
/// timeline display so the two can never diverge.
pub fn sort_canonical(events: &mut [GameEvent]) {
    events.sort_by(GameEvent::canonical_cmp);
}
