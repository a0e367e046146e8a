use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use super::models::{
    CourtLocation, EventId, EventKind, GameContext, GameEvent, GameId, Period, PlayerId,
    ScoreSnapshot, ShotCategory, TeamId, VideoMarker,
};

/// Reasons an event is rejected before it reaches the aggregation engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EventError {
    #[error("team_id must not be empty")]
    EmptyTeam,

    #[error("team '{team}' is not a participant in game {game}")]
    TeamNotInGame { team: TeamId, game: GameId },

    #[error("shot_category is required for {0} events")]
    MissingShotCategory(EventKind),

    #[error("shot_category should only be set for shot events, not {0}")]
    UnexpectedShotCategory(EventKind),

    #[error("{kind} requires {role}")]
    MissingParticipant { kind: EventKind, role: &'static str },

    #[error("game clock must be >= 0, got {0}")]
    NegativeClock(i64),

    #[error("game clock {0} does not fit in a period")]
    ClockOutOfRange(i64),

    #[error("score {0} is out of range")]
    ScoreOutOfRange(u32),

    #[error("confidence must be within [0, 1], got {0}")]
    ConfidenceOutOfRange(f64),
}

fn default_confidence() -> f64 {
    1.0
}

/// An event as submitted by a tagger, before a sequence id is assigned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub kind: EventKind,
    pub period: Period,
    pub clock_seconds: i64,
    #[serde(default)]
    pub player_id: Option<PlayerId>,
    #[serde(default)]
    pub second_player_id: Option<PlayerId>,
    pub team_id: TeamId,
    #[serde(default)]
    pub shot_category: Option<ShotCategory>,
    #[serde(default)]
    pub location: Option<CourtLocation>,
    #[serde(default)]
    pub score: Option<ScoreSnapshot>,
    #[serde(default)]
    pub video: Option<VideoMarker>,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

impl NewEvent {
    pub fn new(kind: EventKind, period: Period, clock_seconds: i64, team_id: TeamId) -> Self {
        Self {
            kind,
            period,
            clock_seconds,
            player_id: None,
            second_player_id: None,
            team_id,
            shot_category: None,
            location: None,
            score: None,
            video: None,
            confidence: default_confidence(),
        }
    }

    pub fn with_player(mut self, player_id: PlayerId) -> Self {
        self.player_id = Some(player_id);
        self
    }

    pub fn with_second_player(mut self, player_id: PlayerId) -> Self {
        self.second_player_id = Some(player_id);
        self
    }

    pub fn with_shot(mut self, category: ShotCategory) -> Self {
        self.shot_category = Some(category);
        self
    }

    pub fn with_location(mut self, x: f64, y: f64) -> Self {
        self.location = Some(CourtLocation { x, y });
        self
    }

    pub fn with_video(mut self, camera_id: &str, timestamp_seconds: f64) -> Self {
        self.video = Some(VideoMarker {
            camera_id: camera_id.to_string(),
            timestamp_seconds,
        });
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Checks the per-kind field requirements and the team's participation.
    ///
    /// The aggregation engine trusts everything that passes here.
    pub fn validate(&self, game: &GameContext) -> Result<(), EventError> {
        if self.team_id.as_str().trim().is_empty() {
            return Err(EventError::EmptyTeam);
        }
        if !game.participates(&self.team_id) {
            return Err(EventError::TeamNotInGame {
                team: self.team_id.clone(),
                game: game.id,
            });
        }

        if self.kind.is_shot() {
            if self.shot_category.is_none() {
                return Err(EventError::MissingShotCategory(self.kind));
            }
        } else if self.shot_category.is_some() {
            return Err(EventError::UnexpectedShotCategory(self.kind));
        }

        match self.kind {
            EventKind::Substitution | EventKind::Assist => {
                if self.player_id.is_none() {
                    return Err(EventError::MissingParticipant {
                        kind: self.kind,
                        role: "player_id",
                    });
                }
                if self.second_player_id.is_none() {
                    return Err(EventError::MissingParticipant {
                        kind: self.kind,
                        role: "second_player_id",
                    });
                }
            }
            EventKind::Foul
            | EventKind::Steal
            | EventKind::Block
            | EventKind::Turnover
            | EventKind::Rebound => {
                if self.player_id.is_none() {
                    return Err(EventError::MissingParticipant {
                        kind: self.kind,
                        role: "player_id",
                    });
                }
            }
            EventKind::ShotMade
            | EventKind::ShotMissed
            | EventKind::Timeout
            | EventKind::GameStart
            | EventKind::GameEnd => {}
        }

        if self.clock_seconds < 0 {
            return Err(EventError::NegativeClock(self.clock_seconds));
        }
        // Stored as a signed 32-bit column
        if i32::try_from(self.clock_seconds).is_err() {
            return Err(EventError::ClockOutOfRange(self.clock_seconds));
        }
        if let Some(score) = self.score {
            for value in [score.home, score.away] {
                if i32::try_from(value).is_err() {
                    return Err(EventError::ScoreOutOfRange(value));
                }
            }
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(EventError::ConfidenceOutOfRange(self.confidence));
        }

        Ok(())
    }

    /// Materializes the event. Call only after [`NewEvent::validate`] succeeded.
    pub fn into_event(
        self,
        id: EventId,
        game_id: GameId,
        recorded_at: DateTime<Utc>,
    ) -> GameEvent {
        GameEvent {
            id,
            game_id,
            kind: self.kind,
            period: self.period,
            clock_seconds: u32::try_from(self.clock_seconds).unwrap_or_default(),
            player_id: self.player_id,
            second_player_id: self.second_player_id,
            team_id: self.team_id,
            shot_category: self.shot_category,
            location: self.location,
            score: self.score,
            video: self.video,
            confidence: self.confidence,
            recorded_at,
        }
    }
}

impl From<&GameEvent> for NewEvent {
    fn from(event: &GameEvent) -> Self {
        Self {
            kind: event.kind,
            period: event.period,
            clock_seconds: i64::from(event.clock_seconds),
            player_id: event.player_id,
            second_player_id: event.second_player_id,
            team_id: event.team_id.clone(),
            shot_category: event.shot_category,
            location: event.location,
            score: event.score,
            video: event.video.clone(),
            confidence: event.confidence,
        }
    }
}

// Distinguishes an absent field (keep) from an explicit null (clear).
fn explicit<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial correction of a recorded event. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPatch {
    #[serde(default)]
    pub kind: Option<EventKind>,
    #[serde(default)]
    pub period: Option<Period>,
    #[serde(default)]
    pub clock_seconds: Option<i64>,
    #[serde(default, deserialize_with = "explicit")]
    pub player_id: Option<Option<PlayerId>>,
    #[serde(default, deserialize_with = "explicit")]
    pub second_player_id: Option<Option<PlayerId>>,
    #[serde(default)]
    pub team_id: Option<TeamId>,
    #[serde(default, deserialize_with = "explicit")]
    pub shot_category: Option<Option<ShotCategory>>,
    #[serde(default, deserialize_with = "explicit")]
    pub location: Option<Option<CourtLocation>>,
    #[serde(default, deserialize_with = "explicit")]
    pub score: Option<Option<ScoreSnapshot>>,
    #[serde(default, deserialize_with = "explicit")]
    pub video: Option<Option<VideoMarker>>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl EventPatch {
    /// Overlays the patch on a recorded event, producing the corrected draft.
    /// The draft must be validated again before it replaces the original.
    pub fn apply_to(&self, event: &GameEvent) -> NewEvent {
        let mut draft = NewEvent::from(event);
        if let Some(kind) = self.kind {
            draft.kind = kind;
        }
        if let Some(period) = self.period {
            draft.period = period;
        }
        if let Some(clock_seconds) = self.clock_seconds {
            draft.clock_seconds = clock_seconds;
        }
        if let Some(player_id) = self.player_id {
            draft.player_id = player_id;
        }
        if let Some(second_player_id) = self.second_player_id {
            draft.second_player_id = second_player_id;
        }
        if let Some(team_id) = &self.team_id {
            draft.team_id = team_id.clone();
        }
        if let Some(shot_category) = self.shot_category {
            draft.shot_category = shot_category;
        }
        if let Some(location) = self.location {
            draft.location = location;
        }
        if let Some(score) = self.score {
            draft.score = score;
        }
        if let Some(video) = &self.video {
            draft.video = video.clone();
        }
        if let Some(confidence) = self.confidence {
            draft.confidence = confidence;
        }
        draft
    }
}
