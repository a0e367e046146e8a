use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::intake::NewEvent;
use super::models::{
    sort_canonical, CourtLocation, EventId, EventKind, GameContext, GameEvent, GameId, Period,
    Player, PlayerId, ScoreSnapshot, ShotCategory, TeamId, VideoMarker,
};
use crate::shared::AppError;

/// Ordered, append-only log of game events
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Stores a validated event and assigns it the next sequence id
    async fn append(&self, game_id: GameId, event: NewEvent) -> Result<GameEvent, AppError>;

    async fn get(&self, game_id: GameId, event_id: EventId)
        -> Result<Option<GameEvent>, AppError>;

    /// Overwrites a recorded event in place, keeping its sequence id
    async fn replace(&self, event: &GameEvent) -> Result<(), AppError>;

    /// Puts a previously removed event back under its original sequence id
    async fn restore(&self, event: &GameEvent) -> Result<(), AppError>;

    /// Returns false if the event did not exist
    async fn delete(&self, game_id: GameId, event_id: EventId) -> Result<bool, AppError>;

    /// All events of the game in canonical chronological order
    async fn events_for_game(&self, game_id: GameId) -> Result<Vec<GameEvent>, AppError>;

    /// Most recent event of `kind` whose sequence id is below `before`
    async fn last_event_before(
        &self,
        game_id: GameId,
        kind: EventKind,
        before: EventId,
    ) -> Result<Option<GameEvent>, AppError>;

    /// Events naming the player as primary or secondary participant, across
    /// games, ordered by game then canonically
    async fn events_for_player(&self, player_id: PlayerId) -> Result<Vec<GameEvent>, AppError>;
}

/// Lookup of games and players referenced by events
#[async_trait]
pub trait GameDirectory: Send + Sync {
    async fn game(&self, game_id: GameId) -> Result<Option<GameContext>, AppError>;
    async fn player(&self, player_id: PlayerId) -> Result<Option<Player>, AppError>;
}

#[derive(Debug, Default)]
struct EventLog {
    last_id: i64,
    events: BTreeMap<EventId, GameEvent>,
}

/// In-memory event log for development and testing
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    log: RwLock<EventLog>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    #[instrument(skip(self, event), fields(kind = %event.kind))]
    async fn append(&self, game_id: GameId, event: NewEvent) -> Result<GameEvent, AppError> {
        let mut log = self.log.write().await;
        log.last_id += 1;
        let stored = event.into_event(EventId(log.last_id), game_id, Utc::now());
        log.events.insert(stored.id, stored.clone());

        debug!(event_id = %stored.id, "Event appended in memory");
        Ok(stored)
    }

    async fn get(
        &self,
        game_id: GameId,
        event_id: EventId,
    ) -> Result<Option<GameEvent>, AppError> {
        let log = self.log.read().await;
        Ok(log
            .events
            .get(&event_id)
            .filter(|event| event.game_id == game_id)
            .cloned())
    }

    #[instrument(skip(self, event), fields(event_id = %event.id))]
    async fn replace(&self, event: &GameEvent) -> Result<(), AppError> {
        let mut log = self.log.write().await;
        match log.events.get_mut(&event.id) {
            Some(existing) if existing.game_id == event.game_id => {
                *existing = event.clone();
                Ok(())
            }
            _ => {
                warn!("Event not found for replacement in memory");
                Err(AppError::EventNotFound {
                    game: event.game_id,
                    event: event.id,
                })
            }
        }
    }

    #[instrument(skip(self, event), fields(event_id = %event.id))]
    async fn restore(&self, event: &GameEvent) -> Result<(), AppError> {
        let mut log = self.log.write().await;
        log.last_id = log.last_id.max(event.id.0);
        log.events.insert(event.id, event.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, game_id: GameId, event_id: EventId) -> Result<bool, AppError> {
        let mut log = self.log.write().await;
        let belongs = log
            .events
            .get(&event_id)
            .is_some_and(|event| event.game_id == game_id);
        if belongs {
            log.events.remove(&event_id);
        }
        Ok(belongs)
    }

    async fn events_for_game(&self, game_id: GameId) -> Result<Vec<GameEvent>, AppError> {
        let log = self.log.read().await;
        let mut events: Vec<GameEvent> = log
            .events
            .values()
            .filter(|event| event.game_id == game_id)
            .cloned()
            .collect();
        sort_canonical(&mut events);
        Ok(events)
    }

    async fn last_event_before(
        &self,
        game_id: GameId,
        kind: EventKind,
        before: EventId,
    ) -> Result<Option<GameEvent>, AppError> {
        let log = self.log.read().await;
        Ok(log
            .events
            .range(..before)
            .rev()
            .map(|(_, event)| event)
            .find(|event| event.game_id == game_id && event.kind == kind)
            .cloned())
    }

    async fn events_for_player(&self, player_id: PlayerId) -> Result<Vec<GameEvent>, AppError> {
        let log = self.log.read().await;
        let mut events: Vec<GameEvent> = log
            .events
            .values()
            .filter(|event| event.involves(player_id))
            .cloned()
            .collect();
        events.sort_by(|a, b| a.game_id.cmp(&b.game_id).then_with(|| a.canonical_cmp(b)));
        Ok(events)
    }
}

/// In-memory games and players for development and testing
#[derive(Debug, Default)]
pub struct InMemoryGameDirectory {
    games: RwLock<HashMap<GameId, GameContext>>,
    players: RwLock<HashMap<PlayerId, Player>>,
}

impl InMemoryGameDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create_game(&self, name: &str, home_team: &str, away_team: &str) -> GameContext {
        let mut games = self.games.write().await;
        let game = GameContext {
            id: GameId(games.len() as i64 + 1),
            name: name.to_string(),
            home_team: TeamId::from(home_team),
            away_team: TeamId::from(away_team),
        };
        games.insert(game.id, game.clone());
        game
    }

    pub async fn create_player(&self, name: &str, team_id: &str) -> Player {
        let mut players = self.players.write().await;
        let player = Player {
            id: PlayerId(players.len() as i64 + 1),
            name: name.to_string(),
            team_id: TeamId::from(team_id),
            jersey_number: None,
        };
        players.insert(player.id, player.clone());
        player
    }
}

#[async_trait]
impl GameDirectory for InMemoryGameDirectory {
    async fn game(&self, game_id: GameId) -> Result<Option<GameContext>, AppError> {
        Ok(self.games.read().await.get(&game_id).cloned())
    }

    async fn player(&self, player_id: PlayerId) -> Result<Option<Player>, AppError> {
        Ok(self.players.read().await.get(&player_id).cloned())
    }
}

/// PostgreSQL implementation of the event log and game directory
pub struct PostgresGameStore {
    pool: PgPool,
}

impl PostgresGameStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const EVENT_COLUMNS: &str = "id, game_id, kind, period, clock_seconds, player_id, \
     second_player_id, team_id, shot_category, court_x, court_y, home_score_after, \
     away_score_after, camera_id, video_timestamp_seconds, confidence, recorded_at";

fn database_error(e: sqlx::Error) -> AppError {
    warn!(error = %e, "Game store query failed");
    AppError::DatabaseError(e.to_string())
}

/// Narrows a value into an INTEGER column, failing instead of wrapping
fn integer_column<T>(value: T, column: &str) -> Result<i32, AppError>
where
    T: TryInto<i32> + Copy + std::fmt::Display,
{
    value
        .try_into()
        .map_err(|_| AppError::DatabaseError(format!("{column} {value} does not fit in INTEGER")))
}

fn event_from_row(row: &PgRow) -> Result<GameEvent, AppError> {
    let kind: String = row.try_get("kind").map_err(database_error)?;
    let kind = EventKind::from_str(&kind).map_err(|_| AppError::UnknownEventKind(kind))?;

    let period: i16 = row.try_get("period").map_err(database_error)?;
    let period = Period::from_ordinal(period)
        .ok_or_else(|| AppError::DatabaseError(format!("unknown period ordinal {period}")))?;

    let clock_seconds: i32 = row.try_get("clock_seconds").map_err(database_error)?;
    let clock_seconds = u32::try_from(clock_seconds)
        .map_err(|_| AppError::DatabaseError(format!("negative clock {clock_seconds}")))?;

    let shot_category = row
        .try_get::<Option<String>, _>("shot_category")
        .map_err(database_error)?
        .map(|value| {
            ShotCategory::from_str(&value)
                .map_err(|_| AppError::DatabaseError(format!("unknown shot category {value}")))
        })
        .transpose()?;

    let court_x: Option<f64> = row.try_get("court_x").map_err(database_error)?;
    let court_y: Option<f64> = row.try_get("court_y").map_err(database_error)?;
    let home_score: Option<i32> = row.try_get("home_score_after").map_err(database_error)?;
    let away_score: Option<i32> = row.try_get("away_score_after").map_err(database_error)?;
    let camera_id: Option<String> = row.try_get("camera_id").map_err(database_error)?;
    let video_timestamp: Option<f64> =
        row.try_get("video_timestamp_seconds").map_err(database_error)?;

    Ok(GameEvent {
        id: EventId(row.try_get("id").map_err(database_error)?),
        game_id: GameId(row.try_get("game_id").map_err(database_error)?),
        kind,
        period,
        clock_seconds,
        player_id: row
            .try_get::<Option<i64>, _>("player_id")
            .map_err(database_error)?
            .map(PlayerId),
        second_player_id: row
            .try_get::<Option<i64>, _>("second_player_id")
            .map_err(database_error)?
            .map(PlayerId),
        team_id: TeamId(row.try_get("team_id").map_err(database_error)?),
        shot_category,
        location: court_x.zip(court_y).map(|(x, y)| CourtLocation { x, y }),
        score: home_score.zip(away_score).map(|(home, away)| ScoreSnapshot {
            home: home.max(0) as u32,
            away: away.max(0) as u32,
        }),
        video: camera_id
            .zip(video_timestamp)
            .map(|(camera_id, timestamp_seconds)| VideoMarker {
                camera_id,
                timestamp_seconds,
            }),
        confidence: row.try_get("confidence").map_err(database_error)?,
        recorded_at: row
            .try_get::<DateTime<Utc>, _>("recorded_at")
            .map_err(database_error)?,
    })
}

#[async_trait]
impl EventStore for PostgresGameStore {
    #[instrument(skip(self, event), fields(kind = %event.kind))]
    async fn append(&self, game_id: GameId, event: NewEvent) -> Result<GameEvent, AppError> {
        let query = format!(
            "INSERT INTO game_events (game_id, kind, period, clock_seconds, player_id, \
             second_player_id, team_id, shot_category, court_x, court_y, home_score_after, \
             away_score_after, camera_id, video_timestamp_seconds, confidence, recorded_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
             RETURNING {EVENT_COLUMNS}"
        );
        let clock_seconds = integer_column(event.clock_seconds, "clock_seconds")?;
        let home_score = event
            .score
            .map(|s| integer_column(s.home, "home_score_after"))
            .transpose()?;
        let away_score = event
            .score
            .map(|s| integer_column(s.away, "away_score_after"))
            .transpose()?;

        let row = sqlx::query(&query)
            .bind(game_id.0)
            .bind(event.kind.as_ref())
            .bind(event.period.ordinal())
            .bind(clock_seconds)
            .bind(event.player_id.map(|p| p.0))
            .bind(event.second_player_id.map(|p| p.0))
            .bind(event.team_id.as_str())
            .bind(event.shot_category.map(|c| c.as_ref().to_string()))
            .bind(event.location.map(|l| l.x))
            .bind(event.location.map(|l| l.y))
            .bind(home_score)
            .bind(away_score)
            .bind(event.video.as_ref().map(|v| v.camera_id.clone()))
            .bind(event.video.as_ref().map(|v| v.timestamp_seconds))
            .bind(event.confidence)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(database_error)?;

        let stored = event_from_row(&row)?;
        debug!(event_id = %stored.id, "Event appended in database");
        Ok(stored)
    }

    async fn get(
        &self,
        game_id: GameId,
        event_id: EventId,
    ) -> Result<Option<GameEvent>, AppError> {
        let query = format!("SELECT {EVENT_COLUMNS} FROM game_events WHERE game_id = $1 AND id = $2");
        let row = sqlx::query(&query)
            .bind(game_id.0)
            .bind(event_id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?;
        row.as_ref().map(event_from_row).transpose()
    }

    #[instrument(skip(self, event), fields(event_id = %event.id))]
    async fn replace(&self, event: &GameEvent) -> Result<(), AppError> {
        let clock_seconds = integer_column(event.clock_seconds, "clock_seconds")?;
        let home_score = event
            .score
            .map(|s| integer_column(s.home, "home_score_after"))
            .transpose()?;
        let away_score = event
            .score
            .map(|s| integer_column(s.away, "away_score_after"))
            .transpose()?;

        let result = sqlx::query(
            "UPDATE game_events SET kind = $3, period = $4, clock_seconds = $5, player_id = $6, \
             second_player_id = $7, team_id = $8, shot_category = $9, court_x = $10, \
             court_y = $11, home_score_after = $12, away_score_after = $13, camera_id = $14, \
             video_timestamp_seconds = $15, confidence = $16 \
             WHERE game_id = $1 AND id = $2",
        )
        .bind(event.game_id.0)
        .bind(event.id.0)
        .bind(event.kind.as_ref())
        .bind(event.period.ordinal())
        .bind(clock_seconds)
        .bind(event.player_id.map(|p| p.0))
        .bind(event.second_player_id.map(|p| p.0))
        .bind(event.team_id.as_str())
        .bind(event.shot_category.map(|c| c.as_ref().to_string()))
        .bind(event.location.map(|l| l.x))
        .bind(event.location.map(|l| l.y))
        .bind(home_score)
        .bind(away_score)
        .bind(event.video.as_ref().map(|v| v.camera_id.clone()))
        .bind(event.video.as_ref().map(|v| v.timestamp_seconds))
        .bind(event.confidence)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::EventNotFound {
                game: event.game_id,
                event: event.id,
            });
        }
        Ok(())
    }

    #[instrument(skip(self, event), fields(event_id = %event.id))]
    async fn restore(&self, event: &GameEvent) -> Result<(), AppError> {
        let clock_seconds = integer_column(event.clock_seconds, "clock_seconds")?;
        let home_score = event
            .score
            .map(|s| integer_column(s.home, "home_score_after"))
            .transpose()?;
        let away_score = event
            .score
            .map(|s| integer_column(s.away, "away_score_after"))
            .transpose()?;

        sqlx::query(
            "INSERT INTO game_events (id, game_id, kind, period, clock_seconds, player_id, \
             second_player_id, team_id, shot_category, court_x, court_y, home_score_after, \
             away_score_after, camera_id, video_timestamp_seconds, confidence, recorded_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(event.id.0)
        .bind(event.game_id.0)
        .bind(event.kind.as_ref())
        .bind(event.period.ordinal())
        .bind(clock_seconds)
        .bind(event.player_id.map(|p| p.0))
        .bind(event.second_player_id.map(|p| p.0))
        .bind(event.team_id.as_str())
        .bind(event.shot_category.map(|c| c.as_ref().to_string()))
        .bind(event.location.map(|l| l.x))
        .bind(event.location.map(|l| l.y))
        .bind(home_score)
        .bind(away_score)
        .bind(event.video.as_ref().map(|v| v.camera_id.clone()))
        .bind(event.video.as_ref().map(|v| v.timestamp_seconds))
        .bind(event.confidence)
        .bind(event.recorded_at)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, game_id: GameId, event_id: EventId) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM game_events WHERE game_id = $1 AND id = $2")
            .bind(game_id.0)
            .bind(event_id.0)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn events_for_game(&self, game_id: GameId) -> Result<Vec<GameEvent>, AppError> {
        let query = format!(
            "SELECT {EVENT_COLUMNS} FROM game_events WHERE game_id = $1 \
             ORDER BY period ASC, clock_seconds DESC, id ASC"
        );
        let rows = sqlx::query(&query)
            .bind(game_id.0)
            .fetch_all(&self.pool)
            .await
            .map_err(database_error)?;
        rows.iter().map(event_from_row).collect()
    }

    async fn last_event_before(
        &self,
        game_id: GameId,
        kind: EventKind,
        before: EventId,
    ) -> Result<Option<GameEvent>, AppError> {
        let query = format!(
            "SELECT {EVENT_COLUMNS} FROM game_events \
             WHERE game_id = $1 AND kind = $2 AND id < $3 ORDER BY id DESC LIMIT 1"
        );
        let row = sqlx::query(&query)
            .bind(game_id.0)
            .bind(kind.as_ref())
            .bind(before.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?;
        row.as_ref().map(event_from_row).transpose()
    }

    async fn events_for_player(&self, player_id: PlayerId) -> Result<Vec<GameEvent>, AppError> {
        let query = format!(
            "SELECT {EVENT_COLUMNS} FROM game_events \
             WHERE player_id = $1 OR second_player_id = $1 \
             ORDER BY game_id ASC, period ASC, clock_seconds DESC, id ASC"
        );
        let rows = sqlx::query(&query)
            .bind(player_id.0)
            .fetch_all(&self.pool)
            .await
            .map_err(database_error)?;
        rows.iter().map(event_from_row).collect()
    }
}

#[async_trait]
impl GameDirectory for PostgresGameStore {
    async fn game(&self, game_id: GameId) -> Result<Option<GameContext>, AppError> {
        let row = sqlx::query("SELECT id, name, home_team_id, away_team_id FROM games WHERE id = $1")
            .bind(game_id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?;

        row.map(|row| -> Result<GameContext, AppError> {
            Ok(GameContext {
                id: GameId(row.try_get("id").map_err(database_error)?),
                name: row.try_get("name").map_err(database_error)?,
                home_team: TeamId(row.try_get("home_team_id").map_err(database_error)?),
                away_team: TeamId(row.try_get("away_team_id").map_err(database_error)?),
            })
        })
        .transpose()
    }

    async fn player(&self, player_id: PlayerId) -> Result<Option<Player>, AppError> {
        let row = sqlx::query("SELECT id, name, team_id, jersey_number FROM players WHERE id = $1")
            .bind(player_id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?;

        row.map(|row| -> Result<Player, AppError> {
            Ok(Player {
                id: PlayerId(row.try_get("id").map_err(database_error)?),
                name: row.try_get("name").map_err(database_error)?,
                team_id: TeamId(row.try_get("team_id").map_err(database_error)?),
                jersey_number: row.try_get("jersey_number").map_err(database_error)?,
            })
        })
        .transpose()
    }
}
