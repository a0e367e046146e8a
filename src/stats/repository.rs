use async_trait::async_trait;
use sqlx::postgres::{PgRow, Postgres};
use sqlx::types::Json;
use sqlx::{PgPool, Row, Transaction};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::models::{BoxCounters, GameAggregates, PlayerAggregate, TeamAggregate};
use crate::game::{ClockMark, GameId, Period, PlayerId, TeamId};
use crate::shared::AppError;

/// Key-value store of per-game aggregate rows, unique on (game, player) and
/// (game, team)
#[async_trait]
pub trait AggregateStore: Send + Sync {
    /// Every row of the game. Empty if nothing was aggregated yet.
    async fn load_game(&self, game_id: GameId) -> Result<GameAggregates, AppError>;

    /// Inserts or overwrites the given rows of one game
    async fn upsert(
        &self,
        game_id: GameId,
        players: &[PlayerAggregate],
        teams: &[TeamAggregate],
    ) -> Result<(), AppError>;

    /// Deletes every row of the game and writes `aggregates` in their place,
    /// atomically
    async fn replace_game(&self, aggregates: &GameAggregates) -> Result<(), AppError>;

    /// All per-game rows of one player, ordered by game
    async fn player_history(&self, player_id: PlayerId) -> Result<Vec<PlayerAggregate>, AppError>;
}

/// Rejects rows that belong to a different game than the one being written
fn ensure_rows_belong(
    game_id: GameId,
    players: &[PlayerAggregate],
    teams: &[TeamAggregate],
) -> Result<(), AppError> {
    let stray = players
        .iter()
        .map(|p| p.game_id)
        .chain(teams.iter().map(|t| t.game_id))
        .find(|id| *id != game_id);
    match stray {
        Some(other) => Err(AppError::DatabaseError(format!(
            "aggregate row of game {other} written under game {game_id}"
        ))),
        None => Ok(()),
    }
}

#[derive(Debug, Default)]
pub struct InMemoryAggregateStore {
    games: Arc<RwLock<HashMap<GameId, GameAggregates>>>,
}

impl InMemoryAggregateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AggregateStore for InMemoryAggregateStore {
    async fn load_game(&self, game_id: GameId) -> Result<GameAggregates, AppError> {
        let games = self.games.read().await;
        Ok(games
            .get(&game_id)
            .cloned()
            .unwrap_or_else(|| GameAggregates::empty(game_id)))
    }

    #[instrument(skip(self, players, teams))]
    async fn upsert(
        &self,
        game_id: GameId,
        players: &[PlayerAggregate],
        teams: &[TeamAggregate],
    ) -> Result<(), AppError> {
        ensure_rows_belong(game_id, players, teams)?;
        let mut games = self.games.write().await;
        let game = games
            .entry(game_id)
            .or_insert_with(|| GameAggregates::empty(game_id));

        for player in players {
            game.players.insert(player.player_id, player.clone());
        }
        for team in teams {
            game.teams.insert(team.team_id.clone(), team.clone());
        }

        debug!(players = players.len(), teams = teams.len(), "Upserted aggregates");
        Ok(())
    }

    #[instrument(skip(self, aggregates), fields(game_id = %aggregates.game_id))]
    async fn replace_game(&self, aggregates: &GameAggregates) -> Result<(), AppError> {
        let mut games = self.games.write().await;
        games.insert(aggregates.game_id, aggregates.clone());
        Ok(())
    }

    async fn player_history(&self, player_id: PlayerId) -> Result<Vec<PlayerAggregate>, AppError> {
        let games = self.games.read().await;
        let mut history: Vec<PlayerAggregate> = games
            .values()
            .filter_map(|game| game.player(player_id).cloned())
            .collect();
        history.sort_by_key(|p| p.game_id);
        Ok(history)
    }
}

#[derive(Debug, Clone)]
pub struct PostgresAggregateStore {
    pool: PgPool,
}

impl PostgresAggregateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn database_error(e: sqlx::Error) -> AppError {
    warn!(error = %e, "Aggregate store query failed");
    AppError::DatabaseError(e.to_string())
}

const COUNTER_COLUMNS: &str = "points, field_goals_made, field_goals_attempted, \
    two_point_made, two_point_attempted, three_point_made, three_point_attempted, \
    free_throws_made, free_throws_attempted, rebounds_offensive, rebounds_defensive, \
    rebounds_total, assists, steals, blocks, turnovers, fouls";

fn counter_values(counters: &BoxCounters) -> [i32; 17] {
    [
        counters.points,
        counters.field_goals_made,
        counters.field_goals_attempted,
        counters.two_point_made,
        counters.two_point_attempted,
        counters.three_point_made,
        counters.three_point_attempted,
        counters.free_throws_made,
        counters.free_throws_attempted,
        counters.rebounds_offensive,
        counters.rebounds_defensive,
        counters.rebounds_total,
        counters.assists,
        counters.steals,
        counters.blocks,
        counters.turnovers,
        counters.fouls,
    ]
    .map(to_column)
}

fn to_column(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn get_count(row: &PgRow, column: &str) -> Result<u32, AppError> {
    let value: i32 = row.try_get(column).map_err(database_error)?;
    u32::try_from(value)
        .map_err(|_| AppError::DatabaseError(format!("negative value {value} in {column}")))
}

fn counters_from_row(row: &PgRow) -> Result<BoxCounters, AppError> {
    Ok(BoxCounters {
        points: get_count(row, "points")?,
        field_goals_made: get_count(row, "field_goals_made")?,
        field_goals_attempted: get_count(row, "field_goals_attempted")?,
        two_point_made: get_count(row, "two_point_made")?,
        two_point_attempted: get_count(row, "two_point_attempted")?,
        three_point_made: get_count(row, "three_point_made")?,
        three_point_attempted: get_count(row, "three_point_attempted")?,
        free_throws_made: get_count(row, "free_throws_made")?,
        free_throws_attempted: get_count(row, "free_throws_attempted")?,
        rebounds_offensive: get_count(row, "rebounds_offensive")?,
        rebounds_defensive: get_count(row, "rebounds_defensive")?,
        rebounds_total: get_count(row, "rebounds_total")?,
        assists: get_count(row, "assists")?,
        steals: get_count(row, "steals")?,
        blocks: get_count(row, "blocks")?,
        turnovers: get_count(row, "turnovers")?,
        fouls: get_count(row, "fouls")?,
    })
}

fn player_from_row(row: &PgRow) -> Result<PlayerAggregate, AppError> {
    let last_period: Option<i16> = row.try_get("last_sub_period").map_err(database_error)?;
    let last_clock: Option<i32> = row.try_get("last_sub_clock").map_err(database_error)?;
    let last_substitution = match (last_period, last_clock) {
        (Some(period), Some(clock)) => Some(ClockMark::new(
            Period::from_ordinal(period)
                .ok_or_else(|| AppError::DatabaseError(format!("unknown period {period}")))?,
            u32::try_from(clock)
                .map_err(|_| AppError::DatabaseError(format!("negative clock {clock}")))?,
        )),
        _ => None,
    };
    let Json(points_by_period) = row.try_get("points_by_period").map_err(database_error)?;
    let plus_minus: i32 = row.try_get("plus_minus").map_err(database_error)?;

    Ok(PlayerAggregate {
        game_id: GameId(row.try_get("game_id").map_err(database_error)?),
        player_id: PlayerId(row.try_get("player_id").map_err(database_error)?),
        team_id: TeamId(row.try_get("team_id").map_err(database_error)?),
        counters: counters_from_row(row)?,
        points_by_period,
        plus_minus,
        seconds_played: get_count(row, "seconds_played")?,
        on_court: row.try_get("on_court").map_err(database_error)?,
        last_substitution,
    })
}

fn team_from_row(row: &PgRow) -> Result<TeamAggregate, AppError> {
    let Json(points_by_period) = row.try_get("points_by_period").map_err(database_error)?;
    let Json(fg_made_by_period) = row.try_get("fg_made_by_period").map_err(database_error)?;
    let Json(fg_attempted_by_period) =
        row.try_get("fg_attempted_by_period").map_err(database_error)?;

    Ok(TeamAggregate {
        game_id: GameId(row.try_get("game_id").map_err(database_error)?),
        team_id: TeamId(row.try_get("team_id").map_err(database_error)?),
        counters: counters_from_row(row)?,
        timeouts: get_count(row, "timeouts")?,
        points_by_period,
        fg_made_by_period,
        fg_attempted_by_period,
    })
}

async fn write_player(
    tx: &mut Transaction<'_, Postgres>,
    player: &PlayerAggregate,
) -> Result<(), AppError> {
    let sql = format!(
        "INSERT INTO player_game_stats (game_id, player_id, team_id, {COUNTER_COLUMNS}, \
         points_by_period, plus_minus, seconds_played, on_court, last_sub_period, last_sub_clock) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, \
         $18, $19, $20, $21, $22, $23, $24, $25, $26) \
         ON CONFLICT (game_id, player_id) DO UPDATE SET \
         team_id = EXCLUDED.team_id, points = EXCLUDED.points, \
         field_goals_made = EXCLUDED.field_goals_made, \
         field_goals_attempted = EXCLUDED.field_goals_attempted, \
         two_point_made = EXCLUDED.two_point_made, \
         two_point_attempted = EXCLUDED.two_point_attempted, \
         three_point_made = EXCLUDED.three_point_made, \
         three_point_attempted = EXCLUDED.three_point_attempted, \
         free_throws_made = EXCLUDED.free_throws_made, \
         free_throws_attempted = EXCLUDED.free_throws_attempted, \
         rebounds_offensive = EXCLUDED.rebounds_offensive, \
         rebounds_defensive = EXCLUDED.rebounds_defensive, \
         rebounds_total = EXCLUDED.rebounds_total, assists = EXCLUDED.assists, \
         steals = EXCLUDED.steals, blocks = EXCLUDED.blocks, \
         turnovers = EXCLUDED.turnovers, fouls = EXCLUDED.fouls, \
         points_by_period = EXCLUDED.points_by_period, plus_minus = EXCLUDED.plus_minus, \
         seconds_played = EXCLUDED.seconds_played, on_court = EXCLUDED.on_court, \
         last_sub_period = EXCLUDED.last_sub_period, last_sub_clock = EXCLUDED.last_sub_clock"
    );

    let mut query = sqlx::query(&sql)
        .bind(player.game_id.0)
        .bind(player.player_id.0)
        .bind(player.team_id.as_str());
    for value in counter_values(&player.counters) {
        query = query.bind(value);
    }
    query
        .bind(Json(&player.points_by_period))
        .bind(player.plus_minus)
        .bind(to_column(player.seconds_played))
        .bind(player.on_court)
        .bind(player.last_substitution.map(|mark| mark.period.ordinal()))
        .bind(player.last_substitution.map(|mark| to_column(mark.clock_seconds)))
        .execute(&mut **tx)
        .await
        .map_err(database_error)?;
    Ok(())
}

async fn write_team(
    tx: &mut Transaction<'_, Postgres>,
    team: &TeamAggregate,
) -> Result<(), AppError> {
    let sql = format!(
        "INSERT INTO team_game_stats (game_id, team_id, {COUNTER_COLUMNS}, timeouts, \
         points_by_period, fg_made_by_period, fg_attempted_by_period) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, \
         $18, $19, $20, $21, $22, $23) \
         ON CONFLICT (game_id, team_id) DO UPDATE SET \
         points = EXCLUDED.points, field_goals_made = EXCLUDED.field_goals_made, \
         field_goals_attempted = EXCLUDED.field_goals_attempted, \
         two_point_made = EXCLUDED.two_point_made, \
         two_point_attempted = EXCLUDED.two_point_attempted, \
         three_point_made = EXCLUDED.three_point_made, \
         three_point_attempted = EXCLUDED.three_point_attempted, \
         free_throws_made = EXCLUDED.free_throws_made, \
         free_throws_attempted = EXCLUDED.free_throws_attempted, \
         rebounds_offensive = EXCLUDED.rebounds_offensive, \
         rebounds_defensive = EXCLUDED.rebounds_defensive, \
         rebounds_total = EXCLUDED.rebounds_total, assists = EXCLUDED.assists, \
         steals = EXCLUDED.steals, blocks = EXCLUDED.blocks, \
         turnovers = EXCLUDED.turnovers, fouls = EXCLUDED.fouls, \
         timeouts = EXCLUDED.timeouts, points_by_period = EXCLUDED.points_by_period, \
         fg_made_by_period = EXCLUDED.fg_made_by_period, \
         fg_attempted_by_period = EXCLUDED.fg_attempted_by_period"
    );

    let mut query = sqlx::query(&sql)
        .bind(team.game_id.0)
        .bind(team.team_id.as_str());
    for value in counter_values(&team.counters) {
        query = query.bind(value);
    }
    query
        .bind(to_column(team.timeouts))
        .bind(Json(&team.points_by_period))
        .bind(Json(&team.fg_made_by_period))
        .bind(Json(&team.fg_attempted_by_period))
        .execute(&mut **tx)
        .await
        .map_err(database_error)?;
    Ok(())
}

#[async_trait]
impl AggregateStore for PostgresAggregateStore {
    #[instrument(skip(self))]
    async fn load_game(&self, game_id: GameId) -> Result<GameAggregates, AppError> {
        let mut aggregates = GameAggregates::empty(game_id);

        let players = sqlx::query("SELECT * FROM player_game_stats WHERE game_id = $1")
            .bind(game_id.0)
            .fetch_all(&self.pool)
            .await
            .map_err(database_error)?;
        for row in &players {
            let player = player_from_row(row)?;
            aggregates.players.insert(player.player_id, player);
        }

        let teams = sqlx::query("SELECT * FROM team_game_stats WHERE game_id = $1")
            .bind(game_id.0)
            .fetch_all(&self.pool)
            .await
            .map_err(database_error)?;
        for row in &teams {
            let team = team_from_row(row)?;
            aggregates.teams.insert(team.team_id.clone(), team);
        }

        debug!(
            players = aggregates.players.len(),
            teams = aggregates.teams.len(),
            "Loaded aggregates"
        );
        Ok(aggregates)
    }

    #[instrument(skip(self, players, teams))]
    async fn upsert(
        &self,
        game_id: GameId,
        players: &[PlayerAggregate],
        teams: &[TeamAggregate],
    ) -> Result<(), AppError> {
        ensure_rows_belong(game_id, players, teams)?;
        let mut tx = self.pool.begin().await.map_err(database_error)?;
        for player in players {
            write_player(&mut tx, player).await?;
        }
        for team in teams {
            write_team(&mut tx, team).await?;
        }
        tx.commit().await.map_err(database_error)?;

        debug!(players = players.len(), teams = teams.len(), "Upserted aggregates");
        Ok(())
    }

    #[instrument(skip(self, aggregates), fields(game_id = %aggregates.game_id))]
    async fn replace_game(&self, aggregates: &GameAggregates) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(database_error)?;

        sqlx::query("DELETE FROM player_game_stats WHERE game_id = $1")
            .bind(aggregates.game_id.0)
            .execute(&mut *tx)
            .await
            .map_err(database_error)?;
        sqlx::query("DELETE FROM team_game_stats WHERE game_id = $1")
            .bind(aggregates.game_id.0)
            .execute(&mut *tx)
            .await
            .map_err(database_error)?;

        for player in aggregates.players.values() {
            write_player(&mut tx, player).await?;
        }
        for team in aggregates.teams.values() {
            write_team(&mut tx, team).await?;
        }

        // Dropping the transaction on any error above rolls the wipe back
        tx.commit().await.map_err(database_error)?;
        Ok(())
    }

    async fn player_history(&self, player_id: PlayerId) -> Result<Vec<PlayerAggregate>, AppError> {
        let rows =
            sqlx::query("SELECT * FROM player_game_stats WHERE player_id = $1 ORDER BY game_id")
                .bind(player_id.0)
                .fetch_all(&self.pool)
                .await
                .map_err(database_error)?;
        rows.iter().map(player_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ShotCategory;
    use crate::stats::calculators::ShotOutcome;

    fn scorer(game: i64, player: i64, points: u32) -> PlayerAggregate {
        let mut aggregate = PlayerAggregate::new(GameId(game), PlayerId(player), TeamId::from("hawks"));
        for _ in 0..points / 2 {
            aggregate.record_shot(
                &ShotOutcome::classify(Some(ShotCategory::TwoPoint), true),
                Period::Q1,
            );
        }
        aggregate
    }

    #[tokio::test]
    async fn upsert_overwrites_rows_by_key() {
        let store = InMemoryAggregateStore::new();

        store.upsert(GameId(1), &[scorer(1, 10, 2)], &[]).await.unwrap();
        store.upsert(GameId(1), &[scorer(1, 10, 6)], &[]).await.unwrap();

        let game = store.load_game(GameId(1)).await.unwrap();
        assert_eq!(game.players.len(), 1);
        assert_eq!(game.players[&PlayerId(10)].counters.points, 6);
    }

    #[tokio::test]
    async fn replace_game_drops_rows_missing_from_the_new_state() {
        let store = InMemoryAggregateStore::new();
        store
            .upsert(GameId(1), &[scorer(1, 10, 2), scorer(1, 11, 4)], &[])
            .await
            .unwrap();

        let mut rebuilt = GameAggregates::empty(GameId(1));
        rebuilt.players.insert(PlayerId(11), scorer(1, 11, 2));
        store.replace_game(&rebuilt).await.unwrap();

        assert_eq!(store.load_game(GameId(1)).await.unwrap(), rebuilt);
    }

    #[tokio::test]
    async fn upsert_rejects_rows_of_another_game() {
        let store = InMemoryAggregateStore::new();

        let result = store.upsert(GameId(1), &[scorer(2, 10, 2)], &[]).await;

        assert!(matches!(result, Err(AppError::DatabaseError(_))));
        assert!(store.load_game(GameId(1)).await.unwrap().is_empty());
        assert!(store.load_game(GameId(2)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_game_loads_empty() {
        let store = InMemoryAggregateStore::new();
        assert!(store.load_game(GameId(9)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn player_history_spans_games_in_order() {
        let store = InMemoryAggregateStore::new();
        store.upsert(GameId(2), &[scorer(2, 10, 4)], &[]).await.unwrap();
        store.upsert(GameId(1), &[scorer(1, 10, 2)], &[]).await.unwrap();
        store.upsert(GameId(1), &[scorer(1, 11, 8)], &[]).await.unwrap();

        let history = store.player_history(PlayerId(10)).await.unwrap();
        let games: Vec<GameId> = history.iter().map(|p| p.game_id).collect();
        assert_eq!(games, vec![GameId(1), GameId(2)]);
    }
}
