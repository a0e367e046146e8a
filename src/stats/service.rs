use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tracing::{debug, error, info, instrument, warn};

use crate::config::EngineConfig;
use crate::game::{
    EventFilter, EventId, EventKind, EventPatch, EventStore, GameContext, GameDirectory,
    GameEvent, GameId, NewEvent, PlayerId, TeamId,
};
use crate::shared::{AppError, DanglingReference};

use super::calculators::efficiency::{contribution, impact_share, offensive_rating, possessions};
use super::calculators::ShootingSplits;
use super::engine::AggregationEngine;
use super::ledger::GameLedger;
use super::models::{BoxScore, GameAggregates, PlayerAggregate, PlayerLine, TeamLine};
use super::repository::AggregateStore;
use super::shot_chart::{ShotChart, ShotChartFilter};

/// Drives the aggregation engine against the event log and aggregate store.
///
/// All writes to one game are serialised behind a per-game mutex.
pub struct StatsService {
    events: Arc<dyn EventStore>,
    directory: Arc<dyn GameDirectory>,
    aggregates: Arc<dyn AggregateStore>,
    engine: AggregationEngine,
    game_mutexes: Arc<RwLock<HashMap<GameId, Arc<AsyncMutex<()>>>>>,
}

impl StatsService {
    pub fn builder(
        events: Arc<dyn EventStore>,
        directory: Arc<dyn GameDirectory>,
        aggregates: Arc<dyn AggregateStore>,
    ) -> StatsServiceBuilder {
        StatsServiceBuilder::new(events, directory, aggregates)
    }

    /// Validates, stores and aggregates one new event.
    ///
    /// An event that lands before already-recorded events in canonical order
    /// triggers a full rebuild instead of an incremental update. If the
    /// aggregates cannot be written the event is withdrawn from the log again.
    #[instrument(skip(self, event), fields(kind = %event.kind))]
    pub async fn record_event(
        &self,
        game_id: GameId,
        event: NewEvent,
    ) -> Result<GameEvent, AppError> {
        let game_lock = self.game_lock(game_id).await;
        let stored = {
            let _guard = game_lock.lock().await;
            self.record_locked(game_id, event).await?
        };
        drop(game_lock);

        if stored.kind == EventKind::GameEnd {
            self.clear_game_lock(game_id).await;
        }
        Ok(stored)
    }

    /// Removes an event from the log and rebuilds the game
    #[instrument(skip(self))]
    pub async fn delete_event(&self, game_id: GameId, event_id: EventId) -> Result<(), AppError> {
        let game_lock = self.game_lock(game_id).await;
        let _guard = game_lock.lock().await;

        let game = self.game_context(game_id).await?;
        let existing = self.existing_event(game_id, event_id).await?;
        if !self.events.delete(game_id, event_id).await? {
            return Err(AppError::EventNotFound {
                game: game_id,
                event: event_id,
            });
        }

        if let Err(e) = self.replay_log(&game).await {
            if let Err(undo) = self.events.restore(&existing).await {
                error!(%event_id, error = %undo, "Could not restore deleted event");
            }
            return Err(e);
        }
        Ok(())
    }

    /// Corrects a recorded event in place, keeping its sequence id, and
    /// rebuilds the game
    #[instrument(skip(self, patch))]
    pub async fn amend_event(
        &self,
        game_id: GameId,
        event_id: EventId,
        patch: EventPatch,
    ) -> Result<GameEvent, AppError> {
        let game_lock = self.game_lock(game_id).await;
        let _guard = game_lock.lock().await;

        let game = self.game_context(game_id).await?;
        let existing = self.existing_event(game_id, event_id).await?;

        let amended = patch.apply_to(&existing);
        if let Err(e) = amended.validate(&game) {
            warn!(error = %e, "Rejected amendment");
            return Err(e.into());
        }
        self.ensure_players_exist(game_id, [amended.player_id, amended.second_player_id])
            .await?;

        let updated = amended.into_event(existing.id, game_id, existing.recorded_at);
        self.events.replace(&updated).await?;

        if let Err(e) = self.replay_log(&game).await {
            if let Err(undo) = self.events.replace(&existing).await {
                error!(%event_id, error = %undo, "Could not revert amended event");
            }
            return Err(e);
        }
        Ok(updated)
    }

    /// Wipes the game's aggregates and replays its whole event log
    #[instrument(skip(self))]
    pub async fn rebuild(&self, game_id: GameId) -> Result<GameAggregates, AppError> {
        let game_lock = self.game_lock(game_id).await;
        let _guard = game_lock.lock().await;

        let game = self.game_context(game_id).await?;
        self.replay_log(&game).await?;
        self.aggregates.load_game(game_id).await
    }

    pub async fn aggregates(&self, game_id: GameId) -> Result<GameAggregates, AppError> {
        self.game_context(game_id).await?;
        self.aggregates.load_game(game_id).await
    }

    /// Player and team lines of one game with derived metrics
    pub async fn box_score(&self, game_id: GameId) -> Result<BoxScore, AppError> {
        let game = self.game_context(game_id).await?;
        let aggregates = self.aggregates.load_game(game_id).await?;
        let team_totals = team_contributions(&aggregates);

        let mut players: Vec<PlayerLine> = aggregates
            .players
            .values()
            .map(|p| player_line(p.clone(), &team_totals))
            .collect();
        players.sort_by(|a, b| {
            team_rank(&game, &a.aggregate.team_id)
                .cmp(&team_rank(&game, &b.aggregate.team_id))
                .then(a.aggregate.player_id.cmp(&b.aggregate.player_id))
        });

        let mut teams: Vec<TeamLine> = aggregates
            .teams
            .into_values()
            .map(|aggregate| TeamLine {
                shooting: ShootingSplits::from_counters(&aggregate.counters),
                possessions: possessions(&aggregate.counters),
                offensive_rating: offensive_rating(&aggregate.counters),
                aggregate,
            })
            .collect();
        teams.sort_by_key(|t| team_rank(&game, &t.aggregate.team_id));

        Ok(BoxScore {
            game,
            players,
            teams,
        })
    }

    /// One line per game the player appeared in, ordered by game
    pub async fn player_lines(&self, player_id: PlayerId) -> Result<Vec<PlayerLine>, AppError> {
        let history = self.aggregates.player_history(player_id).await?;

        let mut lines = Vec::with_capacity(history.len());
        for aggregate in history {
            let game = self.aggregates.load_game(aggregate.game_id).await?;
            lines.push(player_line(aggregate, &team_contributions(&game)));
        }
        Ok(lines)
    }

    /// Every event of the game in the order replay consumes them
    pub async fn timeline(&self, game_id: GameId) -> Result<Vec<GameEvent>, AppError> {
        self.events(game_id, &EventFilter::default()).await
    }

    pub async fn events(
        &self,
        game_id: GameId,
        filter: &EventFilter,
    ) -> Result<Vec<GameEvent>, AppError> {
        self.game_context(game_id).await?;
        let mut events = self.events.events_for_game(game_id).await?;
        events.retain(|e| filter.matches(e));
        Ok(events)
    }

    /// Events linked to camera footage at or above the confidence threshold
    pub async fn highlights(
        &self,
        game_id: GameId,
        min_confidence: f64,
    ) -> Result<Vec<GameEvent>, AppError> {
        let mut events = self.events(game_id, &EventFilter::default()).await?;
        events.retain(|e| is_highlight(e, min_confidence));
        Ok(events)
    }

    pub async fn player_highlights(
        &self,
        player_id: PlayerId,
        min_confidence: f64,
    ) -> Result<Vec<GameEvent>, AppError> {
        let mut events = self.events.events_for_player(player_id).await?;
        events.retain(|e| is_highlight(e, min_confidence));
        Ok(events)
    }

    pub async fn shot_chart(
        &self,
        game_id: GameId,
        filter: &ShotChartFilter,
    ) -> Result<ShotChart, AppError> {
        let events = self.events(game_id, &EventFilter::default()).await?;
        Ok(ShotChart::from_events(&events, filter))
    }

    async fn record_locked(
        &self,
        game_id: GameId,
        event: NewEvent,
    ) -> Result<GameEvent, AppError> {
        let game = self.game_context(game_id).await?;
        if let Err(e) = event.validate(&game) {
            warn!(error = %e, "Rejected event");
            return Err(e.into());
        }
        self.ensure_players_exist(game_id, [event.player_id, event.second_player_id])
            .await?;

        let stored = self.events.append(game_id, event).await?;
        if let Err(e) = self.aggregate_appended(&game, &stored).await {
            warn!(event_id = %stored.id, error = %e, "Aggregates not written, withdrawing event");
            if let Err(undo) = self.events.delete(game_id, stored.id).await {
                error!(event_id = %stored.id, error = %undo, "Could not withdraw event");
            }
            return Err(e);
        }
        Ok(stored)
    }

    async fn aggregate_appended(
        &self,
        game: &GameContext,
        stored: &GameEvent,
    ) -> Result<(), AppError> {
        let history = self.events.events_for_game(game.id).await?;
        let sorts_last = history.last().map(|e| e.id) == Some(stored.id);
        if sorts_last {
            self.apply_incrementally(game, stored).await
        } else {
            debug!(event_id = %stored.id, "Late event, replaying game");
            self.replay_and_store(game, history).await
        }
    }

    async fn existing_event(
        &self,
        game_id: GameId,
        event_id: EventId,
    ) -> Result<GameEvent, AppError> {
        self.events
            .get(game_id, event_id)
            .await?
            .ok_or(AppError::EventNotFound {
                game: game_id,
                event: event_id,
            })
    }

    async fn replay_log(&self, game: &GameContext) -> Result<(), AppError> {
        let history = self.events.events_for_game(game.id).await?;
        self.replay_and_store(game, history).await
    }

    async fn apply_incrementally(
        &self,
        game: &GameContext,
        event: &GameEvent,
    ) -> Result<(), AppError> {
        let mut ledger = GameLedger::from_aggregates(self.aggregates.load_game(game.id).await?);
        if event.kind == EventKind::Rebound {
            if let Some(miss) = self
                .events
                .last_event_before(game.id, EventKind::ShotMissed, event.id)
                .await?
            {
                ledger.note_missed_shot(miss.id, miss.team_id);
            }
        }

        let touched = self.engine.apply(&mut ledger, game, event);
        if touched.is_empty() {
            return Ok(());
        }

        let aggregates = ledger.aggregates();
        let players: Vec<PlayerAggregate> = touched
            .players
            .iter()
            .filter_map(|id| aggregates.player(*id).cloned())
            .collect();
        let teams: Vec<_> = touched
            .teams
            .iter()
            .filter_map(|id| aggregates.team(id).cloned())
            .collect();
        self.aggregates.upsert(game.id, &players, &teams).await
    }

    async fn replay_and_store(
        &self,
        game: &GameContext,
        history: Vec<GameEvent>,
    ) -> Result<(), AppError> {
        self.ensure_history_resolves(game, &history).await?;

        let event_count = history.len();
        let aggregates = self.engine.replay(game, history).into_aggregates();
        self.aggregates.replace_game(&aggregates).await?;

        info!(
            game_id = %game.id,
            events = event_count,
            players = aggregates.players.len(),
            teams = aggregates.teams.len(),
            "Rebuilt game aggregates"
        );
        Ok(())
    }

    async fn ensure_history_resolves(
        &self,
        game: &GameContext,
        history: &[GameEvent],
    ) -> Result<(), AppError> {
        if let Some(stray) = history.iter().find(|e| !game.participates(&e.team_id)) {
            return Err(AppError::DanglingReference {
                game: game.id,
                reference: DanglingReference::Team(stray.team_id.clone()),
            });
        }

        let players: BTreeSet<PlayerId> = history
            .iter()
            .flat_map(|e| [e.player_id, e.second_player_id])
            .flatten()
            .collect();
        self.ensure_players_exist(game.id, players.into_iter().map(Some))
            .await
    }

    async fn ensure_players_exist(
        &self,
        game_id: GameId,
        players: impl IntoIterator<Item = Option<PlayerId>>,
    ) -> Result<(), AppError> {
        for player_id in players.into_iter().flatten() {
            if self.directory.player(player_id).await?.is_none() {
                warn!(%game_id, %player_id, "Event references unknown player");
                return Err(AppError::DanglingReference {
                    game: game_id,
                    reference: DanglingReference::Player(player_id),
                });
            }
        }
        Ok(())
    }

    async fn game_context(&self, game_id: GameId) -> Result<GameContext, AppError> {
        self.directory
            .game(game_id)
            .await?
            .ok_or(AppError::GameNotFound(game_id))
    }

    async fn game_lock(&self, game_id: GameId) -> Arc<AsyncMutex<()>> {
        {
            let guard = self.game_mutexes.read().await;
            if let Some(lock) = guard.get(&game_id) {
                return lock.clone();
            }
        }

        let mut guard = self.game_mutexes.write().await;
        guard
            .entry(game_id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Forgets the game's lock unless a writer still holds it
    async fn clear_game_lock(&self, game_id: GameId) {
        let mut guard = self.game_mutexes.write().await;
        if guard
            .get(&game_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            guard.remove(&game_id);
        }
    }
}

fn is_highlight(event: &GameEvent, min_confidence: f64) -> bool {
    event.video.is_some() && event.confidence >= min_confidence
}

fn team_rank(game: &GameContext, team: &TeamId) -> u8 {
    if team == &game.home_team {
        0
    } else if team == &game.away_team {
        1
    } else {
        2
    }
}

fn team_contributions(aggregates: &GameAggregates) -> BTreeMap<TeamId, f64> {
    let mut totals = BTreeMap::new();
    for player in aggregates.players.values() {
        *totals.entry(player.team_id.clone()).or_insert(0.0) += contribution(&player.counters);
    }
    totals
}

fn player_line(aggregate: PlayerAggregate, team_totals: &BTreeMap<TeamId, f64>) -> PlayerLine {
    let own = contribution(&aggregate.counters);
    let team = team_totals.get(&aggregate.team_id).copied().unwrap_or(0.0);
    PlayerLine {
        shooting: ShootingSplits::from_counters(&aggregate.counters),
        contribution: own,
        impact_share: impact_share(own, team),
        aggregate,
    }
}

pub struct StatsServiceBuilder {
    events: Arc<dyn EventStore>,
    directory: Arc<dyn GameDirectory>,
    aggregates: Arc<dyn AggregateStore>,
    engine: EngineConfig,
}

impl StatsServiceBuilder {
    fn new(
        events: Arc<dyn EventStore>,
        directory: Arc<dyn GameDirectory>,
        aggregates: Arc<dyn AggregateStore>,
    ) -> Self {
        Self {
            events,
            directory,
            aggregates,
            engine: EngineConfig::default(),
        }
    }

    pub fn with_engine_config(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    pub fn build(self) -> StatsService {
        StatsService {
            events: self.events,
            directory: self.directory,
            aggregates: self.aggregates,
            engine: AggregationEngine::new(&self.engine),
            game_mutexes: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{InMemoryEventStore, InMemoryGameDirectory, Period, ShotCategory};
    use crate::stats::repository::InMemoryAggregateStore;
    use crate::stats::trackers::ReboundKind;
    use pretty_assertions::assert_eq;

    struct Fixture {
        service: StatsService,
        directory: Arc<InMemoryGameDirectory>,
        game: GameContext,
    }

    async fn fixture() -> Fixture {
        let directory = Arc::new(InMemoryGameDirectory::new());
        let game = directory.create_game("Hawks vs Owls", "hawks", "owls").await;
        let service = StatsService::builder(
            Arc::new(InMemoryEventStore::new()),
            directory.clone(),
            Arc::new(InMemoryAggregateStore::new()),
        )
        .build();

        Fixture {
            service,
            directory,
            game,
        }
    }

    fn make(clock: i64, team: &str, player: PlayerId, category: ShotCategory) -> NewEvent {
        NewEvent::new(EventKind::ShotMade, Period::Q1, clock, TeamId::from(team))
            .with_player(player)
            .with_shot(category)
    }

    #[tokio::test]
    async fn incremental_updates_match_rebuild() {
        let f = fixture().await;
        let ava = f.directory.create_player("Ava", "hawks").await;
        let ben = f.directory.create_player("Ben", "owls").await;
        let cal = f.directory.create_player("Cal", "hawks").await;
        let dee = f.directory.create_player("Dee", "owls").await;

        let script = vec![
            NewEvent::new(EventKind::Substitution, Period::Q1, 480, TeamId::from("hawks"))
                .with_player(cal.id)
                .with_second_player(ava.id),
            NewEvent::new(EventKind::Substitution, Period::Q1, 480, TeamId::from("owls"))
                .with_player(dee.id)
                .with_second_player(ben.id),
            make(450, "hawks", ava.id, ShotCategory::ThreePoint),
            NewEvent::new(EventKind::ShotMissed, Period::Q1, 420, TeamId::from("owls"))
                .with_player(ben.id)
                .with_shot(ShotCategory::TwoPoint),
            NewEvent::new(EventKind::Rebound, Period::Q1, 418, TeamId::from("owls"))
                .with_player(ben.id),
            NewEvent::new(EventKind::Timeout, Period::Q1, 400, TeamId::from("hawks")),
        ];
        for event in script {
            f.service.record_event(f.game.id, event).await.unwrap();
        }

        let live = f.service.aggregates(f.game.id).await.unwrap();
        let rebuilt = f.service.rebuild(f.game.id).await.unwrap();

        assert_eq!(live, rebuilt);
        assert_eq!(rebuilt.players[&ava.id].plus_minus, 3);
        assert_eq!(rebuilt.players[&ben.id].plus_minus, -3);
        assert_eq!(rebuilt.players[&ben.id].counters.rebounds_offensive, 1);
    }

    #[tokio::test]
    async fn late_event_triggers_replay() {
        let f = fixture().await;
        let ava = f.directory.create_player("Ava", "hawks").await;
        let cal = f.directory.create_player("Cal", "hawks").await;

        f.service
            .record_event(
                f.game.id,
                NewEvent::new(EventKind::Substitution, Period::Q1, 400, TeamId::from("hawks"))
                    .with_player(ava.id)
                    .with_second_player(cal.id),
            )
            .await
            .unwrap();
        // Tagged afterwards but happened first
        f.service
            .record_event(
                f.game.id,
                NewEvent::new(EventKind::Substitution, Period::Q1, 480, TeamId::from("hawks"))
                    .with_player(cal.id)
                    .with_second_player(ava.id),
            )
            .await
            .unwrap();

        let live = f.service.aggregates(f.game.id).await.unwrap();
        assert_eq!(live.players[&ava.id].seconds_played, 80);
        assert!(!live.players[&ava.id].on_court);
        assert!(live.players[&cal.id].on_court);
        assert_eq!(live, f.service.rebuild(f.game.id).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_player_is_a_dangling_reference() {
        let f = fixture().await;

        let err = f
            .service
            .record_event(f.game.id, make(400, "hawks", PlayerId(99), ShotCategory::TwoPoint))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::DanglingReference {
                reference: DanglingReference::Player(PlayerId(99)),
                ..
            }
        ));
        assert!(f.service.timeline(f.game.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_event_is_rejected_before_storage() {
        let f = fixture().await;

        let err = f
            .service
            .record_event(
                f.game.id,
                NewEvent::new(EventKind::ShotMade, Period::Q1, 400, TeamId::from("hawks")),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidEvent(_)));
        assert!(f.service.timeline(f.game.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_game_is_not_found() {
        let f = fixture().await;
        let err = f.service.rebuild(GameId(404)).await.unwrap_err();
        assert!(matches!(err, AppError::GameNotFound(GameId(404))));
    }

    #[tokio::test]
    async fn amend_and_delete_rebuild_aggregates() {
        let f = fixture().await;
        let ava = f.directory.create_player("Ava", "hawks").await;

        let two = f
            .service
            .record_event(f.game.id, make(450, "hawks", ava.id, ShotCategory::TwoPoint))
            .await
            .unwrap();
        let three = f
            .service
            .record_event(f.game.id, make(400, "hawks", ava.id, ShotCategory::ThreePoint))
            .await
            .unwrap();

        let patch = EventPatch {
            shot_category: Some(Some(ShotCategory::ThreePoint)),
            ..EventPatch::default()
        };
        let amended = f.service.amend_event(f.game.id, two.id, patch).await.unwrap();
        assert_eq!(amended.id, two.id);
        assert_eq!(
            f.service.aggregates(f.game.id).await.unwrap().players[&ava.id].counters.points,
            6
        );

        f.service.delete_event(f.game.id, three.id).await.unwrap();
        let after = f.service.aggregates(f.game.id).await.unwrap();
        assert_eq!(after.players[&ava.id].counters.points, 3);
        assert_eq!(after.players[&ava.id].counters.three_point_attempted, 1);

        let missing = f.service.delete_event(f.game.id, three.id).await.unwrap_err();
        assert!(matches!(missing, AppError::EventNotFound { .. }));
    }

    #[tokio::test]
    async fn box_score_lists_home_team_first_with_metrics() {
        let f = fixture().await;
        let ava = f.directory.create_player("Ava", "hawks").await;
        let ben = f.directory.create_player("Ben", "owls").await;

        f.service
            .record_event(f.game.id, make(450, "owls", ben.id, ShotCategory::TwoPoint))
            .await
            .unwrap();
        f.service
            .record_event(f.game.id, make(440, "hawks", ava.id, ShotCategory::ThreePoint))
            .await
            .unwrap();

        let box_score = f.service.box_score(f.game.id).await.unwrap();

        assert_eq!(box_score.teams[0].aggregate.team_id, TeamId::from("hawks"));
        assert_eq!(box_score.players[0].aggregate.player_id, ava.id);
        assert_eq!(box_score.players[0].shooting.fg_pct, Some(100.0));
        assert_eq!(box_score.players[0].impact_share, Some(100.0));
        assert_eq!(box_score.teams[1].offensive_rating, Some(200.0));
    }

    #[tokio::test]
    async fn highlights_need_video_and_confidence() {
        let f = fixture().await;
        let ava = f.directory.create_player("Ava", "hawks").await;

        f.service
            .record_event(
                f.game.id,
                make(450, "hawks", ava.id, ShotCategory::TwoPoint)
                    .with_video("baseline", 12.5)
                    .with_confidence(0.9),
            )
            .await
            .unwrap();
        f.service
            .record_event(
                f.game.id,
                make(440, "hawks", ava.id, ShotCategory::TwoPoint)
                    .with_video("baseline", 30.0)
                    .with_confidence(0.4),
            )
            .await
            .unwrap();
        f.service
            .record_event(f.game.id, make(430, "hawks", ava.id, ShotCategory::TwoPoint))
            .await
            .unwrap();

        assert_eq!(f.service.highlights(f.game.id, 0.0).await.unwrap().len(), 2);
        assert_eq!(f.service.highlights(f.game.id, 0.5).await.unwrap().len(), 1);
        assert_eq!(
            f.service.player_highlights(ava.id, 0.5).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn orphan_rebound_policy_is_configurable() {
        let directory = Arc::new(InMemoryGameDirectory::new());
        let game = directory.create_game("Hawks vs Owls", "hawks", "owls").await;
        let ava = directory.create_player("Ava", "hawks").await;
        let service = StatsService::builder(
            Arc::new(InMemoryEventStore::new()),
            directory.clone(),
            Arc::new(InMemoryAggregateStore::new()),
        )
        .with_engine_config(EngineConfig {
            orphan_rebound: ReboundKind::Offensive,
            ..EngineConfig::default()
        })
        .build();

        service
            .record_event(
                game.id,
                NewEvent::new(EventKind::Rebound, Period::Q1, 470, TeamId::from("hawks"))
                    .with_player(ava.id),
            )
            .await
            .unwrap();

        let aggregates = service.aggregates(game.id).await.unwrap();
        assert_eq!(aggregates.players[&ava.id].counters.rebounds_offensive, 1);
    }

    #[tokio::test]
    async fn game_end_releases_the_game_lock() {
        let f = fixture().await;

        f.service
            .record_event(
                f.game.id,
                NewEvent::new(EventKind::Timeout, Period::Q4, 30, TeamId::from("hawks")),
            )
            .await
            .unwrap();
        assert!(f.service.game_mutexes.read().await.contains_key(&f.game.id));

        f.service
            .record_event(
                f.game.id,
                NewEvent::new(EventKind::GameEnd, Period::Q4, 0, TeamId::from("hawks")),
            )
            .await
            .unwrap();
        assert!(!f.service.game_mutexes.read().await.contains_key(&f.game.id));

        // Later corrections still serialise on a fresh lock
        f.service.rebuild(f.game.id).await.unwrap();
        assert!(f.service.game_mutexes.read().await.contains_key(&f.game.id));
    }
}
