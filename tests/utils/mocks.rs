use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};

use boxscore::{
    game::{GameId, PlayerId},
    stats::{AggregateStore, GameAggregates, InMemoryAggregateStore, PlayerAggregate, TeamAggregate},
    AppError,
};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// In-memory aggregate store whose writes can be told to fail once
pub struct FlakyAggregateStore {
    inner: InMemoryAggregateStore,
    fail_upsert: AtomicBool,
    fail_replace: AtomicBool,
}

impl FlakyAggregateStore {
    pub fn new(inner: InMemoryAggregateStore) -> Self {
        Self {
            inner,
            fail_upsert: AtomicBool::new(false),
            fail_replace: AtomicBool::new(false),
        }
    }

    pub fn fail_next_upsert(&self) {
        self.fail_upsert.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_replace(&self) {
        self.fail_replace.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl AggregateStore for FlakyAggregateStore {
    async fn load_game(&self, game_id: GameId) -> Result<GameAggregates, AppError> {
        self.inner.load_game(game_id).await
    }

    async fn upsert(
        &self,
        game_id: GameId,
        players: &[PlayerAggregate],
        teams: &[TeamAggregate],
    ) -> Result<(), AppError> {
        if self.fail_upsert.swap(false, Ordering::SeqCst) {
            return Err(AppError::DatabaseError("connection reset".to_string()));
        }
        self.inner.upsert(game_id, players, teams).await
    }

    async fn replace_game(&self, aggregates: &GameAggregates) -> Result<(), AppError> {
        if self.fail_replace.swap(false, Ordering::SeqCst) {
            return Err(AppError::DatabaseError("connection reset".to_string()));
        }
        self.inner.replace_game(aggregates).await
    }

    async fn player_history(&self, player_id: PlayerId) -> Result<Vec<PlayerAggregate>, AppError> {
        self.inner.player_history(player_id).await
    }
}
