use boxscore::{
    game::{GameEvent, NewEvent},
    stats::GameAggregates,
};

use super::setup::TestSetup;

// ============================================================================
// Action Helpers
// ============================================================================

impl TestSetup {
    /// Record events one at a time, in the given submission order
    pub async fn record_all(&self, events: Vec<NewEvent>) -> Vec<GameEvent> {
        let mut stored = Vec::with_capacity(events.len());
        for event in events {
            stored.push(
                self.service
                    .record_event(self.game.id, event)
                    .await
                    .expect("well-formed event should be recorded"),
            );
        }
        stored
    }

    /// Aggregates as currently persisted
    pub async fn live_aggregates(&self) -> GameAggregates {
        self.service
            .aggregates(self.game.id)
            .await
            .expect("game should exist")
    }

    pub async fn timeline(&self) -> Vec<GameEvent> {
        self.service
            .timeline(self.game.id)
            .await
            .expect("game should exist")
    }

    pub async fn rebuild(&self) -> GameAggregates {
        self.service
            .rebuild(self.game.id)
            .await
            .expect("rebuild should succeed")
    }
}
