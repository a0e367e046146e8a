use std::collections::BTreeMap;

use crate::game::{EventId, GameId, PlayerId, TeamId};

use super::models::{GameAggregates, PlayerAggregate, TeamAggregate};
use super::trackers::MissIndex;

/// Running state of one game: its aggregate rows plus the derived caches the
/// engine needs while folding events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameLedger {
    aggregates: GameAggregates,
    pub(crate) misses: MissIndex,
}

impl GameLedger {
    /// A wiped ledger with no aggregates and empty caches
    pub fn empty(game_id: GameId) -> Self {
        Self::from_aggregates(GameAggregates::empty(game_id))
    }

    /// Resumes from persisted aggregates. Caches start empty and must be
    /// seeded by the caller when the next event needs them.
    pub fn from_aggregates(aggregates: GameAggregates) -> Self {
        Self {
            aggregates,
            misses: MissIndex::new(),
        }
    }

    pub fn game_id(&self) -> GameId {
        self.aggregates.game_id
    }

    pub fn aggregates(&self) -> &GameAggregates {
        &self.aggregates
    }

    pub fn into_aggregates(self) -> GameAggregates {
        self.aggregates
    }

    /// Registers a missed shot known from the event log
    pub fn note_missed_shot(&mut self, event_id: EventId, team: TeamId) {
        self.misses.record(event_id, team);
    }

    pub(crate) fn player_mut(
        &mut self,
        player_id: PlayerId,
        team_id: &TeamId,
    ) -> &mut PlayerAggregate {
        let game_id = self.aggregates.game_id;
        self.aggregates
            .players
            .entry(player_id)
            .or_insert_with(|| PlayerAggregate::new(game_id, player_id, team_id.clone()))
    }

    pub(crate) fn team_mut(&mut self, team_id: &TeamId) -> &mut TeamAggregate {
        let game_id = self.aggregates.game_id;
        self.aggregates
            .teams
            .entry(team_id.clone())
            .or_insert_with(|| TeamAggregate::new(game_id, team_id.clone()))
    }

    pub(crate) fn players_mut(&mut self) -> &mut BTreeMap<PlayerId, PlayerAggregate> {
        &mut self.aggregates.players
    }
}
