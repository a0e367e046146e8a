use std::collections::BTreeSet;
use tracing::debug;

use crate::config::EngineConfig;
use crate::game::{sort_canonical, EventKind, GameContext, GameEvent, PlayerId, TeamId};

use super::calculators::ShotOutcome;
use super::clock::PeriodClock;
use super::ledger::GameLedger;
use super::models::Counter;
use super::trackers::{LineupTracker, PlusMinusDistributor, ReboundAttributor};

/// Aggregate rows changed by one event, to be written back by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Touched {
    pub players: BTreeSet<PlayerId>,
    pub teams: BTreeSet<TeamId>,
}

impl Touched {
    pub fn is_empty(&self) -> bool {
        self.players.is_empty() && self.teams.is_empty()
    }
}

/// Folds events into a game's aggregates.
///
/// Pure and infallible: storage, validation and locking belong to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregationEngine {
    rebounds: ReboundAttributor,
    lineup: LineupTracker,
    plus_minus: PlusMinusDistributor,
}

impl AggregationEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            rebounds: ReboundAttributor::new(config.orphan_rebound),
            lineup: LineupTracker::new(PeriodClock::new(config.period_length_seconds)),
            plus_minus: PlusMinusDistributor,
        }
    }

    /// Applies one event of `game` to the ledger in place.
    ///
    /// Rebound attribution reads the ledger's miss index, which must already
    /// hold every missed shot with a lower sequence id than `event`.
    pub fn apply(&self, ledger: &mut GameLedger, game: &GameContext, event: &GameEvent) -> Touched {
        debug!(
            game_id = %game.id,
            event_id = %event.id,
            kind = %event.kind,
            "Applying event"
        );

        let mut touched = Touched::default();
        match event.kind {
            EventKind::ShotMade | EventKind::ShotMissed => {
                self.apply_shot(ledger, game, event, &mut touched)
            }
            EventKind::Rebound => {
                let kind = self.rebounds.classify(&ledger.misses, event);
                debug!(event_id = %event.id, ?kind, "Rebound classified");

                if let Some(player_id) = event.player_id {
                    ledger
                        .player_mut(player_id, &event.team_id)
                        .counters
                        .record_rebound(kind);
                    touched.players.insert(player_id);
                }
                ledger.team_mut(&event.team_id).counters.record_rebound(kind);
                touched.teams.insert(event.team_id.clone());
            }
            EventKind::Assist => self.apply_counter(ledger, event, Counter::Assists, &mut touched),
            EventKind::Steal => self.apply_counter(ledger, event, Counter::Steals, &mut touched),
            EventKind::Block => self.apply_counter(ledger, event, Counter::Blocks, &mut touched),
            EventKind::Turnover => {
                self.apply_counter(ledger, event, Counter::Turnovers, &mut touched)
            }
            EventKind::Foul => self.apply_counter(ledger, event, Counter::Fouls, &mut touched),
            EventKind::Timeout => {
                ledger.team_mut(&event.team_id).timeouts += 1;
                touched.teams.insert(event.team_id.clone());
            }
            EventKind::Substitution => {
                let at = event.clock_mark();
                if let Some(leaving) = event.player_id {
                    self.lineup
                        .exit(ledger.player_mut(leaving, &event.team_id), at);
                    touched.players.insert(leaving);
                }
                if let Some(entering) = event.second_player_id {
                    self.lineup
                        .enter(ledger.player_mut(entering, &event.team_id), at);
                    touched.players.insert(entering);
                }
            }
            // Lifecycle markers only
            EventKind::GameStart | EventKind::GameEnd => {}
        }
        touched
    }

    fn apply_shot(
        &self,
        ledger: &mut GameLedger,
        game: &GameContext,
        event: &GameEvent,
        touched: &mut Touched,
    ) {
        let shot = ShotOutcome::classify(event.shot_category, event.kind == EventKind::ShotMade);

        if let Some(player_id) = event.player_id {
            ledger
                .player_mut(player_id, &event.team_id)
                .record_shot(&shot, event.period);
            touched.players.insert(player_id);
        }
        ledger.team_mut(&event.team_id).record_shot(&shot, event.period);
        touched.teams.insert(event.team_id.clone());

        if shot.made {
            let credited =
                self.plus_minus
                    .distribute(game, ledger.players_mut(), &event.team_id, shot.points());
            touched.players.extend(credited);
        } else {
            ledger.note_missed_shot(event.id, event.team_id.clone());
        }
    }

    fn apply_counter(
        &self,
        ledger: &mut GameLedger,
        event: &GameEvent,
        counter: Counter,
        touched: &mut Touched,
    ) {
        if let Some(player_id) = event.player_id {
            ledger
                .player_mut(player_id, &event.team_id)
                .counters
                .bump(counter);
            touched.players.insert(player_id);
        }
        ledger.team_mut(&event.team_id).counters.bump(counter);
        touched.teams.insert(event.team_id.clone());
    }

    /// Rebuilds a game's aggregates from scratch.
    ///
    /// Events may arrive in any order: they are replayed canonically, and the
    /// miss index is seeded from the whole history first so rebound
    /// attribution depends only on the event set.
    pub fn replay(&self, game: &GameContext, mut events: Vec<GameEvent>) -> GameLedger {
        let mut ledger = GameLedger::empty(game.id);
        for event in events.iter().filter(|e| e.kind == EventKind::ShotMissed) {
            ledger.note_missed_shot(event.id, event.team_id.clone());
        }

        sort_canonical(&mut events);
        for event in &events {
            self.apply(&mut ledger, game, event);
        }
        ledger
    }
}
