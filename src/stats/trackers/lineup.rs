use tracing::debug;

use crate::game::ClockMark;
use crate::stats::clock::PeriodClock;
use crate::stats::models::PlayerAggregate;

/// Keeps on-court state and playing time in step with substitutions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineupTracker {
    clock: PeriodClock,
}

impl LineupTracker {
    pub fn new(clock: PeriodClock) -> Self {
        Self { clock }
    }

    /// Takes the player off the court, crediting the time since their last
    /// entry. Returns the seconds credited.
    pub fn exit(&self, player: &mut PlayerAggregate, at: ClockMark) -> u32 {
        let mut credited = 0;
        if player.on_court {
            if let Some(entered) = player.last_substitution {
                credited = self.clock.elapsed(entered, at);
                player.seconds_played += credited;
            }
        }
        player.on_court = false;
        player.last_substitution = Some(at);

        debug!(player_id = %player.player_id, credited, "Player left the court");
        credited
    }

    /// Puts the player on the court regardless of prior state
    pub fn enter(&self, player: &mut PlayerAggregate, at: ClockMark) {
        player.on_court = true;
        player.last_substitution = Some(at);

        debug!(player_id = %player.player_id, "Player entered the court");
    }
}
