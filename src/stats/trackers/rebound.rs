use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::game::{EventId, GameEvent, TeamId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReboundKind {
    Offensive,
    Defensive,
}

/// Missed shots of one game keyed by sequence id.
///
/// Derived cache, not source of truth: it is rebuilt from the event log on
/// every replay and seeded from the store on live appends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissIndex {
    misses: BTreeMap<EventId, TeamId>,
}

impl MissIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event_id: EventId, team: TeamId) {
        self.misses.insert(event_id, team);
    }

    /// Team of the nearest missed shot with a lower sequence id
    pub fn latest_before(&self, event_id: EventId) -> Option<&TeamId> {
        self.misses
            .range(..event_id)
            .next_back()
            .map(|(_, team)| team)
    }
}

/// Classifies a rebound by comparing the rebounder's team against the team
/// of the most recent missed shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReboundAttributor {
    /// Applied when no earlier missed shot exists
    orphan: ReboundKind,
}

impl Default for ReboundAttributor {
    fn default() -> Self {
        Self::new(ReboundKind::Defensive)
    }
}

impl ReboundAttributor {
    pub fn new(orphan: ReboundKind) -> Self {
        Self { orphan }
    }

    pub fn classify(&self, misses: &MissIndex, rebound: &GameEvent) -> ReboundKind {
        match misses.latest_before(rebound.id) {
            Some(team) if team == &rebound.team_id => ReboundKind::Offensive,
            Some(_) => ReboundKind::Defensive,
            None => self.orphan,
        }
    }
}
