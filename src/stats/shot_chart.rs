use serde::{Deserialize, Serialize};

use super::calculators::efficiency::percentage;
use crate::game::{EventId, EventKind, GameEvent, Period, PlayerId, ShotCategory, TeamId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ShotChartFilter {
    pub player_id: Option<PlayerId>,
    pub team_id: Option<TeamId>,
    pub period: Option<Period>,
}

impl ShotChartFilter {
    fn accepts(&self, event: &GameEvent) -> bool {
        self.player_id.map_or(true, |p| event.player_id == Some(p))
            && self.team_id.as_ref().map_or(true, |t| &event.team_id == t)
            && self.period.map_or(true, |p| event.period == p)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotChartEntry {
    pub event_id: EventId,
    pub player_id: Option<PlayerId>,
    pub team_id: TeamId,
    pub period: Period,
    pub clock_seconds: u32,
    pub shot_category: Option<ShotCategory>,
    pub kind: EventKind,
    pub x: f64,
    pub y: f64,
}

/// Located shot attempts of one game. Shots without court coordinates are
/// left out of both the entries and the totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotChart {
    pub shots: Vec<ShotChartEntry>,
    pub total_made: u32,
    pub total_attempted: u32,
    pub fg_pct: Option<f64>,
}

impl ShotChart {
    pub fn from_events<'a>(
        events: impl IntoIterator<Item = &'a GameEvent>,
        filter: &ShotChartFilter,
    ) -> Self {
        let shots: Vec<ShotChartEntry> = events
            .into_iter()
            .filter(|e| e.kind.is_shot() && filter.accepts(e))
            .filter_map(|e| {
                let location = e.location?;
                Some(ShotChartEntry {
                    event_id: e.id,
                    player_id: e.player_id,
                    team_id: e.team_id.clone(),
                    period: e.period,
                    clock_seconds: e.clock_seconds,
                    shot_category: e.shot_category,
                    kind: e.kind,
                    x: location.x,
                    y: location.y,
                })
            })
            .collect();

        let total_made = shots
            .iter()
            .filter(|s| s.kind == EventKind::ShotMade)
            .count() as u32;
        let total_attempted = shots.len() as u32;

        Self {
            fg_pct: percentage(f64::from(total_made), f64::from(total_attempted)),
            shots,
            total_made,
            total_attempted,
        }
    }
}
