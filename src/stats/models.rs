use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::calculators::{ShootingSplits, ShotOutcome};
use super::trackers::ReboundKind;
use crate::game::{ClockMark, GameContext, GameId, Period, PlayerId, ShotCategory, TeamId};

/// Period → running total
pub type PeriodBreakdown = BTreeMap<Period, u32>;

fn add_to_period(breakdown: &mut PeriodBreakdown, period: Period, amount: u32) {
    *breakdown.entry(period).or_default() += amount;
}

/// Single-count box score statistics credited straight from an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Assists,
    Steals,
    Blocks,
    Turnovers,
    Fouls,
}

/// Scoring and box score counters shared by players and teams.
///
/// Field-goal counters exclude free throws: `field_goals_attempted` is always
/// `two_point_attempted + three_point_attempted`, and `rebounds_total` is
/// always `rebounds_offensive + rebounds_defensive`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxCounters {
    pub points: u32,
    pub field_goals_made: u32,
    pub field_goals_attempted: u32,
    pub two_point_made: u32,
    pub two_point_attempted: u32,
    pub three_point_made: u32,
    pub three_point_attempted: u32,
    pub free_throws_made: u32,
    pub free_throws_attempted: u32,
    pub rebounds_offensive: u32,
    pub rebounds_defensive: u32,
    pub rebounds_total: u32,
    pub assists: u32,
    pub steals: u32,
    pub blocks: u32,
    pub turnovers: u32,
    pub fouls: u32,
}

impl BoxCounters {
    pub fn record_shot(&mut self, shot: &ShotOutcome) {
        let made = u32::from(shot.made);
        match shot.category {
            ShotCategory::FreeThrow => {
                self.free_throws_attempted += 1;
                self.free_throws_made += made;
            }
            ShotCategory::ThreePoint => {
                self.field_goals_attempted += 1;
                self.field_goals_made += made;
                self.three_point_attempted += 1;
                self.three_point_made += made;
            }
            ShotCategory::TwoPoint => {
                self.field_goals_attempted += 1;
                self.field_goals_made += made;
                self.two_point_attempted += 1;
                self.two_point_made += made;
            }
        }
        self.points += shot.points();
    }

    pub fn record_rebound(&mut self, kind: ReboundKind) {
        match kind {
            ReboundKind::Offensive => self.rebounds_offensive += 1,
            ReboundKind::Defensive => self.rebounds_defensive += 1,
        }
        self.rebounds_total += 1;
    }

    pub fn bump(&mut self, counter: Counter) {
        let slot = match counter {
            Counter::Assists => &mut self.assists,
            Counter::Steals => &mut self.steals,
            Counter::Blocks => &mut self.blocks,
            Counter::Turnovers => &mut self.turnovers,
            Counter::Fouls => &mut self.fouls,
        };
        *slot += 1;
    }
}

/// Denormalized box score for one player in one game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerAggregate {
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub team_id: TeamId,
    #[serde(flatten)]
    pub counters: BoxCounters,
    pub points_by_period: PeriodBreakdown,
    pub plus_minus: i32,
    pub seconds_played: u32,
    /// Toggled only by substitutions
    pub on_court: bool,
    pub last_substitution: Option<ClockMark>,
}

impl PlayerAggregate {
    pub fn new(game_id: GameId, player_id: PlayerId, team_id: TeamId) -> Self {
        Self {
            game_id,
            player_id,
            team_id,
            counters: BoxCounters::default(),
            points_by_period: PeriodBreakdown::new(),
            plus_minus: 0,
            seconds_played: 0,
            on_court: false,
            last_substitution: None,
        }
    }

    pub fn record_shot(&mut self, shot: &ShotOutcome, period: Period) {
        self.counters.record_shot(shot);
        if shot.made {
            add_to_period(&mut self.points_by_period, period, shot.points());
        }
    }
}

/// Denormalized box score for one team in one game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamAggregate {
    pub game_id: GameId,
    pub team_id: TeamId,
    #[serde(flatten)]
    pub counters: BoxCounters,
    pub timeouts: u32,
    pub points_by_period: PeriodBreakdown,
    pub fg_made_by_period: PeriodBreakdown,
    pub fg_attempted_by_period: PeriodBreakdown,
}

impl TeamAggregate {
    pub fn new(game_id: GameId, team_id: TeamId) -> Self {
        Self {
            game_id,
            team_id,
            counters: BoxCounters::default(),
            timeouts: 0,
            points_by_period: PeriodBreakdown::new(),
            fg_made_by_period: PeriodBreakdown::new(),
            fg_attempted_by_period: PeriodBreakdown::new(),
        }
    }

    pub fn record_shot(&mut self, shot: &ShotOutcome, period: Period) {
        self.counters.record_shot(shot);
        if shot.made {
            add_to_period(&mut self.points_by_period, period, shot.points());
        }
        if shot.is_field_goal() {
            add_to_period(&mut self.fg_attempted_by_period, period, 1);
            if shot.made {
                add_to_period(&mut self.fg_made_by_period, period, 1);
            }
        }
    }
}

/// Every aggregate row of one game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameAggregates {
    pub game_id: GameId,
    pub players: BTreeMap<PlayerId, PlayerAggregate>,
    pub teams: BTreeMap<TeamId, TeamAggregate>,
}

impl GameAggregates {
    pub fn empty(game_id: GameId) -> Self {
        Self {
            game_id,
            players: BTreeMap::new(),
            teams: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty() && self.teams.is_empty()
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&PlayerAggregate> {
        self.players.get(&player_id)
    }

    pub fn team(&self, team_id: &TeamId) -> Option<&TeamAggregate> {
        self.teams.get(team_id)
    }
}

/// Player box score line with read-side metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerLine {
    #[serde(flatten)]
    pub aggregate: PlayerAggregate,
    #[serde(flatten)]
    pub shooting: ShootingSplits,
    pub contribution: f64,
    /// Share of the team's combined contribution in this game
    pub impact_share: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamLine {
    #[serde(flatten)]
    pub aggregate: TeamAggregate,
    #[serde(flatten)]
    pub shooting: ShootingSplits,
    pub possessions: f64,
    pub offensive_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxScore {
    pub game: GameContext,
    pub players: Vec<PlayerLine>,
    pub teams: Vec<TeamLine>,
}
