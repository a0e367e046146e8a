use serde::{Deserialize, Serialize};

use crate::stats::models::BoxCounters;

/// Free throws that end a possession, per attempt
const FREE_THROW_POSSESSION_FACTOR: f64 = 0.44;

pub(crate) fn percentage(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator <= 0.0 {
        return None;
    }
    Some(round_one_decimal(numerator / denominator * 100.0))
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Shooting efficiency computed from counters, never stored
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ShootingSplits {
    pub fg_pct: Option<f64>,
    pub three_pt_pct: Option<f64>,
    pub ft_pct: Option<f64>,
    pub ts_pct: Option<f64>,
    pub efg_pct: Option<f64>,
}

impl ShootingSplits {
    pub fn from_counters(counters: &BoxCounters) -> Self {
        let fga = f64::from(counters.field_goals_attempted);
        let fgm = f64::from(counters.field_goals_made);
        let tpm = f64::from(counters.three_point_made);
        let fta = f64::from(counters.free_throws_attempted);

        Self {
            fg_pct: percentage(fgm, fga),
            three_pt_pct: percentage(tpm, f64::from(counters.three_point_attempted)),
            ft_pct: percentage(f64::from(counters.free_throws_made), fta),
            ts_pct: percentage(
                f64::from(counters.points),
                2.0 * (fga + FREE_THROW_POSSESSION_FACTOR * fta),
            ),
            efg_pct: percentage(fgm + 0.5 * tpm, fga),
        }
    }
}

/// Composite per-game contribution: production minus wasted possessions
pub fn contribution(counters: &BoxCounters) -> f64 {
    let missed_field_goals =
        f64::from(counters.field_goals_attempted) - f64::from(counters.field_goals_made);
    let missed_free_throws =
        f64::from(counters.free_throws_attempted) - f64::from(counters.free_throws_made);

    f64::from(counters.points)
        + 1.2 * f64::from(counters.rebounds_total)
        + 1.5 * f64::from(counters.assists)
        + 2.0 * f64::from(counters.steals)
        + 2.0 * f64::from(counters.blocks)
        - f64::from(counters.turnovers)
        - 0.5 * missed_field_goals
        - 0.5 * missed_free_throws
}

/// Player contribution as a percentage of the team total. `None` unless the
/// team total is positive.
pub fn impact_share(player_contribution: f64, team_contribution: f64) -> Option<f64> {
    if team_contribution <= 0.0 {
        return None;
    }
    Some(round_one_decimal(player_contribution / team_contribution * 100.0))
}

/// Estimated possessions: FGA - OREB + TOV + 0.44 * FTA
pub fn possessions(counters: &BoxCounters) -> f64 {
    f64::from(counters.field_goals_attempted) - f64::from(counters.rebounds_offensive)
        + f64::from(counters.turnovers)
        + FREE_THROW_POSSESSION_FACTOR * f64::from(counters.free_throws_attempted)
}

/// Points per 100 possessions
pub fn offensive_rating(counters: &BoxCounters) -> Option<f64> {
    percentage(f64::from(counters.points), possessions(counters))
}
