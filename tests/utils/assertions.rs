//! Test assertion helpers for aggregate invariants
#![allow(dead_code)] // Test utilities may not all be used in every test

use boxscore::stats::{BoxCounters, GameAggregates};

// ============================================================================
// Assertion Helpers
// ============================================================================

fn assert_decomposes(label: &str, counters: &BoxCounters) {
    assert_eq!(
        counters.field_goals_attempted,
        counters.two_point_attempted + counters.three_point_attempted,
        "{label}: field goal attempts must split into twos and threes"
    );
    assert_eq!(
        counters.field_goals_made,
        counters.two_point_made + counters.three_point_made,
        "{label}: field goals made must split into twos and threes"
    );
    assert_eq!(
        counters.rebounds_total,
        counters.rebounds_offensive + counters.rebounds_defensive,
        "{label}: rebounds must split into offensive and defensive"
    );
}

/// Counter decomposition holds for every player and team row
pub fn assert_counters_decompose(aggregates: &GameAggregates) {
    for player in aggregates.players.values() {
        assert_decomposes(&format!("player {}", player.player_id), &player.counters);
    }
    for team in aggregates.teams.values() {
        assert_decomposes(&format!("team {}", team.team_id), &team.counters);
    }
}

/// Points split by period add up to the points total
pub fn assert_period_points_add_up(aggregates: &GameAggregates) {
    for player in aggregates.players.values() {
        assert_eq!(
            player.points_by_period.values().sum::<u32>(),
            player.counters.points,
            "player {} period points",
            player.player_id
        );
    }
    for team in aggregates.teams.values() {
        assert_eq!(
            team.points_by_period.values().sum::<u32>(),
            team.counters.points,
            "team {} period points",
            team.team_id
        );
    }
}
