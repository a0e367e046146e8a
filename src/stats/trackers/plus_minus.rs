use std::collections::BTreeMap;

use crate::game::{GameContext, PlayerId, TeamId};
use crate::stats::models::PlayerAggregate;

/// Credits the scoring margin to everyone on the floor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlusMinusDistributor;

impl PlusMinusDistributor {
    /// On-court players of `scoring_team` gain `points`, on-court opponents
    /// lose them. Returns the players whose plus-minus changed. A team that
    /// is not playing in the game changes nothing.
    pub fn distribute(
        &self,
        game: &GameContext,
        players: &mut BTreeMap<PlayerId, PlayerAggregate>,
        scoring_team: &TeamId,
        points: u32,
    ) -> Vec<PlayerId> {
        if points == 0 {
            return Vec::new();
        }
        let Some(opponent) = game.opponent_of(scoring_team) else {
            return Vec::new();
        };

        let delta = points as i32;
        let mut credited = Vec::new();
        for player in players.values_mut().filter(|p| p.on_court) {
            if &player.team_id == scoring_team {
                player.plus_minus += delta;
            } else if &player.team_id == opponent {
                player.plus_minus -= delta;
            } else {
                continue;
            }
            credited.push(player.player_id);
        }
        credited
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameId;

    fn game() -> GameContext {
        GameContext {
            id: GameId(1),
            name: "Hawks vs Owls".to_string(),
            home_team: TeamId::from("hawks"),
            away_team: TeamId::from("owls"),
        }
    }

    fn roster(entries: &[(i64, &str, bool)]) -> BTreeMap<PlayerId, PlayerAggregate> {
        entries
            .iter()
            .map(|(id, team, on_court)| {
                let mut p = PlayerAggregate::new(GameId(1), PlayerId(*id), TeamId::from(*team));
                p.on_court = *on_court;
                (p.player_id, p)
            })
            .collect()
    }

    #[test]
    fn scoring_and_opposing_lineups_move_in_opposite_directions() {
        let mut players = roster(&[(1, "hawks", true), (2, "owls", true), (3, "hawks", false)]);

        let credited =
            PlusMinusDistributor.distribute(&game(), &mut players, &TeamId::from("hawks"), 2);

        assert_eq!(credited, vec![PlayerId(1), PlayerId(2)]);
        assert_eq!(players[&PlayerId(1)].plus_minus, 2);
        assert_eq!(players[&PlayerId(2)].plus_minus, -2);
        assert_eq!(players[&PlayerId(3)].plus_minus, 0);
    }

    #[test]
    fn unknown_scoring_team_is_a_no_op() {
        let mut players = roster(&[(1, "hawks", true), (2, "owls", true)]);

        let credited =
            PlusMinusDistributor.distribute(&game(), &mut players, &TeamId::from("crows"), 3);

        assert!(credited.is_empty());
        assert!(players.values().all(|p| p.plus_minus == 0));
    }

    #[test]
    fn zero_points_changes_nothing() {
        let mut players = roster(&[(1, "hawks", true)]);

        let credited =
            PlusMinusDistributor.distribute(&game(), &mut players, &TeamId::from("hawks"), 0);

        assert!(credited.is_empty());
    }
}
