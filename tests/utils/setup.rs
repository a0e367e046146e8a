use std::collections::HashMap;
use std::sync::Arc;

use boxscore::{
    game::{GameContext, InMemoryEventStore, InMemoryGameDirectory, Player, PlayerId},
    stats::{AggregateStore, InMemoryAggregateStore, StatsService},
    EngineConfig,
};

use super::mocks::FlakyAggregateStore;

pub const HOME: &str = "hawks";
pub const AWAY: &str = "owls";

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub service: StatsService,
    pub directory: Arc<InMemoryGameDirectory>,
    pub aggregate_store: Arc<FlakyAggregateStore>,
    pub game: GameContext,
    pub players: HashMap<String, Player>,
}

impl TestSetup {
    /// Id of a player registered through the builder
    pub fn player(&self, name: &str) -> PlayerId {
        self.players
            .get(name)
            .unwrap_or_else(|| panic!("player {name} was not registered"))
            .id
    }
}

pub struct TestSetupBuilder {
    roster: Vec<(String, String)>,
    engine: EngineConfig,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            roster: vec![],
            engine: EngineConfig::default(),
        }
    }

    pub fn with_players(mut self, team: &str, names: Vec<&str>) -> Self {
        self.roster
            .extend(names.into_iter().map(|n| (n.to_string(), team.to_string())));
        self
    }

    /// Two players per side: ava/cal for the home team, ben/dee for the away team
    pub fn with_two_per_side(self) -> Self {
        self.with_players(HOME, vec!["ava", "cal"])
            .with_players(AWAY, vec!["ben", "dee"])
    }

    pub fn with_engine_config(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    pub async fn build(self) -> TestSetup {
        let directory = Arc::new(InMemoryGameDirectory::new());
        let game = directory.create_game("Hawks vs Owls", HOME, AWAY).await;

        let mut players = HashMap::new();
        for (name, team) in &self.roster {
            let player = directory.create_player(name, team).await;
            players.insert(name.clone(), player);
        }

        let aggregate_store = Arc::new(FlakyAggregateStore::new(InMemoryAggregateStore::new()));
        let service = StatsService::builder(
            Arc::new(InMemoryEventStore::new()),
            directory.clone(),
            aggregate_store.clone() as Arc<dyn AggregateStore>,
        )
        .with_engine_config(self.engine)
        .build();

        TestSetup {
            service,
            directory,
            aggregate_store,
            game,
            players,
        }
    }
}
