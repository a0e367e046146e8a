use std::sync::Arc;

use anyhow::Context;
use boxscore::config::{AppConfig, LoggingConfig};
use boxscore::game::{GameId, PostgresGameStore};
use boxscore::stats::{PostgresAggregateStore, StatsService};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::Executor;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const SCHEMA: &str = include_str!("../migrations/0001_boxscore.sql");

/// Maintenance commands for recorded games
#[derive(Parser, Debug)]
#[command(name = "boxscore")]
#[command(about = "Rebuild and inspect basketball box scores", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding default.toml and environment overrides
    #[arg(short, long, default_value = "config")]
    config: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the tables if they do not exist yet
    Migrate,

    /// Wipe a game's aggregates and replay its event log
    Rebuild {
        #[arg(short, long)]
        game: i64,
    },

    /// Print a game's box score as JSON
    BoxScore {
        #[arg(short, long)]
        game: i64,
    },

    /// Print a game's events in chronological order as JSON
    Timeline {
        #[arg(short, long)]
        game: i64,
    },
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("boxscore={}", logging.level)));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_from(&cli.config).context("failed to load configuration")?;
    init_tracing(&config.logging);

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .context("failed to connect to database")?;

    if let Commands::Migrate = cli.command {
        pool.execute(SCHEMA).await.context("failed to apply schema")?;
        info!("Schema applied");
        return Ok(());
    }

    let game_store = Arc::new(PostgresGameStore::new(pool.clone()));
    let service = StatsService::builder(
        game_store.clone(),
        game_store,
        Arc::new(PostgresAggregateStore::new(pool)),
    )
    .with_engine_config(config.engine)
    .build();

    match cli.command {
        Commands::Migrate => {}
        Commands::Rebuild { game } => {
            let aggregates = service.rebuild(GameId(game)).await?;
            info!(
                game_id = game,
                players = aggregates.players.len(),
                teams = aggregates.teams.len(),
                "Rebuild finished"
            );
        }
        Commands::BoxScore { game } => {
            let box_score = service.box_score(GameId(game)).await?;
            println!("{}", serde_json::to_string_pretty(&box_score)?);
        }
        Commands::Timeline { game } => {
            let events = service.timeline(GameId(game)).await?;
            println!("{}", serde_json::to_string_pretty(&events)?);
        }
    }

    Ok(())
}
