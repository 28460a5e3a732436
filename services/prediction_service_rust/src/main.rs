mod app;
mod config;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, Subcommand};
use config::Config;
use dotenv::dotenv;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "prediction_service")]
#[command(
    about = "Game predictions from weighted factors that adapt to results",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report service health and whether persistence is available
    Health,
    /// List unsettled games
    Games {
        /// Only games for this sport (e.g. "nba")
        #[arg(long)]
        sport: Option<String>,
    },
    /// Show the current factor weights
    Factors,
    /// Predict the winner of a game and record the prediction
    Predict {
        game_id: String,
    },
    /// Report a game's winner and adjust factor weights
    #[command(name = "result")]
    Settle {
        game_id: String,
        actual_outcome: String,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize response")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    info!(
        "Starting prediction service (persistence configured: {}, learning delta: {:.4})",
        config.persistence_configured(),
        config.learning.delta()
    );

    let app = App::from_config(&config).await;

    match cli.command {
        Commands::Health => print_json(&app.health()),
        Commands::Games { sport } => print_json(&app.list_games(sport.as_deref()).await?),
        Commands::Factors => print_json(&app.factors().await),
        Commands::Predict { game_id } => print_json(&app.predict(&game_id).await?),
        Commands::Settle {
            game_id,
            actual_outcome,
        } => print_json(&app.settle(&game_id, &actual_outcome).await?),
    }
}
