// src/main.rs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use retort_config::ConfigManager;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;

use app::RetortApp;

#[derive(Debug, Parser)]
#[command(name = "retort", version, about = "Three comebacks for whatever they just said")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, env = "RETORT_CONFIG", default_value = "config/retort.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Generate one reply set and print it
    Generate {
        /// What the other party said
        utterance: String,
        /// Intensity from 1 (gentle) to 10 (devastating); out-of-range values are clamped
        #[arg(short, long, default_value_t = 5, allow_negative_numbers = true)]
        intensity: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials may live in a local .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let manager = ConfigManager::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let config = manager.get();

    init_logging(&config.app.log_level)?;
    info!("Starting retort v{}", env!("CARGO_PKG_VERSION"));

    let app = RetortApp::new(config)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            app.run().await?;
            info!("retort shut down successfully");
        }
        Command::Generate {
            utterance,
            intensity,
        } => {
            let replies = app.generate_once(&utterance, intensity).await?;
            for (i, reply) in replies.iter().enumerate() {
                println!("{}. {}", i + 1, reply);
            }
        }
    }

    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("retort={level},{level}").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("initializing tracing subscriber")?;

    Ok(())
}
