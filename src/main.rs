use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use club_standings::aggregate::Aggregator;
use club_standings::api::routes::games::month_listing;
use club_standings::api::state::AppState;
use club_standings::config::AppConfig;
use club_standings::fetch::{ChessComClient, FetcherConfig};
use club_standings::models::MonthKey;

#[derive(Parser)]
#[command(name = "club-standings")]
#[command(about = "Monthly chess club standings from chess.com game archives")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print games currently in progress between club members
    Current,

    /// Print every month's games and standings
    Standings,

    /// Print one month of the month-by-month listing
    Month {
        #[arg(long)]
        year: i32,

        #[arg(long)]
        month: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_found = Path::new(&cli.config).exists();
    let config = if config_found {
        AppConfig::from_file(&cli.config)
            .with_context(|| format!("Failed to load config from {}", cli.config))?
    } else {
        AppConfig::default()
    };

    // Initialize tracing. Logs go to stderr so command output stays clean JSON.
    let log_level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(cli.json_logs.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with(
            (!cli.json_logs)
                .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        )
        .init();

    tracing::info!("Starting club-standings v{}", env!("CARGO_PKG_VERSION"));
    if !config_found {
        tracing::warn!("Config file {} not found, using defaults", cli.config);
    }

    let roster = Arc::new(config.roster.roster());
    tracing::info!("Roster: {}", roster.players().join(", "));

    let client = ChessComClient::new(FetcherConfig::from(&config.chess_com))?;
    let aggregator = Aggregator::new(Arc::new(client));

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);

            let state = AppState {
                roster,
                aggregator,
                cors_origin: config.server.cors_origin,
            };
            let app = club_standings::api::build_router(state);
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Current => {
            let current = aggregator.unfinished_games(&roster).await;
            print_json(&current)?;
        }
        Commands::Standings => {
            let months = aggregator.finished_games(&roster).await;
            tracing::info!("{} months with finished games", months.len());
            print_json(&months)?;
        }
        Commands::Month { year, month } => {
            let key = MonthKey::new(year, month)
                .filter(MonthKey::is_requestable)
                .ok_or_else(|| anyhow!("Invalid month {}-{}", year, month))?;
            let page = aggregator.finished_games_for_month(&roster, key).await;
            print_json(&month_listing(page))?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
