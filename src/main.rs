//! Nutrient Exchange - organic-waste fertilizer matching service
//!
//! ## Usage
//!
//! ```bash
//! # Serve the HTTP API (default)
//! nutrient-exchange --addr 0.0.0.0:8000
//!
//! # One-shot recommendation printed as JSON
//! nutrient-exchange recommend --crop maize --nitrogen 20 --phosphorus 50 --potassium 30
//!
//! # Start from an empty offer store
//! nutrient-exchange --reset-db
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use nutrient_exchange::api::{self, ExchangeState};
use nutrient_exchange::config::{self, MarketConfig};
use nutrient_exchange::market::{FarmerRequest, Marketplace};

// ============================================================================
// CLI
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "nutrient-exchange", version, about)]
struct CliArgs {
    /// Override the server address (default: "0.0.0.0:8000")
    #[arg(short, long, env = "EXCHANGE_SERVER_ADDR")]
    addr: Option<String>,

    /// Path to an exchange_config.toml
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Remove the offer store before starting.
    /// WARNING: This is destructive and cannot be undone!
    /// Can also be set via RESET_DB=true environment variable.
    #[arg(long)]
    reset_db: bool,

    #[command(subcommand)]
    command: Option<SubCommand>,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Run a single recommendation and print it as JSON
    Recommend {
        #[arg(long, default_value = "rice")]
        crop: String,
        #[arg(long, default_value_t = 40.0)]
        nitrogen: f64,
        #[arg(long, default_value_t = 50.0)]
        phosphorus: f64,
        #[arg(long, default_value_t = 30.0)]
        potassium: f64,
        #[arg(long, default_value_t = 28.6, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, default_value_t = 77.2, allow_hyphen_values = true)]
        lon: f64,
    },
}

// ============================================================================
// Database Reset
// ============================================================================

/// Check if database reset is requested via CLI flag or environment variable.
fn should_reset_db(cli_flag: bool) -> bool {
    if cli_flag {
        return true;
    }
    if let Ok(val) = std::env::var("RESET_DB") {
        let val_lower = val.to_lowercase();
        return val_lower == "true" || val_lower == "1" || val_lower == "yes";
    }
    false
}

/// Remove the data directory and all its contents.
fn reset_data_directory(data_path: &Path) -> Result<()> {
    if !data_path.exists() {
        info!(path = %data_path.display(), "Data directory does not exist, nothing to reset");
        return Ok(());
    }

    warn!(path = %data_path.display(), "RESET_DB detected, wiping offer store");
    if let Ok(entries) = std::fs::read_dir(data_path) {
        for entry in entries.flatten() {
            warn!(path = %entry.path().display(), "Removing");
        }
    }

    std::fs::remove_dir_all(data_path).context("Failed to remove data directory")?;
    warn!("Data directory removed; a fresh store will be created on startup");
    Ok(())
}

// ============================================================================
// Server
// ============================================================================

/// Spawn the HTTP server task into the JoinSet.
fn spawn_http_server(
    task_set: &mut JoinSet<Result<()>>,
    listener: tokio::net::TcpListener,
    app: axum::Router,
    cancel_token: CancellationToken,
) {
    task_set.spawn(async move {
        info!("[HttpServer] Task starting");

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                info!("[HttpServer] Received shutdown signal");
            })
            .await;

        match result {
            Ok(()) => {
                info!("[HttpServer] Graceful shutdown complete");
                Ok(())
            }
            Err(e) => {
                error!("[HttpServer] Server error: {}", e);
                Err(anyhow::anyhow!("HTTP server error: {}", e))
            }
        }
    });
}

async fn serve(market: Marketplace, server_addr: &str) -> Result<()> {
    let state = ExchangeState::new(Arc::new(market));
    let app = api::create_app(state);

    let listener = tokio::net::TcpListener::bind(server_addr)
        .await
        .with_context(|| format!("Failed to bind {server_addr}"))?;
    info!(addr = %server_addr, "HTTP API listening");

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let mut task_set: JoinSet<Result<()>> = JoinSet::new();
    spawn_http_server(&mut task_set, listener, app, cancel_token.clone());

    while let Some(joined) = task_set.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                cancel_token.cancel();
                return Err(e);
            }
            Err(e) => {
                cancel_token.cancel();
                return Err(anyhow::anyhow!("HTTP server task panicked: {e}"));
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    config::init(MarketConfig::load(args.config.as_deref()));
    let cfg = config::get();

    // Reset before any storage is opened
    if should_reset_db(args.reset_db) {
        reset_data_directory(&cfg.storage.data_dir)?;
    }

    let market = Marketplace::bootstrap(cfg).await?;

    if let Some(SubCommand::Recommend {
        crop,
        nitrogen,
        phosphorus,
        potassium,
        lat,
        lon,
    }) = args.command
    {
        let request = FarmerRequest {
            crop_type: crop,
            soil_nitrogen: nitrogen,
            soil_phosphorus: phosphorus,
            soil_potassium: potassium,
            farmer_lat: lat,
            farmer_lon: lon,
        };
        let recommendation = market.recommend(&request).await?;
        println!("{}", serde_json::to_string_pretty(&recommendation)?);
        return Ok(());
    }

    let server_addr = args.addr.unwrap_or_else(|| cfg.server.addr.clone());
    info!(
        backend = %cfg.storage.backend,
        data_dir = %cfg.storage.data_dir.display(),
        "Nutrient Exchange starting"
    );
    serve(market, &server_addr).await?;

    info!("Nutrient Exchange shutdown complete");
    Ok(())
}
