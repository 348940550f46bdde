//! EcoRoute Worker - route optimization service
//!
//! This worker connects to NATS and handles optimization requests from the
//! API gateway. It can also run a single request from a file (`optimize`
//! subcommand) for local use without a broker.

mod cli;
mod config;
mod defaults;
mod handlers;
mod services;
mod types;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs directory - use LOGS_DIR env var or default to ./logs
    let logs_dir = std::env::var("LOGS_DIR")
        .unwrap_or_else(|_| "./logs".to_string());
    std::fs::create_dir_all(&logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(
        Rotation::DAILY,
        &logs_dir,
        "worker.log",
    );
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Initialize logging - both stdout and file
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,ecoroute_worker=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())  // stdout
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))  // file
        .init();

    let args = cli::Cli::parse();

    // Load configuration
    let config = config::Config::from_env()?;
    info!("Configuration loaded");

    match args.command {
        Some(cli::Command::Optimize { file }) => run_once(&config, &file).await,
        Some(cli::Command::Serve) | None => serve(&config).await,
    }
}

/// Connect to NATS and serve optimization requests until a handler dies
async fn serve(config: &config::Config) -> Result<()> {
    info!("Starting EcoRoute Worker...");

    // Connect to NATS (supports optional NATS_USER/NATS_PASSWORD auth).
    let nats_client = match (std::env::var("NATS_USER"), std::env::var("NATS_PASSWORD")) {
        (Ok(user), Ok(password)) if !user.is_empty() => {
            async_nats::ConnectOptions::new()
                .user_and_password(user, password)
                .connect(&config.nats_url)
                .await?
        }
        _ => async_nats::connect(&config.nats_url).await?,
    };
    info!("Connected to NATS at {}", config.nats_url);

    // Start message handlers
    let handler_result = handlers::start_handlers(nats_client, config).await;

    if let Err(e) = handler_result {
        error!("Handler error: {}", e);
        return Err(e);
    }

    Ok(())
}

/// Run a single request from a JSON file and print the response to stdout
async fn run_once(config: &config::Config, file: &std::path::Path) -> Result<()> {
    use services::geocoding::create_geocoder;
    use services::planner::{self, PlannerSettings};
    use services::routing::create_routing_provider;

    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read request file {}", file.display()))?;
    let request: types::OptimizeRequest =
        serde_json::from_str(&raw).context("Failed to parse request JSON")?;

    let geocoder = create_geocoder();
    let provider = create_routing_provider(config.valhalla_url.as_deref());
    let settings = PlannerSettings {
        max_stops: config.max_stops,
        service_time_minutes: config.service_time_minutes,
        fallback_coordinates: config.fallback_coordinates,
    };

    let now = chrono::Local::now().naive_local();
    let response = planner::plan(&request, geocoder.as_ref(), provider.as_ref(), &settings, now)
        .await
        .context("Request rejected")?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
