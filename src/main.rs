use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use aman::arrivals::ArrivalSnapshot;
use aman::config::{AmanConfig, config_path};
use aman::log_format::PlannerLogFormat;
use aman::planner::ArrivalPlanner;
use aman::weather::VerticalWeatherProfile;

fn version() -> &'static str {
    option_env!("VERGEN_GIT_DESCRIBE").unwrap_or(env!("CARGO_PKG_VERSION"))
}

#[derive(Parser)]
#[command(name = "aman")]
#[command(about = "Arrival manager: predicts descents and sequences runway landings")]
#[command(version = version())]
struct Cli {
    /// Path to the TOML configuration (defaults to $AMAN_CONFIG, then ./aman.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one planning cycle over recorded arrival snapshots and print the result as JSON
    Replay {
        /// JSON file holding an array of arrival snapshots
        #[arg(long)]
        snapshot: PathBuf,

        /// Airport to plan (ICAO code)
        #[arg(long)]
        airport: String,

        /// Reference time (RFC 3339); defaults to the newest snapshot timestamp
        #[arg(long)]
        now: Option<DateTime<Utc>>,

        /// Override the configured minimum spacing
        #[arg(long)]
        minimum_spacing_nm: Option<f64>,

        /// JSON file holding a vertical weather profile
        #[arg(long)]
        weather: Option<PathBuf>,

        /// Include the predicted descent profile of this callsign
        #[arg(long)]
        profile: Option<String>,
    },
    /// Validate the configuration and print a summary
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let path = config_path(cli.config.as_deref());
    let config = AmanConfig::load(&path)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.planner.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .event_format(PlannerLogFormat::new(std::io::stderr().is_terminal()))
        .init();

    info!("aman {} using {:?}", version(), path);

    match cli.command {
        Commands::Replay {
            snapshot,
            airport,
            now,
            minimum_spacing_nm,
            weather,
            profile,
        } => {
            replay(
                &config,
                &snapshot,
                &airport,
                now,
                minimum_spacing_nm,
                weather.as_deref(),
                profile.as_deref(),
            )
            .await
        }
        Commands::CheckConfig => check_config(&config),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {:?}", path))
}

async fn replay(
    config: &AmanConfig,
    snapshot_path: &Path,
    icao: &str,
    now: Option<DateTime<Utc>>,
    minimum_spacing_nm: Option<f64>,
    weather_path: Option<&Path>,
    profile: Option<&str>,
) -> Result<()> {
    let airport = config
        .airport(icao)
        .with_context(|| format!("Airport {} is not configured", icao))?
        .clone();

    let snapshots: Vec<ArrivalSnapshot> = read_json(snapshot_path)?;
    let weather = weather_path
        .map(read_json::<VerticalWeatherProfile>)
        .transpose()?;

    let now = now
        .or_else(|| snapshots.iter().map(|s| s.timestamp).max())
        .unwrap_or_else(Utc::now);
    debug!("Replaying {} snapshots at {}", snapshots.len(), now);

    let planner = ArrivalPlanner::new(
        Arc::new(config.performance_catalog()),
        config.planner.clone(),
        Vec::new(),
    );
    let orchestrator = planner.start_tracking(airport, false).await;

    if let Some(spacing) = minimum_spacing_nm {
        orchestrator.set_minimum_spacing(spacing).await?;
    }
    if weather.is_some() {
        orchestrator.update_weather(weather).await;
    }

    let Some(events) = planner.handle_arrivals(icao, &snapshots, now).await else {
        bail!("Airport {} is not tracked", icao);
    };

    let descent_profile = match profile {
        Some(callsign) => Some(
            orchestrator
                .descent_profile(callsign)
                .with_context(|| format!("No descent profile for {}", callsign))?,
        ),
        None => None,
    };

    let output = serde_json::json!({
        "airport": orchestrator.airport_icao(),
        "now": now,
        "minimum_spacing_nm": orchestrator.minimum_spacing_nm().await,
        "events": events,
        "non_sequenced": orchestrator.non_sequenced().await,
        "descent_profile": descent_profile,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("Failed to serialize replay output")?
    );
    Ok(())
}

fn check_config(config: &AmanConfig) -> Result<()> {
    println!("Configuration OK");
    println!(
        "  minimum spacing: {} NM, stale after {}s, cleanup every {}s",
        config.planner.default_minimum_spacing_nm,
        config.planner.stale_arrival_secs,
        config.planner.cleanup_interval_secs
    );
    for airport in &config.airports {
        println!(
            "  {}: {} runways, {} STARs",
            airport.icao,
            airport.runways.len(),
            airport.stars.len()
        );
    }
    let mut types: Vec<&String> = config.aircraft.keys().collect();
    types.sort();
    println!(
        "  {} aircraft types: {}",
        types.len(),
        types
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(())
}
