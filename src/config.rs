use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::navdata::Airport;
use crate::orchestrator::DEFAULT_MINIMUM_SPACING_NM;
use crate::performance::{AircraftPerformance, PerformanceCatalog};

/// Planner tuning shared by every tracked airport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerSettings {
    #[serde(default = "default_minimum_spacing_nm")]
    pub default_minimum_spacing_nm: f64,
    /// Arrivals not refreshed for this long are dropped from the event list
    #[serde(default = "default_stale_arrival_secs")]
    pub stale_arrival_secs: u64,
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_minimum_spacing_nm() -> f64 {
    DEFAULT_MINIMUM_SPACING_NM
}

fn default_stale_arrival_secs() -> u64 {
    5
}

fn default_cleanup_interval_secs() -> u64 {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            default_minimum_spacing_nm: default_minimum_spacing_nm(),
            stale_arrival_secs: default_stale_arrival_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
            log_level: default_log_level(),
        }
    }
}

/// Top-level configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AmanConfig {
    #[serde(default)]
    pub planner: PlannerSettings,
    #[serde(default)]
    pub airports: Vec<Airport>,
    /// Performance data keyed by ICAO aircraft type designator
    #[serde(default)]
    pub aircraft: HashMap<String, AircraftPerformance>,
}

impl AmanConfig {
    /// Load and validate config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let config: AmanConfig =
            toml::from_str(&contents).with_context(|| format!("Failed to parse {:?}", path))?;
        config
            .validate()
            .with_context(|| format!("Invalid configuration in {:?}", path))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let spacing = self.planner.default_minimum_spacing_nm;
        if !spacing.is_finite() || spacing <= 0.0 {
            bail!("default_minimum_spacing_nm must be positive, got {spacing}");
        }
        if self.planner.cleanup_interval_secs == 0 {
            bail!("cleanup_interval_secs must be at least 1");
        }

        let mut seen = HashSet::new();
        for airport in &self.airports {
            if !seen.insert(airport.icao.to_uppercase()) {
                bail!("Airport {} is configured more than once", airport.icao);
            }
            for star in &airport.stars {
                if airport.runway(&star.runway).is_none() {
                    bail!(
                        "STAR {} at {} references unknown runway {}",
                        star.id,
                        airport.icao,
                        star.runway
                    );
                }
            }
        }
        Ok(())
    }

    pub fn airport(&self, icao: &str) -> Option<&Airport> {
        self.airports
            .iter()
            .find(|airport| airport.icao.eq_ignore_ascii_case(icao))
    }

    pub fn performance_catalog(&self) -> PerformanceCatalog {
        PerformanceCatalog::new(self.aircraft.clone())
    }
}

/// Resolve the config file path.
///
/// Priority:
/// 1. Explicit path (from `--config`)
/// 2. `AMAN_CONFIG` env var
/// 3. `./aman.toml`
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("AMAN_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("./aman.toml")
}
