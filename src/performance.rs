//! Aircraft performance reference data and the descent schedules derived from it.
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use serde::{Deserialize, Serialize};

use crate::speed;
use crate::weather::standard_temperature_at;

/// Descent rate used when a type has no rate of descent for any band
pub const DEFAULT_DESCENT_RATE_FPM: i32 = 1000;

/// Wake turbulence category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WakeCategory {
    #[serde(rename = "L")]
    Light,
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "H")]
    Heavy,
    #[serde(rename = "J")]
    Super,
}

impl WakeCategory {
    pub fn as_char(&self) -> char {
        match self {
            WakeCategory::Light => 'L',
            WakeCategory::Medium => 'M',
            WakeCategory::Heavy => 'H',
            WakeCategory::Super => 'J',
        }
    }
}

impl fmt::Display for WakeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for WakeCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" => Ok(WakeCategory::Light),
            "M" => Ok(WakeCategory::Medium),
            "H" => Ok(WakeCategory::Heavy),
            "J" | "S" => Ok(WakeCategory::Super),
            other => bail!("unknown wake category '{other}'"),
        }
    }
}

/// Per-type performance record. Speeds in knots IAS unless noted, rates in ft/min.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AircraftPerformance {
    pub wake_category: WakeCategory,
    #[serde(default)]
    pub initial_climb_ias: Option<i32>,
    /// Cruise true airspeed
    pub cruise_tas: i32,
    #[serde(default)]
    pub cruise_mach: Option<f64>,
    #[serde(default)]
    pub initial_descent_mach: Option<f64>,
    /// Rate of descent above FL240
    #[serde(default)]
    pub initial_descent_rod: Option<i32>,
    pub descent_ias: i32,
    /// Rate of descent between FL100 and FL240
    #[serde(default)]
    pub descent_rod: Option<i32>,
    pub approach_ias: i32,
    /// Rate of descent below FL100
    #[serde(default)]
    pub approach_rod: Option<i32>,
    /// Landing reference speed (Vapp)
    pub landing_vat: i32,
}

impl AircraftPerformance {
    fn rate_above_fl240(&self) -> i32 {
        self.initial_descent_rod
            .or(self.descent_rod)
            .or(self.approach_rod)
            .unwrap_or(DEFAULT_DESCENT_RATE_FPM)
    }

    fn rate_fl100_to_fl240(&self) -> i32 {
        self.descent_rod
            .or(self.approach_rod)
            .or(self.initial_descent_rod)
            .unwrap_or(DEFAULT_DESCENT_RATE_FPM)
    }

    fn rate_below_fl100(&self) -> i32 {
        self.approach_rod
            .or(self.descent_rod)
            .or(self.initial_descent_rod)
            .unwrap_or(DEFAULT_DESCENT_RATE_FPM)
    }

    /// Descent rate at `altitude_ft`, blended linearly across the three bands
    pub fn descent_rate_fpm(&self, altitude_ft: i32) -> i32 {
        let low = self.rate_below_fl100() as f64;
        let mid = self.rate_fl100_to_fl240() as f64;
        let high = self.rate_above_fl240() as f64;

        if altitude_ft < 10_000 {
            low as i32
        } else if altitude_ft < 24_000 {
            let ratio = (altitude_ft - 10_000) as f64 / 14_000.0;
            ((1.0 - ratio) * low + ratio * mid) as i32
        } else {
            let ratio = (altitude_ft - 24_000).min(10_000) as f64 / 10_000.0;
            ((1.0 - ratio) * mid + ratio * high) as i32
        }
    }

    /// Preferred IAS for the phase of flight at `altitude_ft`.
    ///
    /// Mach hold above FL300 (from the filed TAS, else the initial descent Mach),
    /// blend into descent IAS between FL280 and FL300, descent IAS down to FL100,
    /// then blend towards approach IAS at 5000 ft and landing speed at the ground.
    /// Capped at 240 kt below FL100.
    pub fn preferred_ias(&self, altitude_ft: i32, temperature_c: Option<i32>, filed_tas: Option<i32>) -> i32 {
        let temperature = temperature_c.unwrap_or_else(|| standard_temperature_at(altitude_ft));

        let mach_ias = filed_tas
            .map(|tas| speed::tas_to_ias(tas, altitude_ft, temperature))
            .or_else(|| {
                self.initial_descent_mach
                    .map(|mach| speed::mach_to_ias(mach, altitude_ft, temperature))
            })
            .unwrap_or(self.descent_ias);

        const LOW_ALTITUDE_CAP: f64 = 240.0;

        match altitude_ft {
            a if a > 30_000 => mach_ias,
            a if a >= 28_000 => {
                let ratio = (30_000 - a) as f64 / 2_000.0;
                (mach_ias as f64 * (1.0 - ratio) + self.descent_ias as f64 * ratio) as i32
            }
            a if a >= 10_000 => self.descent_ias,
            a if a >= 5_000 => {
                let ratio = (a - 5_000) as f64 / 5_000.0;
                let ias = (1.0 - ratio) * self.approach_ias as f64 + ratio * self.descent_ias as f64;
                ias.min(LOW_ALTITUDE_CAP) as i32
            }
            a => {
                let ratio = a.max(0) as f64 / 5_000.0;
                let ias = (1.0 - ratio) * self.landing_vat as f64 + ratio * self.approach_ias as f64;
                ias.min(LOW_ALTITUDE_CAP) as i32
            }
        }
    }
}

/// Read-only performance lookup keyed by ICAO type designator
#[derive(Debug, Clone, Default)]
pub struct PerformanceCatalog {
    types: HashMap<String, AircraftPerformance>,
}

impl PerformanceCatalog {
    pub fn new(types: HashMap<String, AircraftPerformance>) -> Self {
        // Type designators are matched case-insensitively
        let types = types
            .into_iter()
            .map(|(code, performance)| (code.to_ascii_uppercase(), performance))
            .collect();
        Self { types }
    }

    pub fn lookup(&self, type_code: &str) -> Option<&AircraftPerformance> {
        self.types.get(&type_code.trim().to_ascii_uppercase())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
