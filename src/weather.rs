//! Altitude-layered weather above an airport.
//!
//! Weather is consumed read-only. When no profile is available the predictor falls
//! back to the standard atmosphere temperature and calm wind.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::navigation::LatLng;

/// Wind as reported by forecasts: direction the wind blows FROM, in true degrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WindVector {
    pub direction_deg: i32,
    pub speed_kts: i32,
}

impl WindVector {
    pub const CALM: WindVector = WindVector {
        direction_deg: 0,
        speed_kts: 0,
    };
}

/// A single forecast level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherLayer {
    pub flight_level_ft: i32,
    pub temperature_c: i32,
    pub wind: WindVector,
}

/// Forecast column for one position and time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerticalWeatherProfile {
    pub time: DateTime<Utc>,
    pub position: LatLng,
    pub layers: Vec<WeatherLayer>,
}

impl VerticalWeatherProfile {
    /// Interpolate temperature and wind at `altitude_ft`.
    ///
    /// Altitudes outside the forecast column take the nearest layer. Wind direction is
    /// blended along the shortest arc. Returns `None` for a profile without layers.
    pub fn interpolate_at(&self, altitude_ft: i32) -> Option<WeatherLayer> {
        let mut sorted = self.layers.clone();
        sorted.sort_by_key(|layer| layer.flight_level_ft);

        let lowest = *sorted.first()?;
        let highest = *sorted.last()?;

        let lower = sorted
            .iter()
            .rev()
            .find(|layer| layer.flight_level_ft <= altitude_ft)
            .copied()
            .unwrap_or(lowest);
        let upper = sorted
            .iter()
            .find(|layer| layer.flight_level_ft > altitude_ft)
            .copied()
            .unwrap_or(highest);

        let ratio = if altitude_ft <= lower.flight_level_ft {
            0.0
        } else if altitude_ft >= upper.flight_level_ft {
            1.0
        } else {
            (altitude_ft - lower.flight_level_ft) as f64
                / (upper.flight_level_ft - lower.flight_level_ft) as f64
        };

        let dir1 = lower.wind.direction_deg as f64;
        let dir2 = upper.wind.direction_deg as f64;
        let delta = (dir2 - dir1 + 540.0).rem_euclid(360.0) - 180.0;
        let direction = (dir1 + ratio * delta + 360.0).rem_euclid(360.0);

        let speed = (1.0 - ratio) * lower.wind.speed_kts as f64 + ratio * upper.wind.speed_kts as f64;
        let temperature =
            (1.0 - ratio) * lower.temperature_c as f64 + ratio * upper.temperature_c as f64;

        Some(WeatherLayer {
            flight_level_ft: altitude_ft,
            temperature_c: temperature.round() as i32,
            wind: WindVector {
                direction_deg: (direction.round() as i32).rem_euclid(360),
                speed_kts: speed.round() as i32,
            },
        })
    }
}

/// ISA temperature at altitude in whole degrees Celsius (2 °C per 1000 ft from 15 °C)
pub fn standard_temperature_at(altitude_ft: i32) -> i32 {
    const LAPSE_RATE_PER_FT: f64 = 2.0 / 1000.0;
    const SEA_LEVEL_TEMPERATURE_C: f64 = 15.0;
    (SEA_LEVEL_TEMPERATURE_C - LAPSE_RATE_PER_FT * altitude_ft as f64).round() as i32
}

/// Conditions at altitude from an optional profile, degrading to ISA and calm wind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientConditions {
    pub temperature_c: i32,
    pub wind: WindVector,
    /// Whether the values came from a forecast rather than the fallback
    pub forecast: bool,
}

impl AmbientConditions {
    pub fn at(profile: Option<&VerticalWeatherProfile>, altitude_ft: i32) -> Self {
        match profile.and_then(|p| p.interpolate_at(altitude_ft)) {
            Some(layer) => Self {
                temperature_c: layer.temperature_c,
                wind: layer.wind,
                forecast: true,
            },
            None => Self {
                temperature_c: standard_temperature_at(altitude_ft),
                wind: WindVector::CALM,
                forecast: false,
            },
        }
    }
}
