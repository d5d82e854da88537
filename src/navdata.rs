//! Static navigation reference data: route fixes, STARs and runway thresholds.
use serde::{Deserialize, Serialize};

use crate::navigation::{LatLng, path_length_nm};

/// A fix on an aircraft's remaining route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub id: String,
    pub position: LatLng,
    #[serde(default)]
    pub is_passed: bool,
    #[serde(default)]
    pub is_on_star: bool,
}

impl Waypoint {
    pub fn new(id: impl Into<String>, position: LatLng) -> Self {
        Self {
            id: id.into(),
            position,
            is_passed: false,
            is_on_star: false,
        }
    }
}

/// A STAR fix with its published typical altitude and speed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarFix {
    pub id: String,
    #[serde(default)]
    pub typical_altitude_ft: Option<i32>,
    #[serde(default)]
    pub typical_speed_ias: Option<i32>,
}

/// Standard terminal arrival route bound to one runway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Star {
    pub id: String,
    pub runway: String,
    pub fixes: Vec<StarFix>,
}

impl Star {
    pub fn fix(&self, id: &str) -> Option<&StarFix> {
        self.fixes.iter().find(|fix| fix.id == id)
    }

    fn speed_constraint(&self, id: &str) -> Option<i32> {
        self.fix(id).and_then(|fix| fix.typical_speed_ias)
    }

    /// Typical altitude of the nearest altitude-constrained fix in `upstream`.
    ///
    /// `upstream` is ordered from the point of interest back towards the aircraft.
    pub fn altitude_expectation<'a, I>(&self, upstream: I) -> Option<i32>
    where
        I: IntoIterator<Item = &'a str>,
    {
        upstream
            .into_iter()
            .find_map(|id| self.fix(id).and_then(|fix| fix.typical_altitude_ft))
    }

    /// Expected IAS at `route[index]`.
    ///
    /// An exact constraint wins. Otherwise the speed is interpolated between the nearest
    /// constrained fixes before and after it, weighted by along-route distance. With only
    /// an earlier constraint that value is used; with none before it there is no expectation.
    pub fn speed_expectation(&self, route: &[Waypoint], index: usize) -> Option<i32> {
        let at = route.get(index)?;
        if let Some(speed) = self.speed_constraint(&at.id) {
            return Some(speed);
        }

        let later = (index + 1..route.len())
            .find_map(|i| self.speed_constraint(&route[i].id).map(|speed| (i, speed)));
        let prior = (0..index)
            .rev()
            .find_map(|i| self.speed_constraint(&route[i].id).map(|speed| (i, speed)));

        let (later_index, speed_ahead) = match (later, prior) {
            (None, prior) => return prior.map(|(_, speed)| speed),
            (Some(_), None) => return None,
            (Some(later), Some(_)) => later,
        };
        let (prior_index, speed_behind) = prior?;

        let distance_ahead = along_route_nm(route, index, later_index);
        let distance_behind = along_route_nm(route, prior_index, index);
        let total = distance_ahead + distance_behind;
        if total <= 0.0 {
            return Some(speed_behind);
        }

        let ratio = distance_ahead / total;
        Some((speed_behind as f64 * ratio + speed_ahead as f64 * (1.0 - ratio)) as i32)
    }
}

fn along_route_nm(route: &[Waypoint], from: usize, to: usize) -> f64 {
    let (start, end) = if from <= to { (from, to) } else { (to, from) };
    path_length_nm(route[start..=end].iter().map(|wp| &wp.position))
}

/// Runway threshold reference data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunwayThreshold {
    pub id: String,
    pub position: LatLng,
    pub elevation_ft: f64,
    pub true_heading_deg: f64,
}

/// An airport with its runway catalog and STARs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    pub icao: String,
    pub location: LatLng,
    #[serde(default)]
    pub runways: Vec<RunwayThreshold>,
    #[serde(default)]
    pub stars: Vec<Star>,
}

impl Airport {
    pub fn runway(&self, id: &str) -> Option<&RunwayThreshold> {
        self.runways.iter().find(|runway| runway.id == id)
    }

    /// STAR lookup by procedure name and runway
    pub fn star(&self, star_id: &str, runway_id: &str) -> Option<&Star> {
        self.stars
            .iter()
            .find(|star| star.id == star_id && star.runway == runway_id)
    }
}
