//! Descent trajectory prediction.
//!
//! A trajectory is built backwards: a probe starts at the runway threshold at landing
//! speed and flies the remaining route in reverse, segment by segment, until it reaches
//! the aircraft's reported position. The emitted points are then reversed so they run
//! from the aircraft to the runway.
mod descent;
mod error;

pub use descent::{DescentContext, DescentStep, DescentStepper, ProbeState, STEP_SECS};
pub use error::{TrajectoryError, TrajectoryResult};

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::navdata::{RunwayThreshold, Star, Waypoint};
use crate::navigation::{AircraftPosition, LatLng};
use crate::performance::AircraftPerformance;
use crate::weather::{VerticalWeatherProfile, WindVector};

/// Synthetic id of the route point at the aircraft's reported position
const CURRENT_ID: &str = "CURRENT";

/// Distance inside which a runway behind the aircraft means it has landed
const LANDED_DISTANCE_NM: f64 = 3.0;
/// Groundspeed below which an aircraft near a runway behind it has landed
const LANDED_GROUNDSPEED_KTS: i32 = 160;

/// One point of a predicted descent profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub fix_id: Option<String>,
    pub position: LatLng,
    pub altitude_ft: i32,
    /// Along-route distance to the runway threshold
    pub remaining_distance_nm: f64,
    /// Flying time to the runway threshold in seconds
    pub remaining_time_secs: i64,
    pub groundspeed_kts: i32,
    pub tas_kts: i32,
    pub ias_kts: i32,
    pub wind: WindVector,
    pub heading_deg: i32,
}

impl TrajectoryPoint {
    pub fn remaining_time(&self) -> TimeDelta {
        TimeDelta::seconds(self.remaining_time_secs)
    }
}

/// Everything needed to predict one aircraft's descent
#[derive(Debug, Clone, Copy)]
pub struct DescentRequest<'a> {
    pub position: &'a AircraftPosition,
    pub runway: &'a RunwayThreshold,
    pub remaining_route: &'a [Waypoint],
    pub star: Option<&'a Star>,
    pub performance: &'a AircraftPerformance,
    pub weather: Option<&'a VerticalWeatherProfile>,
    pub filed_tas: Option<i32>,
    pub arrival_airport: &'a str,
}

/// Whether an aircraft is rolling out on (or has just passed) the runway
pub fn has_landed(position: &AircraftPosition, runway: &RunwayThreshold) -> bool {
    runway.position.is_behind(&position.position, position.track_deg)
        && position.position.distance_to(&runway.position) < LANDED_DISTANCE_NM
        && position.groundspeed_kts < LANDED_GROUNDSPEED_KTS
}

/// Predict the descent profile from the aircraft's position to the runway threshold.
///
/// Returns points ordered from the aircraft to the runway. The result is empty when
/// no route fixes remain and the runway is already behind the aircraft.
pub fn predict(request: &DescentRequest<'_>) -> Vec<TrajectoryPoint> {
    let runway = request.runway;
    let fixes: Vec<&Waypoint> = request
        .remaining_route
        .iter()
        .filter(|wp| !wp.is_passed && wp.id != request.arrival_airport && wp.id != runway.id)
        .collect();

    if fixes.is_empty()
        && runway
            .position
            .is_behind(&request.position.position, request.position.track_deg)
    {
        return Vec::new();
    }

    // Working route: CURRENT, remaining fixes, runway threshold
    let mut route: Vec<Waypoint> = Vec::with_capacity(fixes.len() + 2);
    route.push(Waypoint::new(CURRENT_ID, request.position.position));
    route.extend(fixes.into_iter().cloned());
    route.push(Waypoint::new(runway.id.clone(), runway.position));

    let star_route = &route[1..route.len() - 1];

    let context = DescentContext {
        performance: request.performance,
        weather: request.weather,
        filed_tas: request.filed_tas,
    };

    let landing_speed = request.performance.landing_vat;
    let mut state = ProbeState {
        position: runway.position,
        altitude_ft: runway.elevation_ft.round() as i32,
        ias_kts: landing_speed,
        tas_kts: landing_speed,
    };

    let mut points = vec![TrajectoryPoint {
        fix_id: Some(runway.id.clone()),
        position: runway.position,
        altitude_ft: state.altitude_ft,
        remaining_distance_nm: 0.0,
        remaining_time_secs: 0,
        groundspeed_kts: landing_speed,
        tas_kts: landing_speed,
        ias_kts: landing_speed,
        wind: WindVector::CALM,
        heading_deg: runway.true_heading_deg.round() as i32,
    }];

    let mut distance_nm = 0.0;
    let mut time_secs = 0;

    for later_index in (1..route.len()).rev() {
        let earlier = &route[later_index - 1];

        let target_altitude_ft = request
            .star
            .and_then(|star| {
                star.altitude_expectation(route[..later_index].iter().rev().map(|wp| wp.id.as_str()))
            })
            .unwrap_or(request.position.altitude_ft);

        // The CURRENT point is not part of the STAR route
        let target_ias = match (request.star, later_index.checked_sub(2)) {
            (Some(star), Some(index)) => star.speed_expectation(star_route, index),
            _ => None,
        };

        trace!(
            "segment {} -> {}: target altitude {} ft, target IAS {:?}",
            route[later_index].id, earlier.id, target_altitude_ft, target_ias
        );

        let mut stepper =
            DescentStepper::new(context, state, earlier.position, target_altitude_ft, target_ias);

        for step in stepper.by_ref() {
            distance_nm += step.distance_nm;
            time_secs += step.duration_secs;

            let fix_id = (step.reached_target && earlier.id != CURRENT_ID).then(|| earlier.id.clone());

            points.push(TrajectoryPoint {
                fix_id,
                position: step.position,
                altitude_ft: step.altitude_ft,
                remaining_distance_nm: distance_nm,
                remaining_time_secs: time_secs,
                groundspeed_kts: step.groundspeed_kts,
                tas_kts: step.tas_kts,
                ias_kts: step.ias_kts,
                wind: step.wind,
                heading_deg: step.heading_deg,
            });
        }

        state = stepper.state();
    }

    points.reverse();
    points
}
