//! Arrival snapshots in, runway arrival events out.
use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::navdata::{Airport, Waypoint};
use crate::navigation::AircraftPosition;
use crate::performance::{PerformanceCatalog, WakeCategory};
use crate::sequence::{AircraftCandidate, SequenceCandidate};
use crate::trajectory::{self, DescentRequest, TrajectoryError, TrajectoryPoint, TrajectoryResult};
use crate::weather::VerticalWeatherProfile;

/// Latest reported state of one arriving aircraft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrivalSnapshot {
    pub callsign: String,
    pub aircraft_type: String,
    pub arrival_airport: String,
    pub position: AircraftPosition,
    #[serde(default)]
    pub assigned_runway: Option<String>,
    #[serde(default)]
    pub assigned_star: Option<String>,
    /// Fix the aircraft was cleared direct to, skipping anything before it on the route
    #[serde(default)]
    pub assigned_direct: Option<String>,
    #[serde(default)]
    pub tracking_controller: Option<String>,
    #[serde(default)]
    pub remaining_route: Vec<Waypoint>,
    #[serde(default)]
    pub filed_tas: Option<i32>,
    pub timestamp: DateTime<Utc>,
}

impl ArrivalSnapshot {
    /// Remaining route with everything before the direct-to fix marked as passed
    fn route_after_direct(&self) -> Vec<Waypoint> {
        let direct_index = self
            .assigned_direct
            .as_deref()
            .and_then(|direct| self.remaining_route.iter().position(|wp| wp.id == direct));

        match direct_index {
            Some(index) => self
                .remaining_route
                .iter()
                .enumerate()
                .map(|(i, wp)| Waypoint {
                    is_passed: wp.is_passed || i < index,
                    ..wp.clone()
                })
                .collect(),
            None => self.remaining_route.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SequenceStatus {
    Ok,
    AwaitingForSequence,
}

/// A predicted landing on a runway, merged with the sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunwayArrivalEvent {
    pub callsign: String,
    pub aircraft_type: String,
    pub wake_category: WakeCategory,
    pub airport_icao: String,
    pub runway: String,
    pub assigned_star: Option<String>,
    /// Whether the assigned STAR was found for the runway
    pub assigned_star_ok: bool,
    pub assigned_direct: Option<String>,
    pub tracking_controller: Option<String>,
    pub pressure_altitude_ft: i32,
    pub groundspeed_kts: i32,
    pub remaining_distance_nm: f64,
    pub landing_ias_kts: i32,
    pub estimated_time: DateTime<Utc>,
    pub scheduled_time: DateTime<Utc>,
    pub sequence_status: SequenceStatus,
    /// Along-route distance behind the preceding arrival
    pub distance_to_preceding_nm: Option<f64>,
    pub time_to_preceding_secs: Option<i64>,
    pub last_timestamp: DateTime<Utc>,
}

impl RunwayArrivalEvent {
    pub fn to_candidate(&self) -> SequenceCandidate {
        SequenceCandidate::Aircraft(AircraftCandidate {
            callsign: self.callsign.clone(),
            preferred_time: self.estimated_time,
            landing_ias_kts: self.landing_ias_kts,
            wake_category: self.wake_category,
            assigned_runway: Some(self.runway.clone()),
        })
    }

    /// Delay of the scheduled time against the estimate
    pub fn delay(&self) -> TimeDelta {
        self.scheduled_time - self.estimated_time
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NonSequencedReason {
    MissingPerformanceData,
    NoAssignedRunway,
    UnknownRunway,
    EmptyRoute,
    UnknownError,
}

impl NonSequencedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            NonSequencedReason::MissingPerformanceData => "missing_performance_data",
            NonSequencedReason::NoAssignedRunway => "no_assigned_runway",
            NonSequencedReason::UnknownRunway => "unknown_runway",
            NonSequencedReason::EmptyRoute => "empty_route",
            NonSequencedReason::UnknownError => "unknown_error",
        }
    }

    /// Reason to report for a failed prediction; `None` for aircraft that should vanish silently
    pub fn from_error(error: &TrajectoryError) -> Option<Self> {
        match error {
            TrajectoryError::UnknownAircraftType(_) => Some(NonSequencedReason::MissingPerformanceData),
            TrajectoryError::NoAssignedRunway => Some(NonSequencedReason::NoAssignedRunway),
            TrajectoryError::UnknownRunway { .. } => Some(NonSequencedReason::UnknownRunway),
            TrajectoryError::EmptyTrajectory => Some(NonSequencedReason::EmptyRoute),
            TrajectoryError::HasLanded => None,
        }
    }
}

impl fmt::Display for NonSequencedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An aircraft excluded from the current cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonSequencedEvent {
    pub callsign: String,
    pub aircraft_type: String,
    pub wake_category: Option<WakeCategory>,
    pub reason: NonSequencedReason,
}

/// Predict one arrival and build its event.
///
/// The event starts out awaiting sequence with the scheduled time equal to the estimate.
pub fn create_arrival_event(
    snapshot: &ArrivalSnapshot,
    airport: &Airport,
    catalog: &PerformanceCatalog,
    weather: Option<&VerticalWeatherProfile>,
    now: DateTime<Utc>,
) -> TrajectoryResult<(RunwayArrivalEvent, Vec<TrajectoryPoint>)> {
    let performance = catalog
        .lookup(&snapshot.aircraft_type)
        .ok_or_else(|| TrajectoryError::UnknownAircraftType(snapshot.aircraft_type.clone()))?;

    let runway_id = snapshot
        .assigned_runway
        .as_deref()
        .ok_or(TrajectoryError::NoAssignedRunway)?;

    let runway = airport
        .runway(runway_id)
        .ok_or_else(|| TrajectoryError::UnknownRunway {
            airport: airport.icao.clone(),
            runway: runway_id.to_string(),
        })?;

    if trajectory::has_landed(&snapshot.position, runway) {
        return Err(TrajectoryError::HasLanded);
    }

    let star = snapshot
        .assigned_star
        .as_deref()
        .and_then(|star_id| airport.star(star_id, runway_id));

    let route = snapshot.route_after_direct();
    let points = trajectory::predict(&DescentRequest {
        position: &snapshot.position,
        runway,
        remaining_route: &route,
        star,
        performance,
        weather,
        filed_tas: snapshot.filed_tas,
        arrival_airport: &snapshot.arrival_airport,
    });

    let first = points.first().ok_or(TrajectoryError::EmptyTrajectory)?;
    let estimated_time = now + first.remaining_time();

    let event = RunwayArrivalEvent {
        callsign: snapshot.callsign.clone(),
        aircraft_type: snapshot.aircraft_type.clone(),
        wake_category: performance.wake_category,
        airport_icao: snapshot.arrival_airport.clone(),
        runway: runway.id.clone(),
        assigned_star: snapshot.assigned_star.clone(),
        assigned_star_ok: star.is_some(),
        assigned_direct: snapshot.assigned_direct.clone(),
        tracking_controller: snapshot.tracking_controller.clone(),
        pressure_altitude_ft: snapshot.position.altitude_ft,
        groundspeed_kts: snapshot.position.groundspeed_kts,
        remaining_distance_nm: first.remaining_distance_nm,
        landing_ias_kts: performance.landing_vat,
        estimated_time,
        scheduled_time: estimated_time,
        sequence_status: SequenceStatus::AwaitingForSequence,
        distance_to_preceding_nm: None,
        time_to_preceding_secs: None,
        last_timestamp: snapshot.timestamp,
    };

    Ok((event, points))
}
