//! Runway landing sequence.
//!
//! A [`Sequence`] is an immutable value: every engine operation takes the current
//! sequence by reference and returns a new one.
mod engine;
mod separation;

pub use engine::{
    is_time_slot_available, remove_from_sequence, reschedule, suggest_scheduled_time,
    update_sequence,
};
pub use separation::{
    DEFAULT_WAKE_SEPARATION_NM, effective_separation_nm, required_gap, safe_landing_time,
    wake_separation_nm,
};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::performance::WakeCategory;

/// Time to touchdown within which a candidate is actively sequenced
pub const SEQUENCING_HORIZON: TimeDelta = TimeDelta::minutes(30);

/// Time to touchdown within which a candidate's relative order is frozen
pub const LOCKED_HORIZON: TimeDelta = TimeDelta::minutes(10);

/// An arriving aircraft competing for a landing slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AircraftCandidate {
    pub callsign: String,
    pub preferred_time: DateTime<Utc>,
    pub landing_ias_kts: i32,
    pub wake_category: WakeCategory,
    pub assigned_runway: Option<String>,
}

/// Anything that occupies a slot in the landing sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SequenceCandidate {
    Aircraft(AircraftCandidate),
}

impl SequenceCandidate {
    pub fn id(&self) -> &str {
        match self {
            SequenceCandidate::Aircraft(aircraft) => &aircraft.callsign,
        }
    }

    pub fn preferred_time(&self) -> DateTime<Utc> {
        match self {
            SequenceCandidate::Aircraft(aircraft) => aircraft.preferred_time,
        }
    }

    /// Speed over the threshold used to convert spacing in miles to time
    pub fn landing_ias_kts(&self) -> i32 {
        match self {
            SequenceCandidate::Aircraft(aircraft) => aircraft.landing_ias_kts,
        }
    }

    pub fn wake_category(&self) -> WakeCategory {
        match self {
            SequenceCandidate::Aircraft(aircraft) => aircraft.wake_category,
        }
    }

    pub fn assigned_runway(&self) -> Option<&str> {
        match self {
            SequenceCandidate::Aircraft(aircraft) => aircraft.assigned_runway.as_deref(),
        }
    }

    pub fn time_to_preferred(&self, now: DateTime<Utc>) -> TimeDelta {
        self.preferred_time() - now
    }

    pub fn is_in_sequencing_horizon(&self, now: DateTime<Utc>) -> bool {
        self.time_to_preferred(now) <= SEQUENCING_HORIZON
    }

    pub fn is_in_locked_horizon(&self, now: DateTime<Utc>) -> bool {
        self.time_to_preferred(now) <= LOCKED_HORIZON
    }
}

impl From<AircraftCandidate> for SequenceCandidate {
    fn from(candidate: AircraftCandidate) -> Self {
        SequenceCandidate::Aircraft(candidate)
    }
}

/// A candidate with its scheduled landing time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencePlace {
    pub candidate: SequenceCandidate,
    pub scheduled_time: DateTime<Utc>,
    pub is_manually_assigned: bool,
}

impl SequencePlace {
    pub fn id(&self) -> &str {
        self.candidate.id()
    }
}

/// Ordered landing slots, sorted by scheduled time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    places: Vec<SequencePlace>,
}

impl Sequence {
    pub fn new(places: Vec<SequencePlace>) -> Self {
        Self { places }
    }

    pub fn places(&self) -> &[SequencePlace] {
        &self.places
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&SequencePlace> {
        self.places.iter().find(|place| place.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn scheduled_time(&self, id: &str) -> Option<DateTime<Utc>> {
        self.get(id).map(|place| place.scheduled_time)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.places.iter().map(SequencePlace::id)
    }

    pub(crate) fn position(&self, id: &str) -> Option<usize> {
        self.places.iter().position(|place| place.id() == id)
    }
}
