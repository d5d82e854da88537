//! In-trail separation between consecutive landings.
use chrono::{DateTime, TimeDelta, Utc};

use super::SequenceCandidate;
use crate::performance::WakeCategory;

/// Wake spacing for leader/follower pairs not listed in the table
pub const DEFAULT_WAKE_SEPARATION_NM: f64 = 3.0;

/// Wake turbulence spacing in NM for a leader followed by a follower
pub fn wake_separation_nm(leader: WakeCategory, follower: WakeCategory) -> f64 {
    use WakeCategory::*;

    match (leader, follower) {
        (Heavy, Heavy) => 4.0,
        (Heavy, Medium) => 5.0,
        (Heavy, Light) => 6.0,
        (Medium, Light) => 5.0,
        (Super, Heavy) => 6.0,
        (Super, Medium) => 7.0,
        (Super, Light) => 8.0,
        _ => DEFAULT_WAKE_SEPARATION_NM,
    }
}

fn on_different_runways(leader: &SequenceCandidate, follower: &SequenceCandidate) -> bool {
    // Unknown runways are treated as the same runway
    match (leader.assigned_runway(), follower.assigned_runway()) {
        (Some(a), Some(b)) => a != b,
        _ => false,
    }
}

/// Spacing in NM the follower needs behind the leader
pub fn effective_separation_nm(
    leader: &SequenceCandidate,
    follower: &SequenceCandidate,
    minimum_separation_nm: f64,
) -> f64 {
    if on_different_runways(leader, follower) {
        minimum_separation_nm
    } else {
        wake_separation_nm(leader.wake_category(), follower.wake_category()).max(minimum_separation_nm)
    }
}

/// Minimum time between the leader's and the follower's landing, at the follower's landing speed
pub fn required_gap(
    leader: &SequenceCandidate,
    follower: &SequenceCandidate,
    minimum_separation_nm: f64,
) -> TimeDelta {
    let nm = effective_separation_nm(leader, follower, minimum_separation_nm);
    let ias = follower.landing_ias_kts().max(1) as f64;
    TimeDelta::milliseconds((nm / ias * 3_600_000.0).round() as i64)
}

/// Earliest time the follower may land after a leader landing at `leader_time`
pub fn safe_landing_time(
    leader_time: DateTime<Utc>,
    leader: &SequenceCandidate,
    follower: &SequenceCandidate,
    minimum_separation_nm: f64,
) -> DateTime<Utc> {
    leader_time + required_gap(leader, follower, minimum_separation_nm)
}
