//! Sequence engine operations.
//!
//! All operations are pure: they read the current [`Sequence`] and return a new one.
//! Operations naming an id that is not in the sequence return it unchanged.
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use super::separation::safe_landing_time;
use super::{Sequence, SequenceCandidate, SequencePlace};

/// Upper bound on leader/follower resolution rounds for one insertion
const MAX_INSERTION_ROUNDS: usize = 64;

/// A place being rebuilt, ranked by its position in the previous sequence
#[derive(Debug, Clone)]
struct WorkingPlace {
    place: SequencePlace,
    rank: usize,
}

/// Refresh the sequence from the latest candidates.
///
/// Manual places keep their times. Auto places start again from their latest preferred
/// time, held behind any manual or locked place that led them before. New candidates
/// inside the sequencing horizon are inserted without overtaking anything in the locked
/// horizon, and a final sweep restores separation between every adjacent pair.
pub fn update_sequence(
    current: &Sequence,
    candidates: &[SequenceCandidate],
    minimum_separation_nm: f64,
    now: DateTime<Utc>,
) -> Sequence {
    let latest: HashMap<&str, &SequenceCandidate> =
        candidates.iter().map(|c| (c.id(), c)).collect();

    // Existing places still reported and still inside the horizon, in prior order.
    // Manual and locked places are frozen: later places in the prior order may not
    // be seeded ahead of them.
    let mut working: Vec<WorkingPlace> = Vec::with_capacity(candidates.len());
    let mut frozen: Vec<(DateTime<Utc>, &SequenceCandidate)> = Vec::new();
    for (rank, place) in current.places().iter().enumerate() {
        let Some(&candidate) = latest.get(place.id()) else {
            trace!("{} no longer a candidate, dropping", place.id());
            continue;
        };
        if !candidate.is_in_sequencing_horizon(now) {
            debug!("{} left the sequencing horizon, dropping", place.id());
            continue;
        }

        let scheduled_time = if place.is_manually_assigned {
            place.scheduled_time
        } else {
            frozen
                .iter()
                .map(|(time, leader)| safe_landing_time(*time, leader, candidate, minimum_separation_nm))
                .fold(candidate.preferred_time(), Ord::max)
        };
        if place.is_manually_assigned || candidate.is_in_locked_horizon(now) {
            frozen.push((scheduled_time, candidate));
        }

        working.push(WorkingPlace {
            place: SequencePlace {
                candidate: candidate.clone(),
                scheduled_time,
                is_manually_assigned: place.is_manually_assigned,
            },
            rank,
        });
    }

    let existing: HashSet<&str> = current.ids().collect();
    let mut new_candidates: Vec<&SequenceCandidate> = candidates
        .iter()
        .filter(|c| !existing.contains(c.id()) && c.is_in_sequencing_horizon(now))
        .collect();
    new_candidates.sort_by_key(|c| c.preferred_time());

    let mut rank = current.len();
    for candidate in new_candidates {
        let scheduled_time =
            find_insertion_time(&working, candidate, minimum_separation_nm, now);
        debug!(
            "admitting {} at {} (preferred {})",
            candidate.id(),
            scheduled_time,
            candidate.preferred_time()
        );
        working.push(WorkingPlace {
            place: SequencePlace {
                candidate: candidate.clone(),
                scheduled_time,
                is_manually_assigned: false,
            },
            rank,
        });
        rank += 1;
    }

    working.sort_by(|a, b| {
        a.place
            .scheduled_time
            .cmp(&b.place.scheduled_time)
            .then(a.rank.cmp(&b.rank))
    });

    let mut places: Vec<SequencePlace> = working.into_iter().map(|w| w.place).collect();
    enforce_separation(&mut places, 1, minimum_separation_nm);
    Sequence::new(places)
}

/// Pick a landing time for a newly admitted candidate among the places already placed.
fn find_insertion_time(
    placed: &[WorkingPlace],
    candidate: &SequenceCandidate,
    minimum_separation_nm: f64,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let mut time = candidate.preferred_time();

    // Never overtake a place in the locked horizon
    let last_locked = placed
        .iter()
        .map(|w| &w.place)
        .filter(|p| p.candidate.is_in_locked_horizon(now))
        .max_by_key(|p| p.scheduled_time);
    if let Some(locked) = last_locked
        && time <= locked.scheduled_time
    {
        let after_locked =
            safe_landing_time(locked.scheduled_time, &locked.candidate, candidate, minimum_separation_nm);
        time = time.max(after_locked);
    }
    let floor = time;

    for _ in 0..MAX_INSERTION_ROUNDS {
        // Nearest leader pushes the candidate later
        if let Some(leader) = nearest_leader(placed, time) {
            let earliest =
                safe_landing_time(leader.scheduled_time, &leader.candidate, candidate, minimum_separation_nm);
            if time < earliest {
                time = earliest;
                continue;
            }
        }

        // Nearest unlocked follower pulls the candidate earlier, if that still fits
        if let Some(follower) = nearest_follower(placed, time)
            && !follower.candidate.is_in_locked_horizon(now)
        {
            let gap = super::required_gap(candidate, &follower.candidate, minimum_separation_nm);
            let latest = follower.scheduled_time - gap;
            if latest < time && latest >= floor {
                let fits_leader = nearest_leader(placed, latest).is_none_or(|leader| {
                    latest
                        >= safe_landing_time(
                            leader.scheduled_time,
                            &leader.candidate,
                            candidate,
                            minimum_separation_nm,
                        )
                });
                if fits_leader {
                    time = latest;
                }
            }
        }
        break;
    }

    time
}

fn nearest_leader(placed: &[WorkingPlace], time: DateTime<Utc>) -> Option<&SequencePlace> {
    placed
        .iter()
        .map(|w| &w.place)
        .filter(|p| p.scheduled_time <= time)
        .max_by(|a, b| a.scheduled_time.cmp(&b.scheduled_time))
}

fn nearest_follower(placed: &[WorkingPlace], time: DateTime<Utc>) -> Option<&SequencePlace> {
    placed
        .iter()
        .map(|w| &w.place)
        .filter(|p| p.scheduled_time > time)
        .min_by_key(|p| p.scheduled_time)
}

/// Forward sweep from `start`: push each follower that is too close to its leader.
///
/// Manual places move to exactly the minimum time, auto places to the later of the
/// minimum time and their own preferred time.
fn enforce_separation(places: &mut [SequencePlace], start: usize, minimum_separation_nm: f64) {
    for i in start.max(1)..places.len() {
        let (before, after) = places.split_at_mut(i);
        let leader = &before[i - 1];
        let follower = &mut after[0];

        let minimum =
            safe_landing_time(leader.scheduled_time, &leader.candidate, &follower.candidate, minimum_separation_nm);
        if follower.scheduled_time < minimum {
            let adjusted = if follower.is_manually_assigned {
                minimum
            } else {
                minimum.max(follower.candidate.preferred_time())
            };
            trace!(
                "moving {} from {} to {} behind {}",
                follower.id(),
                follower.scheduled_time,
                adjusted,
                leader.id()
            );
            follower.scheduled_time = adjusted;
        }
    }
}

/// Manually move one place to `requested_time`.
///
/// The time is clamped behind the new leader if needed, the place is marked manually
/// assigned, and every later place is swept for separation.
pub fn suggest_scheduled_time(
    current: &Sequence,
    id: &str,
    requested_time: DateTime<Utc>,
    minimum_separation_nm: f64,
) -> Sequence {
    let Some(index) = current.position(id) else {
        return current.clone();
    };

    let mut places = current.places().to_vec();
    let moved = places.remove(index);

    let insert_at = places
        .iter()
        .position(|p| p.scheduled_time > requested_time)
        .unwrap_or(places.len());

    let mut scheduled_time = requested_time;
    if let Some(leader) = insert_at.checked_sub(1).map(|i| &places[i]) {
        let minimum =
            safe_landing_time(leader.scheduled_time, &leader.candidate, &moved.candidate, minimum_separation_nm);
        scheduled_time = scheduled_time.max(minimum);
    }

    places.insert(
        insert_at,
        SequencePlace {
            scheduled_time,
            is_manually_assigned: true,
            ..moved
        },
    );

    enforce_separation(&mut places, insert_at + 1, minimum_separation_nm);
    Sequence::new(places)
}

/// Preview whether `id` could land at `requested_time` behind whichever place would lead it.
///
/// Only the would-be leader is checked; followers are ignored.
pub fn is_time_slot_available(
    current: &Sequence,
    id: &str,
    requested_time: DateTime<Utc>,
    minimum_separation_nm: f64,
) -> bool {
    let Some(subject) = current.get(id) else {
        return false;
    };

    let leader = current
        .places()
        .iter()
        .filter(|p| p.scheduled_time <= requested_time)
        .fold(None::<&SequencePlace>, |best, p| match best {
            Some(b) if b.scheduled_time >= p.scheduled_time => Some(b),
            _ => Some(p),
        });

    match leader {
        None => true,
        Some(leader) if leader.id() == id => true,
        Some(leader) => {
            requested_time
                >= safe_landing_time(
                    leader.scheduled_time,
                    &leader.candidate,
                    &subject.candidate,
                    minimum_separation_nm,
                )
        }
    }
}

/// Remove the named places
pub fn remove_from_sequence<S: AsRef<str>>(current: &Sequence, ids: &[S]) -> Sequence {
    let removed: HashSet<&str> = ids.iter().map(AsRef::as_ref).collect();
    Sequence::new(
        current
            .places()
            .iter()
            .filter(|p| !removed.contains(p.id()))
            .cloned()
            .collect(),
    )
}

/// Clear the whole sequence, or drop a single place so it is re-sequenced from scratch
pub fn reschedule(current: &Sequence, id: Option<&str>) -> Sequence {
    match id {
        None => Sequence::default(),
        Some(id) => remove_from_sequence(current, &[id]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::performance::WakeCategory;
    use crate::sequence::{AircraftCandidate, required_gap};
    use chrono::{TimeDelta, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn aircraft(callsign: &str, preferred_time: DateTime<Utc>, wake: WakeCategory) -> SequenceCandidate {
        SequenceCandidate::Aircraft(AircraftCandidate {
            callsign: callsign.to_string(),
            preferred_time,
            landing_ias_kts: 150,
            wake_category: wake,
            assigned_runway: Some("19L".to_string()),
        })
    }

    fn candidate(callsign: &str, minutes: i64, wake: WakeCategory) -> SequenceCandidate {
        aircraft(callsign, now() + TimeDelta::minutes(minutes), wake)
    }

    fn assert_separated(sequence: &Sequence) {
        for pair in sequence.places().windows(2) {
            let gap = pair[1].scheduled_time - pair[0].scheduled_time;
            let required = required_gap(&pair[0].candidate, &pair[1].candidate, 3.0);
            assert!(
                gap >= required,
                "{} -> {} gap {:?} < {:?}",
                pair[0].id(),
                pair[1].id(),
                gap,
                required
            );
        }
    }

    #[test]
    fn test_unconflicted_candidate_keeps_preferred_time() {
        let c = candidate("SAS123", 25, WakeCategory::Medium);
        let sequence = update_sequence(&Sequence::default(), &[c.clone()], 3.0, now());
        assert_eq!(sequence.len(), 1);
        assert_eq!(sequence.scheduled_time("SAS123"), Some(c.preferred_time()));
    }

    #[test]
    fn test_candidate_outside_horizon_is_not_admitted() {
        let far = candidate("FAR1", 35, WakeCategory::Medium);
        let edge = candidate("EDGE1", 30, WakeCategory::Medium);
        let sequence = update_sequence(&Sequence::default(), &[far, edge], 3.0, now());
        assert!(!sequence.contains("FAR1"));
        assert!(sequence.contains("EDGE1"));
    }

    #[test]
    fn test_relaxation_back_to_preferred() {
        let heavy = candidate("HVY1", 20, WakeCategory::Heavy);
        let medium = aircraft(
            "MED1",
            heavy.preferred_time() + TimeDelta::seconds(30),
            WakeCategory::Medium,
        );

        let first = update_sequence(&Sequence::default(), &[heavy.clone(), medium.clone()], 3.0, now());
        assert_eq!(
            first.scheduled_time("MED1"),
            Some(heavy.preferred_time() + TimeDelta::seconds(120))
        );

        // The heavy leaves; the medium drifts back to its preferred time
        let second = update_sequence(&first, &[medium.clone()], 3.0, now());
        assert_eq!(second.scheduled_time("MED1"), Some(medium.preferred_time()));
    }

    #[test]
    fn test_sweep_keeps_order_and_spacing() {
        let candidates = vec![
            candidate("A", 15, WakeCategory::Heavy),
            candidate("B", 15, WakeCategory::Medium),
            candidate("C", 15, WakeCategory::Light),
            candidate("D", 16, WakeCategory::Medium),
        ];
        let sequence = update_sequence(&Sequence::default(), &candidates, 3.0, now());
        assert_eq!(sequence.len(), 4);
        assert_separated(&sequence);
    }

    #[test]
    fn test_suggest_unknown_id_is_noop() {
        let sequence = update_sequence(
            &Sequence::default(),
            &[candidate("A", 15, WakeCategory::Medium)],
            3.0,
            now(),
        );
        let moved = suggest_scheduled_time(&sequence, "NOPE", now(), 3.0);
        assert_eq!(moved, sequence);
        assert!(!is_time_slot_available(&sequence, "NOPE", now(), 3.0));
    }

    #[test]
    fn test_reschedule() {
        let sequence = update_sequence(
            &Sequence::default(),
            &[
                candidate("A", 15, WakeCategory::Medium),
                candidate("B", 20, WakeCategory::Medium),
            ],
            3.0,
            now(),
        );
        assert!(reschedule(&sequence, None).is_empty());

        let without_a = reschedule(&sequence, Some("A"));
        assert_eq!(without_a.ids().collect::<Vec<_>>(), vec!["B"]);

        assert_eq!(reschedule(&sequence, Some("ZZZ")), sequence);
    }

    #[test]
    fn test_remove_from_sequence() {
        let sequence = update_sequence(
            &Sequence::default(),
            &[
                candidate("A", 15, WakeCategory::Medium),
                candidate("B", 20, WakeCategory::Medium),
                candidate("C", 25, WakeCategory::Medium),
            ],
            3.0,
            now(),
        );
        let remaining = remove_from_sequence(&sequence, &["A", "C"]);
        assert_eq!(remaining.ids().collect::<Vec<_>>(), vec!["B"]);
        // Input is untouched
        assert_eq!(sequence.len(), 3);
    }
}
