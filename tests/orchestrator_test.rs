//! Per-airport planning cycles through the orchestrator and planner.
mod common;

use std::sync::Arc;
use std::time::Duration;

use aman::arrivals::{NonSequencedReason, RunwayArrivalEvent, SequenceStatus};
use aman::config::PlannerSettings;
use aman::navigation::{AircraftPosition, LatLng};
use aman::orchestrator::{ArrivalListener, ArrivalOrchestrator, ChannelListener, PlannerUpdate};
use aman::performance::WakeCategory;
use aman::planner::ArrivalPlanner;
use aman::weather::{VerticalWeatherProfile, WeatherLayer, WindVector};
use chrono::TimeDelta;
use common::{catalog, engm, straight_in, t0};

fn orchestrator(listeners: Vec<Arc<dyn ArrivalListener>>) -> ArrivalOrchestrator {
    ArrivalOrchestrator::new(Arc::new(engm()), Arc::new(catalog()), 3.0, listeners)
}

fn with_channel() -> (ArrivalOrchestrator, flume::Receiver<PlannerUpdate>) {
    let (tx, rx) = flume::bounded(64);
    let listener: Arc<dyn ArrivalListener> = Arc::new(ChannelListener::new(tx));
    (orchestrator(vec![listener]), rx)
}

fn event<'a>(events: &'a [RunwayArrivalEvent], callsign: &str) -> &'a RunwayArrivalEvent {
    events.iter().find(|e| e.callsign == callsign).unwrap()
}

/// Two B738s a mile apart on a straight-in, close enough to need spacing
fn pair() -> Vec<aman::arrivals::ArrivalSnapshot> {
    vec![
        straight_in("LEAD1", "B738", 0.60, 9_000, t0()),
        straight_in("TRAIL2", "B738", 0.62, 9_000, t0()),
    ]
}

#[tokio::test]
async fn test_cycle_publishes_sequenced_events_in_landing_order() {
    let orchestrator = orchestrator(Vec::new());
    let events = orchestrator.handle_arrivals(&pair(), t0()).await;

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].callsign, "LEAD1");
    assert_eq!(events[1].callsign, "TRAIL2");
    assert!(events.iter().all(|e| e.sequence_status == SequenceStatus::Ok));

    let lead = &events[0];
    let trail = &events[1];
    assert_eq!(lead.scheduled_time, lead.estimated_time);
    assert_eq!(lead.distance_to_preceding_nm, None);
    assert_eq!(lead.time_to_preceding_secs, None);

    // 3 NM at 147 kt
    assert!(trail.scheduled_time - lead.scheduled_time >= TimeDelta::milliseconds(73_469));
    assert!(trail.delay() > TimeDelta::zero());

    let distance = trail.distance_to_preceding_nm.unwrap();
    assert!((distance - (trail.remaining_distance_nm - lead.remaining_distance_nm)).abs() < 1e-9);
    assert!(distance > 1.0 && distance < 1.5);
    assert_eq!(
        trail.time_to_preceding_secs,
        Some((trail.estimated_time - lead.estimated_time).num_seconds())
    );

    assert_eq!(orchestrator.arrival_events().await, events);
    assert_eq!(orchestrator.sequence().await.len(), 2);
}

#[tokio::test]
async fn test_estimate_matches_descent_profile() {
    let orchestrator = orchestrator(Vec::new());
    let events = orchestrator.handle_arrivals(&pair(), t0()).await;

    let profile = orchestrator.descent_profile("LEAD1").unwrap();
    let lead = event(&events, "LEAD1");
    assert_eq!(t0() + profile[0].remaining_time(), lead.estimated_time);
    assert_eq!(profile[0].remaining_distance_nm, lead.remaining_distance_nm);
    assert!(orchestrator.descent_profile("NOBODY").is_none());
}

#[tokio::test]
async fn test_failures_are_reported_not_sequenced() {
    let orchestrator = orchestrator(Vec::new());

    let unknown_type = straight_in("CESSNA1", "C172", 0.3, 3_000, t0());

    let mut no_runway = straight_in("NORWY", "B738", 0.5, 8_000, t0());
    no_runway.assigned_runway = None;

    let mut unknown_runway = straight_in("BADRWY", "B738", 0.5, 8_000, t0());
    unknown_runway.assigned_runway = Some("01L".to_string());

    // Rolling out just past the threshold
    let mut landed = straight_in("LANDED", "B738", 0.0, 681, t0());
    landed.position = AircraftPosition {
        position: LatLng::new(60.18, 11.115),
        altitude_ft: 681,
        groundspeed_kts: 90,
        track_deg: 194,
    };

    let good = straight_in("GOOD1", "A320", 0.6, 9_000, t0());

    let events = orchestrator
        .handle_arrivals(&[unknown_type, no_runway, unknown_runway, landed, good], t0())
        .await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].callsign, "GOOD1");

    let non_sequenced = orchestrator.non_sequenced().await;
    let reasons: Vec<(&str, NonSequencedReason)> = non_sequenced
        .iter()
        .map(|e| (e.callsign.as_str(), e.reason))
        .collect();
    assert_eq!(
        reasons,
        vec![
            ("CESSNA1", NonSequencedReason::MissingPerformanceData),
            ("NORWY", NonSequencedReason::NoAssignedRunway),
            ("BADRWY", NonSequencedReason::UnknownRunway),
        ]
    );
    assert_eq!(non_sequenced[0].wake_category, None);
    assert_eq!(non_sequenced[1].wake_category, Some(WakeCategory::Medium));

    assert!(orchestrator.descent_profile("LANDED").is_none());
    assert_eq!(orchestrator.sequence().await.len(), 1);
}

#[tokio::test]
async fn test_departed_aircraft_leave_sequence_and_profiles() {
    let orchestrator = orchestrator(Vec::new());
    orchestrator.handle_arrivals(&pair(), t0()).await;

    let later = t0() + TimeDelta::seconds(5);
    let remaining = vec![straight_in("TRAIL2", "B738", 0.60, 9_000, later)];
    let events = orchestrator.handle_arrivals(&remaining, later).await;

    assert_eq!(events.len(), 1);
    let sequence = orchestrator.sequence().await;
    assert_eq!(sequence.ids().collect::<Vec<_>>(), vec!["TRAIL2"]);
    // No longer held behind the departed leader
    assert_eq!(events[0].scheduled_time, events[0].estimated_time);
    assert!(orchestrator.descent_profile("LEAD1").is_none());
    assert!(orchestrator.descent_profile("TRAIL2").is_some());
}

#[tokio::test]
async fn test_minimum_spacing_change_resequences() {
    let (orchestrator, rx) = with_channel();
    orchestrator.handle_arrivals(&pair(), t0()).await;
    rx.drain().for_each(drop);

    orchestrator.set_minimum_spacing(10.0).await.unwrap();
    assert_eq!(orchestrator.minimum_spacing_nm().await, 10.0);
    assert!(orchestrator.sequence().await.is_empty());
    assert!(
        orchestrator
            .arrival_events()
            .await
            .iter()
            .all(|e| e.sequence_status == SequenceStatus::AwaitingForSequence)
    );

    let updates: Vec<PlannerUpdate> = rx.drain().collect();
    assert!(updates.contains(&PlannerUpdate::MinimumSpacing {
        airport_icao: "ENGM".to_string(),
        minimum_spacing_nm: 10.0,
    }));

    let events = orchestrator.handle_arrivals(&pair(), t0()).await;
    // 10 NM at 147 kt
    assert!(events[1].scheduled_time - events[0].scheduled_time >= TimeDelta::milliseconds(244_898));

    assert!(orchestrator.set_minimum_spacing(0.0).await.is_err());
    assert!(orchestrator.set_minimum_spacing(f64::NAN).await.is_err());
    assert_eq!(orchestrator.minimum_spacing_nm().await, 10.0);
}

#[tokio::test]
async fn test_manual_override_requires_free_slot() {
    let orchestrator = orchestrator(Vec::new());
    let events = orchestrator.handle_arrivals(&pair(), t0()).await;
    let lead_time = event(&events, "LEAD1").scheduled_time;

    // Too close behind the leader
    let squeezed = lead_time + TimeDelta::seconds(10);
    assert!(!orchestrator.is_time_slot_available("TRAIL2", squeezed).await);
    assert!(!orchestrator.suggest_scheduled_time("TRAIL2", squeezed).await);
    assert_eq!(orchestrator.arrival_events().await, events);

    let later = lead_time + TimeDelta::minutes(10);
    assert!(orchestrator.suggest_scheduled_time("TRAIL2", later).await);

    let events = orchestrator.arrival_events().await;
    assert_eq!(event(&events, "TRAIL2").scheduled_time, later);
    assert!(orchestrator.sequence().await.get("TRAIL2").unwrap().is_manually_assigned);

    // The manual time survives the next refresh
    let events = orchestrator.handle_arrivals(&pair(), t0()).await;
    assert_eq!(event(&events, "TRAIL2").scheduled_time, later);

    // Until it is released
    orchestrator.reschedule(Some("TRAIL2")).await;
    let events = orchestrator.arrival_events().await;
    assert_eq!(
        event(&events, "TRAIL2").sequence_status,
        SequenceStatus::AwaitingForSequence
    );
    let events = orchestrator.handle_arrivals(&pair(), t0()).await;
    assert!(event(&events, "TRAIL2").scheduled_time < later);
}

#[tokio::test]
async fn test_stale_arrivals_are_dropped() {
    let (orchestrator, rx) = with_channel();
    orchestrator.handle_arrivals(&pair(), t0()).await;
    rx.drain().for_each(drop);

    let max_age = TimeDelta::seconds(5);
    assert_eq!(orchestrator.remove_stale_arrivals(t0() + TimeDelta::seconds(3), max_age).await, 0);
    assert_eq!(orchestrator.arrival_events().await.len(), 2);
    // Nothing changed, nothing republished
    assert!(rx.is_empty());

    assert_eq!(orchestrator.remove_stale_arrivals(t0() + TimeDelta::seconds(10), max_age).await, 2);
    assert!(orchestrator.arrival_events().await.is_empty());
    assert!(rx.drain().any(|update| matches!(
        update,
        PlannerUpdate::ArrivalEvents { ref events, .. } if events.is_empty()
    )));
    // The sequence is cleaned up by the next refresh, not by the stale sweep
    assert_eq!(orchestrator.sequence().await.len(), 2);
}

#[tokio::test]
async fn test_background_cleanup_drops_old_snapshots() {
    let orchestrator = orchestrator(Vec::new());
    // Snapshots stamped in the past are stale against the wall clock
    orchestrator.handle_arrivals(&pair(), t0()).await;

    let cleanup = orchestrator.start_stale_cleanup(Duration::from_millis(20), TimeDelta::seconds(5));
    tokio::time::sleep(Duration::from_millis(200)).await;
    cleanup.abort();

    assert!(orchestrator.arrival_events().await.is_empty());
}

#[tokio::test]
async fn test_listener_receives_every_update() {
    let (orchestrator, rx) = with_channel();

    orchestrator.start().await;
    assert_eq!(
        rx.try_recv().unwrap(),
        PlannerUpdate::MinimumSpacing {
            airport_icao: "ENGM".to_string(),
            minimum_spacing_nm: 3.0,
        }
    );

    let weather = VerticalWeatherProfile {
        time: t0(),
        position: engm().location,
        layers: vec![WeatherLayer {
            flight_level_ft: 5_000,
            temperature_c: 5,
            wind: WindVector {
                direction_deg: 200,
                speed_kts: 25,
            },
        }],
    };
    orchestrator.update_weather(Some(weather.clone())).await;
    assert_eq!(
        rx.try_recv().unwrap(),
        PlannerUpdate::Weather {
            airport_icao: "ENGM".to_string(),
            weather: Some(weather),
        }
    );

    let events = orchestrator.handle_arrivals(&pair(), t0()).await;
    assert_eq!(
        rx.try_recv().unwrap(),
        PlannerUpdate::ArrivalEvents {
            airport_icao: "ENGM".to_string(),
            events,
        }
    );
    assert_eq!(
        rx.try_recv().unwrap(),
        PlannerUpdate::NonSequenced {
            airport_icao: "ENGM".to_string(),
            events: Vec::new(),
        }
    );
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_full_channel_does_not_block_planning() {
    let (tx, rx) = flume::bounded(1);
    let listener: Arc<dyn ArrivalListener> = Arc::new(ChannelListener::new(tx));
    let orchestrator = orchestrator(vec![listener]);

    let events = orchestrator.handle_arrivals(&pair(), t0()).await;
    assert_eq!(events.len(), 2);
    assert_eq!(rx.len(), 1);

    drop(rx);
    orchestrator.handle_arrivals(&pair(), t0()).await;
}

#[tokio::test]
async fn test_recorded_arrivals_are_separated() {
    let orchestrator = orchestrator(Vec::new());
    let snapshots = vec![
        common::sas4411(t0()),
        common::ezy9(t0()),
        common::srr22x(t0()),
    ];
    let events = orchestrator.handle_arrivals(&snapshots, t0()).await;

    assert_eq!(events.len(), 3);
    assert!(events.windows(2).all(|w| w[0].scheduled_time <= w[1].scheduled_time));
    assert_eq!(event(&events, "SRR22X").wake_category, WakeCategory::Heavy);
    assert_eq!(event(&events, "SRR22X").tracking_controller.as_deref(), Some("GWR"));

    let sequence = orchestrator.sequence().await;
    for w in sequence.places().windows(2) {
        let required = aman::sequence::required_gap(&w[0].candidate, &w[1].candidate, 3.0);
        assert!(w[1].scheduled_time - w[0].scheduled_time >= required);
    }
}

#[tokio::test]
async fn test_planner_dispatches_by_airport() {
    let planner = ArrivalPlanner::new(Arc::new(catalog()), PlannerSettings::default(), Vec::new());
    planner.start_tracking(engm(), false).await;
    assert_eq!(planner.tracked_airports(), vec!["ENGM".to_string()]);

    let events = planner.handle_arrivals("engm", &pair(), t0()).await.unwrap();
    assert_eq!(events.len(), 2);
    assert!(planner.handle_arrivals("ESSA", &pair(), t0()).await.is_none());

    // Tracking again keeps the existing state
    let again = planner.start_tracking(engm(), false).await;
    assert_eq!(again.sequence().await.len(), 2);

    assert!(planner.stop_tracking("ENGM"));
    assert!(planner.orchestrator("ENGM").is_none());
    assert!(!planner.stop_tracking("ENGM"));
}
