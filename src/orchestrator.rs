//! Per-airport arrival planning loop.
//!
//! Each [`ArrivalOrchestrator`] owns one airport's sequence, arrival-event cache,
//! minimum spacing and weather. Every state transition (a data refresh, a manual
//! override, a spacing change, stale cleanup) runs under the same mutex, and
//! listeners are notified before the lock is released.
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, trace, warn};

use crate::arrivals::{
    ArrivalSnapshot, NonSequencedEvent, NonSequencedReason, RunwayArrivalEvent, SequenceStatus,
    create_arrival_event,
};
use crate::navdata::Airport;
use crate::performance::PerformanceCatalog;
use crate::sequence::{self, Sequence, SequenceCandidate};
use crate::trajectory::{TrajectoryError, TrajectoryPoint};
use crate::weather::VerticalWeatherProfile;

/// Default minimum spacing between arrivals in nautical miles
pub const DEFAULT_MINIMUM_SPACING_NM: f64 = 3.0;

/// Receives planner output for one or more airports.
///
/// Callbacks run while the airport's state is locked and must not block.
pub trait ArrivalListener: Send + Sync {
    fn on_arrival_events_updated(&self, airport_icao: &str, events: &[RunwayArrivalEvent]);

    fn on_non_sequenced_updated(&self, _airport_icao: &str, _events: &[NonSequencedEvent]) {}

    fn on_minimum_spacing_updated(&self, _airport_icao: &str, _minimum_spacing_nm: f64) {}

    fn on_weather_updated(&self, _airport_icao: &str, _weather: Option<&VerticalWeatherProfile>) {}
}

/// Listener callbacks as messages
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlannerUpdate {
    ArrivalEvents {
        airport_icao: String,
        events: Vec<RunwayArrivalEvent>,
    },
    NonSequenced {
        airport_icao: String,
        events: Vec<NonSequencedEvent>,
    },
    MinimumSpacing {
        airport_icao: String,
        minimum_spacing_nm: f64,
    },
    Weather {
        airport_icao: String,
        weather: Option<VerticalWeatherProfile>,
    },
}

/// Forwards listener callbacks into a flume channel without blocking
pub struct ChannelListener {
    tx: flume::Sender<PlannerUpdate>,
}

impl ChannelListener {
    pub fn new(tx: flume::Sender<PlannerUpdate>) -> Self {
        Self { tx }
    }

    fn forward(&self, update: PlannerUpdate) {
        match self.tx.try_send(update) {
            Ok(()) => {}
            Err(flume::TrySendError::Full(_)) => {
                warn!("Planner update channel full, dropping update");
                metrics::counter!("aman.listener.dropped_total").increment(1);
            }
            Err(flume::TrySendError::Disconnected(_)) => {
                trace!("Planner update channel closed");
            }
        }
    }
}

impl ArrivalListener for ChannelListener {
    fn on_arrival_events_updated(&self, airport_icao: &str, events: &[RunwayArrivalEvent]) {
        self.forward(PlannerUpdate::ArrivalEvents {
            airport_icao: airport_icao.to_string(),
            events: events.to_vec(),
        });
    }

    fn on_non_sequenced_updated(&self, airport_icao: &str, events: &[NonSequencedEvent]) {
        self.forward(PlannerUpdate::NonSequenced {
            airport_icao: airport_icao.to_string(),
            events: events.to_vec(),
        });
    }

    fn on_minimum_spacing_updated(&self, airport_icao: &str, minimum_spacing_nm: f64) {
        self.forward(PlannerUpdate::MinimumSpacing {
            airport_icao: airport_icao.to_string(),
            minimum_spacing_nm,
        });
    }

    fn on_weather_updated(&self, airport_icao: &str, weather: Option<&VerticalWeatherProfile>) {
        self.forward(PlannerUpdate::Weather {
            airport_icao: airport_icao.to_string(),
            weather: weather.cloned(),
        });
    }
}

/// Everything one airport's planner mutates
#[derive(Debug, Clone)]
struct PlannerState {
    arrivals: Vec<RunwayArrivalEvent>,
    sequence: Sequence,
    minimum_spacing_nm: f64,
    weather: Option<VerticalWeatherProfile>,
    non_sequenced: Vec<NonSequencedEvent>,
}

/// Per-airport planner: predicts, sequences and publishes arrivals
pub struct ArrivalOrchestrator {
    airport: Arc<Airport>,
    catalog: Arc<PerformanceCatalog>,
    state: Arc<Mutex<PlannerState>>,
    // Latest descent profile per callsign, readable without taking the state lock
    descent_profiles: Arc<DashMap<String, Vec<TrajectoryPoint>>>,
    listeners: Arc<Vec<Arc<dyn ArrivalListener>>>,
}

impl Clone for ArrivalOrchestrator {
    fn clone(&self) -> Self {
        Self {
            airport: Arc::clone(&self.airport),
            catalog: Arc::clone(&self.catalog),
            state: Arc::clone(&self.state),
            descent_profiles: Arc::clone(&self.descent_profiles),
            listeners: Arc::clone(&self.listeners),
        }
    }
}

impl ArrivalOrchestrator {
    pub fn new(
        airport: Arc<Airport>,
        catalog: Arc<PerformanceCatalog>,
        minimum_spacing_nm: f64,
        listeners: Vec<Arc<dyn ArrivalListener>>,
    ) -> Self {
        Self {
            airport,
            catalog,
            state: Arc::new(Mutex::new(PlannerState {
                arrivals: Vec::new(),
                sequence: Sequence::default(),
                minimum_spacing_nm,
                weather: None,
                non_sequenced: Vec::new(),
            })),
            descent_profiles: Arc::new(DashMap::new()),
            listeners: Arc::new(listeners),
        }
    }

    pub fn airport_icao(&self) -> &str {
        &self.airport.icao
    }

    /// Announce the initial minimum spacing to listeners
    pub async fn start(&self) {
        let state = self.state.lock().await;
        for listener in self.listeners.iter() {
            listener.on_minimum_spacing_updated(&self.airport.icao, state.minimum_spacing_nm);
        }
        info!(
            "Tracking arrivals for {} with minimum spacing {} NM",
            self.airport.icao, state.minimum_spacing_nm
        );
    }

    /// Run one planning cycle over a fresh batch of arrival snapshots.
    ///
    /// Returns the published arrival events.
    #[tracing::instrument(skip(self, snapshots), fields(airport = %self.airport.icao, arrivals = snapshots.len()))]
    pub async fn handle_arrivals(
        &self,
        snapshots: &[ArrivalSnapshot],
        now: DateTime<Utc>,
    ) -> Vec<RunwayArrivalEvent> {
        let started = Instant::now();
        let mut state = self.state.lock().await;

        let mut events = Vec::with_capacity(snapshots.len());
        let mut non_sequenced = Vec::new();

        for snapshot in snapshots {
            match create_arrival_event(
                snapshot,
                &self.airport,
                &self.catalog,
                state.weather.as_ref(),
                now,
            ) {
                Ok((event, profile)) => {
                    self.descent_profiles.insert(snapshot.callsign.clone(), profile);
                    events.push(event);
                }
                Err(TrajectoryError::HasLanded) => {
                    debug!("{} has landed, no longer planned", snapshot.callsign);
                    self.descent_profiles.remove(&snapshot.callsign);
                }
                Err(e) => {
                    let reason =
                        NonSequencedReason::from_error(&e).unwrap_or(NonSequencedReason::UnknownError);
                    info!("{} not sequenced: {}", snapshot.callsign, e);
                    metrics::counter!("aman.cycle.non_sequenced_total", "reason" => reason.as_str())
                        .increment(1);
                    self.descent_profiles.remove(&snapshot.callsign);
                    non_sequenced.push(NonSequencedEvent {
                        callsign: snapshot.callsign.clone(),
                        aircraft_type: snapshot.aircraft_type.clone(),
                        wake_category: self
                            .catalog
                            .lookup(&snapshot.aircraft_type)
                            .map(|p| p.wake_category),
                        reason,
                    });
                }
            }
        }

        // Profiles of aircraft no longer reported
        self.descent_profiles
            .retain(|callsign, _| snapshots.iter().any(|s| &s.callsign == callsign));

        let candidates: Vec<SequenceCandidate> =
            events.iter().map(RunwayArrivalEvent::to_candidate).collect();

        let departed: Vec<&str> = state
            .sequence
            .ids()
            .filter(|id| !events.iter().any(|e| e.callsign == *id))
            .collect();
        if !departed.is_empty() {
            debug!("Removing {} from sequence", departed.join(", "));
        }
        let cleaned = sequence::remove_from_sequence(&state.sequence, &departed);
        state.sequence =
            sequence::update_sequence(&cleaned, &candidates, state.minimum_spacing_nm, now);

        state.arrivals = events;
        state.non_sequenced = non_sequenced;

        metrics::counter!("aman.cycle.arrivals_total").increment(snapshots.len() as u64);
        metrics::gauge!("aman.cycle.sequenced").set(state.sequence.len() as f64);

        let published = self.publish(&mut state);

        metrics::histogram!("aman.cycle.duration_ms").record(started.elapsed().as_secs_f64() * 1000.0);
        debug!(
            "Cycle complete: {} events, {} sequenced, {} not sequenced",
            published.len(),
            state.sequence.len(),
            state.non_sequenced.len()
        );
        published
    }

    /// Change the minimum spacing and recompute the whole sequence on the next refresh
    pub async fn set_minimum_spacing(&self, minimum_spacing_nm: f64) -> anyhow::Result<()> {
        if !minimum_spacing_nm.is_finite() || minimum_spacing_nm <= 0.0 {
            anyhow::bail!("minimum spacing must be a positive distance, got {minimum_spacing_nm}");
        }

        let mut state = self.state.lock().await;
        state.minimum_spacing_nm = minimum_spacing_nm;
        state.sequence = sequence::reschedule(&state.sequence, None);
        self.publish(&mut state);

        for listener in self.listeners.iter() {
            listener.on_minimum_spacing_updated(&self.airport.icao, minimum_spacing_nm);
        }
        info!(
            "Minimum spacing for {} set to {} NM",
            self.airport.icao, minimum_spacing_nm
        );
        Ok(())
    }

    /// Replace the weather used by subsequent predictions
    pub async fn update_weather(&self, weather: Option<VerticalWeatherProfile>) {
        let mut state = self.state.lock().await;
        match &weather {
            Some(profile) => info!(
                "Weather for {} updated ({} layers, valid {})",
                self.airport.icao,
                profile.layers.len(),
                profile.time
            ),
            None => warn!(
                "No weather data for {}, using standard atmosphere",
                self.airport.icao
            ),
        }
        state.weather = weather;
        for listener in self.listeners.iter() {
            listener.on_weather_updated(&self.airport.icao, state.weather.as_ref());
        }
    }

    /// Manually move an arrival if the slot is free behind its would-be leader.
    ///
    /// Returns whether the move was applied.
    #[tracing::instrument(skip(self), fields(airport = %self.airport.icao))]
    pub async fn suggest_scheduled_time(&self, callsign: &str, scheduled_time: DateTime<Utc>) -> bool {
        let mut state = self.state.lock().await;
        let minimum = state.minimum_spacing_nm;

        if !sequence::is_time_slot_available(&state.sequence, callsign, scheduled_time, minimum) {
            info!(
                "Time slot is not available for {} at {}",
                callsign, scheduled_time
            );
            return false;
        }

        state.sequence =
            sequence::suggest_scheduled_time(&state.sequence, callsign, scheduled_time, minimum);
        metrics::counter!("aman.sequence.manual_overrides_total").increment(1);
        self.publish(&mut state);
        true
    }

    pub async fn is_time_slot_available(&self, callsign: &str, scheduled_time: DateTime<Utc>) -> bool {
        let state = self.state.lock().await;
        sequence::is_time_slot_available(
            &state.sequence,
            callsign,
            scheduled_time,
            state.minimum_spacing_nm,
        )
    }

    /// Force recalculation of one arrival, or of the whole sequence
    pub async fn reschedule(&self, callsign: Option<&str>) {
        let mut state = self.state.lock().await;
        state.sequence = sequence::reschedule(&state.sequence, callsign);
        match callsign {
            Some(callsign) => info!("Rescheduling {} at {}", callsign, self.airport.icao),
            None => info!("Rescheduling all arrivals at {}", self.airport.icao),
        }
        self.publish(&mut state);
    }

    /// Latest predicted descent profile for a callsign
    pub fn descent_profile(&self, callsign: &str) -> Option<Vec<TrajectoryPoint>> {
        self.descent_profiles
            .get(callsign)
            .map(|entry| entry.value().clone())
    }

    /// Drop cached arrival events not refreshed within `max_age`, then republish.
    ///
    /// Returns the number of events dropped.
    pub async fn remove_stale_arrivals(&self, now: DateTime<Utc>, max_age: TimeDelta) -> usize {
        let cutoff = now - max_age;
        let mut state = self.state.lock().await;

        let before = state.arrivals.len();
        state.arrivals.retain(|event| event.last_timestamp >= cutoff);
        let removed = before - state.arrivals.len();

        if removed > 0 {
            debug!("Dropped {} stale arrivals at {}", removed, self.airport.icao);
            self.publish(&mut state);
        }
        removed
    }

    /// Spawn a background task that drops stale arrivals every `interval`
    pub fn start_stale_cleanup(&self, interval: Duration, max_age: TimeDelta) -> JoinHandle<()> {
        let orchestrator = self.clone();
        let handle = tokio::spawn(
            async move {
                let mut ticker = tokio::time::interval(interval);
                // Skip the first tick (immediate execution)
                ticker.tick().await;

                loop {
                    ticker.tick().await;
                    orchestrator.remove_stale_arrivals(Utc::now(), max_age).await;
                }
            }
            .instrument(tracing::info_span!("stale_arrival_cleanup", airport = %self.airport.icao)),
        );
        info!(
            "Started stale arrival cleanup for {} (every {:?}, max age {}s)",
            self.airport.icao,
            interval,
            max_age.num_seconds()
        );
        handle
    }

    pub async fn sequence(&self) -> Sequence {
        self.state.lock().await.sequence.clone()
    }

    pub async fn arrival_events(&self) -> Vec<RunwayArrivalEvent> {
        self.state.lock().await.arrivals.clone()
    }

    pub async fn non_sequenced(&self) -> Vec<NonSequencedEvent> {
        self.state.lock().await.non_sequenced.clone()
    }

    pub async fn minimum_spacing_nm(&self) -> f64 {
        self.state.lock().await.minimum_spacing_nm
    }

    /// Merge the sequence into the cached events, compute spacing to the preceding
    /// arrival and notify listeners. Events are published earliest first.
    fn publish(&self, state: &mut PlannerState) -> Vec<RunwayArrivalEvent> {
        let mut events: Vec<RunwayArrivalEvent> = state
            .arrivals
            .iter()
            .map(|event| {
                let mut event = event.clone();
                match state.sequence.scheduled_time(&event.callsign) {
                    Some(scheduled) => {
                        event.scheduled_time = scheduled;
                        event.sequence_status = SequenceStatus::Ok;
                    }
                    None => {
                        event.scheduled_time = event.estimated_time;
                        event.sequence_status = SequenceStatus::AwaitingForSequence;
                    }
                }
                event
            })
            .collect();

        // Latest first, so each event's predecessor is the one after it
        events.sort_by(|a, b| b.scheduled_time.cmp(&a.scheduled_time));
        for i in 0..events.len() {
            let preceding = events
                .get(i + 1)
                .map(|b| (b.remaining_distance_nm, b.estimated_time));
            let event = &mut events[i];
            match preceding {
                Some((distance, estimated)) => {
                    event.distance_to_preceding_nm = Some(event.remaining_distance_nm - distance);
                    event.time_to_preceding_secs =
                        Some((event.estimated_time - estimated).num_seconds());
                }
                None => {
                    event.distance_to_preceding_nm = None;
                    event.time_to_preceding_secs = None;
                }
            }
        }
        events.reverse();

        state.arrivals = events.clone();

        for listener in self.listeners.iter() {
            listener.on_arrival_events_updated(&self.airport.icao, &events);
            listener.on_non_sequenced_updated(&self.airport.icao, &state.non_sequenced);
        }
        events
    }
}
