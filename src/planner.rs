//! Multi-airport front door: one orchestrator per tracked airport.
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::arrivals::{ArrivalSnapshot, RunwayArrivalEvent};
use crate::config::PlannerSettings;
use crate::navdata::Airport;
use crate::orchestrator::{ArrivalListener, ArrivalOrchestrator};
use crate::performance::PerformanceCatalog;

struct TrackedAirport {
    orchestrator: Arc<ArrivalOrchestrator>,
    cleanup: Option<JoinHandle<()>>,
}

/// Routes arrival batches to the orchestrator of their airport
pub struct ArrivalPlanner {
    catalog: Arc<PerformanceCatalog>,
    settings: PlannerSettings,
    listeners: Vec<Arc<dyn ArrivalListener>>,
    airports: DashMap<String, TrackedAirport>,
}

impl ArrivalPlanner {
    pub fn new(
        catalog: Arc<PerformanceCatalog>,
        settings: PlannerSettings,
        listeners: Vec<Arc<dyn ArrivalListener>>,
    ) -> Self {
        Self {
            catalog,
            settings,
            listeners,
            airports: DashMap::new(),
        }
    }

    /// Start planning arrivals for an airport.
    ///
    /// Tracking an airport twice keeps the existing orchestrator. The stale
    /// cleanup task is only spawned when `with_cleanup` is set, which requires
    /// a running tokio runtime.
    pub async fn start_tracking(
        &self,
        airport: Airport,
        with_cleanup: bool,
    ) -> Arc<ArrivalOrchestrator> {
        let icao = airport.icao.to_uppercase();
        if let Some(existing) = self.airports.get(&icao) {
            warn!("Already tracking {}", icao);
            return Arc::clone(&existing.orchestrator);
        }

        let orchestrator = Arc::new(ArrivalOrchestrator::new(
            Arc::new(airport),
            Arc::clone(&self.catalog),
            self.settings.default_minimum_spacing_nm,
            self.listeners.clone(),
        ));
        orchestrator.start().await;

        let cleanup = with_cleanup.then(|| {
            orchestrator.start_stale_cleanup(
                Duration::from_secs(self.settings.cleanup_interval_secs),
                TimeDelta::seconds(self.settings.stale_arrival_secs as i64),
            )
        });

        self.airports.insert(
            icao.clone(),
            TrackedAirport {
                orchestrator: Arc::clone(&orchestrator),
                cleanup,
            },
        );
        info!("Started tracking {}", icao);
        orchestrator
    }

    /// Stop planning an airport and cancel its cleanup task
    pub fn stop_tracking(&self, icao: &str) -> bool {
        match self.airports.remove(&icao.to_uppercase()) {
            Some((icao, tracked)) => {
                if let Some(cleanup) = tracked.cleanup {
                    cleanup.abort();
                }
                info!("Stopped tracking {}", icao);
                true
            }
            None => false,
        }
    }

    pub fn orchestrator(&self, icao: &str) -> Option<Arc<ArrivalOrchestrator>> {
        self.airports
            .get(&icao.to_uppercase())
            .map(|tracked| Arc::clone(&tracked.orchestrator))
    }

    pub fn tracked_airports(&self) -> Vec<String> {
        let mut airports: Vec<String> = self.airports.iter().map(|e| e.key().clone()).collect();
        airports.sort();
        airports
    }

    /// Feed a batch of snapshots to the airport's orchestrator.
    ///
    /// Returns `None` when the airport is not tracked.
    pub async fn handle_arrivals(
        &self,
        icao: &str,
        snapshots: &[ArrivalSnapshot],
        now: DateTime<Utc>,
    ) -> Option<Vec<RunwayArrivalEvent>> {
        let Some(orchestrator) = self.orchestrator(icao) else {
            warn!("Received arrivals for untracked airport {}", icao);
            return None;
        };
        Some(orchestrator.handle_arrivals(snapshots, now).await)
    }
}

impl Drop for ArrivalPlanner {
    fn drop(&mut self) {
        for entry in self.airports.iter() {
            if let Some(cleanup) = &entry.value().cleanup {
                cleanup.abort();
            }
        }
    }
}
