//! AMAN - arrival manager library
//!
//! Predicts each arriving aircraft's descent to its runway threshold, sequences
//! the predicted landings with wake-turbulence separation, and publishes the
//! resulting arrival events per airport.

pub mod arrivals;
pub mod config;
pub mod log_format;
pub mod navdata;
pub mod navigation;
pub mod orchestrator;
pub mod performance;
pub mod planner;
pub mod sequence;
pub mod speed;
pub mod trajectory;
pub mod weather;

pub use arrivals::{ArrivalSnapshot, NonSequencedEvent, NonSequencedReason, RunwayArrivalEvent, SequenceStatus};
pub use config::{AmanConfig, PlannerSettings};
pub use orchestrator::{ArrivalListener, ArrivalOrchestrator, ChannelListener, PlannerUpdate};
pub use planner::ArrivalPlanner;
pub use sequence::{Sequence, SequenceCandidate, SequencePlace};
pub use trajectory::{TrajectoryError, TrajectoryPoint};
