use thiserror::Error;

pub type TrajectoryResult<T> = std::result::Result<T, TrajectoryError>;

/// Reasons a single aircraft cannot be given a descent trajectory this cycle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrajectoryError {
    #[error("no performance data for aircraft type {0}")]
    UnknownAircraftType(String),

    #[error("no runway assigned")]
    NoAssignedRunway,

    #[error("runway {runway} not found at {airport}")]
    UnknownRunway { airport: String, runway: String },

    #[error("aircraft has landed")]
    HasLanded,

    #[error("trajectory is empty, route already flown")]
    EmptyTrajectory,
}
