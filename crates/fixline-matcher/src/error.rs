//! Error types for fixline-matcher.

use thiserror::Error;

/// Errors that can end a matching run.
#[derive(Debug, Error)]
pub enum MatchError {
    /// Every eligible candidate was offered and none accepted. Terminal
    /// for this run; the job is parked for a later re-match.
    #[error("no available worker")]
    NoAvailableWorker,

    /// The job was cancelled while the run was in flight.
    #[error("matching cancelled")]
    Cancelled,

    /// Registry failure other than the transient capacity race.
    #[error(transparent)]
    Registry(#[from] fixline_registry::RegistryError),
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, MatchError>;
