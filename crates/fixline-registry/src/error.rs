//! Error types for fixline-registry.

use fixline_core::WorkerId;
use thiserror::Error;

/// Errors that can occur in registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The worker's open-job count is already at daily capacity.
    /// Transient: the Matcher drops the candidate and moves on.
    #[error("worker {worker_id} is at capacity")]
    CapacityExceeded {
        /// The worker that was full.
        worker_id: WorkerId,
    },

    /// No worker registered under this ID.
    #[error("worker not found: {0}")]
    WorkerNotFound(WorkerId),

    /// A worker with this ID is already registered.
    #[error("worker already registered: {0}")]
    AlreadyRegistered(WorkerId),
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, RegistryError>;
