//! Error types for fixline-core.

use thiserror::Error;

use crate::job::JobStatus;

/// Errors produced by the shared domain model.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The job state machine does not permit this move.
    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition {
        /// The current state.
        from: JobStatus,
        /// The attempted target state.
        to: JobStatus,
    },
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, CoreError>;
