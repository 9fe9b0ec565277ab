//! Error types for fixline-engine.

use thiserror::Error;

use fixline_core::{CoreError, JobId, PaymentId};
use fixline_matcher::MatchError;
use fixline_pricing::PricingError;
use fixline_registry::RegistryError;
use fixline_settlement::SettlementError;

/// Errors surfaced by the dispatch orchestrator.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No job under this ID.
    #[error("job not found: {0}")]
    JobNotFound(JobId),

    /// The gateway reported a failed capture. The job stays `completed`
    /// unsettled; settlement is retried on the next capture signal.
    #[error("payment capture failed for job {job_id}, payment {payment_id}")]
    PaymentCaptureFailed {
        /// The job the capture was for.
        job_id: JobId,
        /// The failed capture.
        payment_id: PaymentId,
    },

    /// A state transition the job's status machine does not permit.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Pricing failed; the job was not created.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Registry failure.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Matching failure other than the ones handled internally.
    #[error(transparent)]
    Match(#[from] MatchError),

    /// Settlement failure; no transaction was recorded.
    #[error(transparent)]
    Settlement(#[from] SettlementError),
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, DispatchError>;
