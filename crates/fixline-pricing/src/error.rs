//! Error types for fixline-pricing.

use fixline_core::JobCategory;
use thiserror::Error;

/// Errors that can occur while computing a quote.
#[derive(Debug, Error)]
pub enum PricingError {
    /// The rate table has no entry for the category. This is a
    /// configuration problem, not a caller problem.
    #[error("no rate configured for category {0}")]
    UnknownCategory(JobCategory),

    /// A request field is missing or out of range.
    #[error("invalid pricing input: {message}")]
    InvalidInput {
        /// What was wrong with the input.
        message: String,
    },
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, PricingError>;
