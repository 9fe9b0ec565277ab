//! Error types for fixline-settlement.

use fixline_core::{JobId, Money, PaymentId};
use thiserror::Error;

use crate::split::PaymentMethod;

/// Errors that can occur while settling a payment.
#[derive(Debug, Error)]
pub enum SettlementError {
    /// The fee schedule has no entry for the payment method. This is a
    /// configuration problem, surfaced to operators rather than retried.
    #[error("no gateway fee configured for payment method {0}")]
    UnknownPaymentMethod(PaymentMethod),

    /// The captured gross amount is zero or negative.
    #[error("invalid gross amount {gross} for job {job_id}")]
    InvalidAmount {
        /// The offending amount.
        gross: Money,
        /// The job the capture was for.
        job_id: JobId,
    },

    /// No transaction recorded under this key.
    #[error("no transaction for job {job_id} and payment {payment_id}")]
    TransactionNotFound {
        /// The job queried.
        job_id: JobId,
        /// The external payment capture queried.
        payment_id: PaymentId,
    },
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, SettlementError>;
