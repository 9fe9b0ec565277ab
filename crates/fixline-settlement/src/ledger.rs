//! The idempotent transaction ledger.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use fixline_core::{JobId, Money, PaymentId};

use crate::error::{Result, SettlementError};
use crate::split::{FeeSchedule, PaymentMethod, split_payment};

/// An immutable record of one settled payment capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// The job the payment was for.
    pub job_id: JobId,
    /// The gateway's capture identifier; the idempotency key together
    /// with the job ID.
    pub payment_id: PaymentId,
    /// How the client paid.
    pub method: PaymentMethod,
    /// Amount the client paid.
    pub gross: Money,
    /// Gateway's cut.
    pub gateway_fee: Money,
    /// Platform's cut.
    pub platform_commission: Money,
    /// Worker's payout.
    pub master_payout: Money,
    /// When the settlement was recorded.
    pub created_at: DateTime<Utc>,
}

/// Settlement store keyed by (job, payment capture).
///
/// A retried capture notification for a key that already settled returns
/// the existing transaction instead of creating a second one; the caller
/// cannot tell the difference, which is the point.
#[derive(Debug, Default)]
pub struct TransactionLedger {
    entries: RwLock<HashMap<(JobId, PaymentId), Transaction>>,
    schedule: FeeSchedule,
}

impl TransactionLedger {
    /// Creates a ledger over the given fee schedule.
    #[must_use]
    pub fn new(schedule: FeeSchedule) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            schedule,
        }
    }

    /// The fee schedule in use.
    #[must_use]
    pub const fn schedule(&self) -> &FeeSchedule {
        &self.schedule
    }

    /// Settles one capture: splits the gross and records the transaction.
    ///
    /// Idempotent per (job, payment): duplicates return the prior record
    /// unchanged, regardless of the amounts in the retried notification.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::InvalidAmount`] or
    /// [`SettlementError::UnknownPaymentMethod`] from the split; in both
    /// cases nothing is recorded.
    pub fn settle(
        &self,
        job_id: &JobId,
        payment_id: &PaymentId,
        gross: Money,
        method: PaymentMethod,
    ) -> Result<Transaction> {
        let key = (job_id.clone(), payment_id.clone());
        let mut entries = self.entries.write();
        if let Some(existing) = entries.get(&key) {
            debug!(job = %job_id, payment = %payment_id, "duplicate capture, returning prior transaction");
            return Ok(existing.clone());
        }

        let split = split_payment(job_id, gross, method, &self.schedule)?;
        let transaction = Transaction {
            job_id: job_id.clone(),
            payment_id: payment_id.clone(),
            method,
            gross: split.gross,
            gateway_fee: split.gateway_fee,
            platform_commission: split.platform_commission,
            master_payout: split.master_payout,
            created_at: Utc::now(),
        };
        info!(
            job = %job_id,
            payment = %payment_id,
            gross = %transaction.gross,
            payout = %transaction.master_payout,
            "payment settled"
        );
        entries.insert(key, transaction.clone());
        Ok(transaction)
    }

    /// Looks up a settled transaction.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::TransactionNotFound`] when absent.
    pub fn find(&self, job_id: &JobId, payment_id: &PaymentId) -> Result<Transaction> {
        self.entries
            .read()
            .get(&(job_id.clone(), payment_id.clone()))
            .cloned()
            .ok_or_else(|| SettlementError::TransactionNotFound {
                job_id: job_id.clone(),
                payment_id: payment_id.clone(),
            })
    }

    /// All transactions recorded for a job.
    #[must_use]
    pub fn transactions_for_job(&self, job_id: &JobId) -> Vec<Transaction> {
        self.entries
            .read()
            .values()
            .filter(|t| &t.job_id == job_id)
            .cloned()
            .collect()
    }

    /// Total number of settled captures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing has settled yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> TransactionLedger {
        TransactionLedger::new(FeeSchedule::default())
    }

    #[test]
    fn settle_records_split() {
        let ledger = ledger();
        let tx = ledger
            .settle(
                &JobId::new("j-1"),
                &PaymentId::new("pay-1"),
                Money::from_major(1200),
                PaymentMethod::Card,
            )
            .unwrap();
        assert_eq!(tx.gateway_fee, Money::from_major(24));
        assert_eq!(tx.master_payout, Money::from_major(882));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn duplicate_capture_returns_existing() {
        let ledger = ledger();
        let job = JobId::new("j-1");
        let payment = PaymentId::new("pay-1");

        let first = ledger
            .settle(&job, &payment, Money::from_major(1200), PaymentMethod::Card)
            .unwrap();
        // Retry with a different (bogus) gross: the prior record wins.
        let second = ledger
            .settle(&job, &payment, Money::from_major(9999), PaymentMethod::Cash)
            .unwrap();

        assert_eq!(ledger.len(), 1);
        assert_eq!(first.gross, second.gross);
        assert_eq!(first.created_at, second.created_at);
    }

    #[test]
    fn distinct_payments_create_distinct_transactions() {
        let ledger = ledger();
        let job = JobId::new("j-1");
        ledger
            .settle(
                &job,
                &PaymentId::new("pay-1"),
                Money::from_major(500),
                PaymentMethod::Card,
            )
            .unwrap();
        ledger
            .settle(
                &job,
                &PaymentId::new("pay-2"),
                Money::from_major(700),
                PaymentMethod::Sbp,
            )
            .unwrap();
        assert_eq!(ledger.transactions_for_job(&job).len(), 2);
    }

    #[test]
    fn failed_split_records_nothing() {
        let ledger = ledger();
        let err = ledger.settle(
            &JobId::new("j-1"),
            &PaymentId::new("pay-1"),
            Money::ZERO,
            PaymentMethod::Card,
        );
        assert!(err.is_err());
        assert!(ledger.is_empty());
    }

    #[test]
    fn find_unknown_key() {
        let ledger = ledger();
        let err = ledger
            .find(&JobId::new("j-1"), &PaymentId::new("nope"))
            .unwrap_err();
        assert!(matches!(err, SettlementError::TransactionNotFound { .. }));
    }
}
