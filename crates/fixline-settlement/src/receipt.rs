//! Electronic receipt generation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fixline_core::{JobId, Money};

use crate::ledger::Transaction;
use crate::split::PaymentMethod;

/// A client-facing receipt derived from a settled transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    /// Receipt number shown to the client.
    pub receipt_id: String,
    /// The job the receipt covers.
    pub job_id: JobId,
    /// Settlement time.
    pub issued_at: DateTime<Utc>,
    /// Amount paid.
    pub amount: Money,
    /// How the client paid.
    pub method: PaymentMethod,
}

impl Receipt {
    /// Derives a receipt from a settled transaction.
    #[must_use]
    pub fn from_transaction(transaction: &Transaction) -> Self {
        Self {
            receipt_id: format!("REC-{}", transaction.payment_id),
            job_id: transaction.job_id.clone(),
            issued_at: transaction.created_at,
            amount: transaction.gross,
            method: transaction.method,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::TransactionLedger;
    use crate::split::FeeSchedule;
    use fixline_core::PaymentId;

    #[test]
    fn receipt_mirrors_transaction() {
        let ledger = TransactionLedger::new(FeeSchedule::default());
        let tx = ledger
            .settle(
                &JobId::new("j-1"),
                &PaymentId::new("pay-1"),
                Money::from_major(700),
                PaymentMethod::Card,
            )
            .unwrap();

        let receipt = Receipt::from_transaction(&tx);
        assert_eq!(receipt.receipt_id, "REC-pay-1");
        assert_eq!(receipt.amount, Money::from_major(700));
        assert_eq!(receipt.method, PaymentMethod::Card);
        assert_eq!(receipt.issued_at, tx.created_at);
    }
}
