//! # fixline-settlement
//!
//! Settlement of captured payments: the exact three-way split (gateway
//! fee, platform commission, master payout), the idempotent transaction
//! ledger, and receipt generation.
//!
//! # Precision Guarantees
//!
//! All splitting uses **fixed-point arithmetic** on minor units:
//!
//! - **No floating-point**: rates are basis points, amounts are integers
//! - **Exact conservation**: the payout is computed as the residual after
//!   the two rounded deductions, never rounded on its own, so
//!   `gateway_fee + platform_commission + master_payout == gross` always
//! - **Half-up rounding**: each rate application rounds half away from
//!   zero at the minor unit

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod ledger;
pub mod receipt;
pub mod split;

pub use error::SettlementError;
pub use ledger::{Transaction, TransactionLedger};
pub use receipt::Receipt;
pub use split::{FeeSchedule, PaymentMethod, PaymentSplit, split_payment};
