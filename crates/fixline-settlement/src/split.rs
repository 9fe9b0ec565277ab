//! The three-way payment split.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use fixline_core::{JobId, Money, Rate};

use crate::error::{Result, SettlementError};

/// How the client paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Bank card through the gateway.
    Card,
    /// Faster-payments transfer.
    Sbp,
    /// QR payment through the gateway.
    Qr,
    /// Cash handed to the worker; no gateway involved.
    Cash,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Card => "card",
            Self::Sbp => "sbp",
            Self::Qr => "qr",
            Self::Cash => "cash",
        };
        write!(f, "{name}")
    }
}

/// Gateway fees per payment method plus the platform commission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeSchedule {
    gateway_fees: HashMap<PaymentMethod, Rate>,
    /// Platform commission taken from the net (post-gateway) amount.
    pub platform_commission: Rate,
}

impl FeeSchedule {
    /// Creates a schedule with the given commission and no gateway fees.
    #[must_use]
    pub fn new(platform_commission: Rate) -> Self {
        Self {
            gateway_fees: HashMap::new(),
            platform_commission,
        }
    }

    /// Sets the gateway fee for one payment method.
    pub fn set_gateway_fee(&mut self, method: PaymentMethod, rate: Rate) {
        self.gateway_fees.insert(method, rate);
    }

    /// Looks up the gateway fee for a method.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::UnknownPaymentMethod`] when unconfigured.
    pub fn gateway_fee(&self, method: PaymentMethod) -> Result<Rate> {
        self.gateway_fees
            .get(&method)
            .copied()
            .ok_or(SettlementError::UnknownPaymentMethod(method))
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        let mut gateway_fees = HashMap::new();
        gateway_fees.insert(PaymentMethod::Card, Rate::from_percent(2));
        gateway_fees.insert(PaymentMethod::Sbp, Rate::from_basis_points(70));
        gateway_fees.insert(PaymentMethod::Qr, Rate::from_basis_points(70));
        gateway_fees.insert(PaymentMethod::Cash, Rate::ZERO);
        Self {
            gateway_fees,
            platform_commission: Rate::from_percent(25),
        }
    }
}

/// The exact three-way split of one captured payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSplit {
    /// Amount the client paid.
    pub gross: Money,
    /// Gateway's cut, rounded half-up from the gross.
    pub gateway_fee: Money,
    /// Platform's cut, rounded half-up from the net.
    pub platform_commission: Money,
    /// Worker's payout: the residual, never independently rounded.
    pub master_payout: Money,
}

/// Splits a captured gross amount into gateway fee, platform commission,
/// and master payout.
///
/// The payout is `net - commission` by subtraction, which is what makes
/// `gateway_fee + platform_commission + master_payout == gross` hold for
/// every input, bit for bit.
///
/// # Errors
///
/// Returns [`SettlementError::InvalidAmount`] for non-positive gross and
/// [`SettlementError::UnknownPaymentMethod`] for an unconfigured method.
pub fn split_payment(
    job_id: &JobId,
    gross: Money,
    method: PaymentMethod,
    schedule: &FeeSchedule,
) -> Result<PaymentSplit> {
    if !gross.is_positive() {
        return Err(SettlementError::InvalidAmount {
            gross,
            job_id: job_id.clone(),
        });
    }

    let gateway_fee = gross.apply_rate(schedule.gateway_fee(method)?);
    let net = gross.saturating_sub(gateway_fee);
    let platform_commission = net.apply_rate(schedule.platform_commission);
    let master_payout = net.saturating_sub(platform_commission);

    Ok(PaymentSplit {
        gross,
        gateway_fee,
        platform_commission,
        master_payout,
    })
}
