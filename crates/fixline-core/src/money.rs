//! Money and rate arithmetic.
//!
//! Amounts are stored as signed minor units (e.g. kopecks) for precision;
//! no floating point ever touches a monetary value. Rate application rounds
//! half away from zero on `i128` intermediates, which is what lets the
//! settlement split conserve every minor unit.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Minor units per major unit (100 kopecks per ruble).
pub const MINOR_PER_MAJOR: i64 = 100;

/// Basis points per whole (100% == 10 000 bp).
pub const BASIS_POINTS: i128 = 10_000;

/// A monetary amount in minor units.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Money(i64);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// Creates an amount from minor units.
    #[must_use]
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Creates an amount from whole major units.
    #[must_use]
    pub const fn from_major(major: i64) -> Self {
        Self(major * MINOR_PER_MAJOR)
    }

    /// Returns the amount in minor units.
    #[must_use]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns true if the amount is exactly zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if the amount is strictly positive.
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Returns true if the amount is strictly negative.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Checked addition.
    #[must_use]
    pub const fn checked_add(&self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(minor) => Some(Self(minor)),
            None => None,
        }
    }

    /// Checked subtraction.
    #[must_use]
    pub const fn checked_sub(&self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(minor) => Some(Self(minor)),
            None => None,
        }
    }

    /// Saturating addition.
    #[must_use]
    pub const fn saturating_add(&self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Saturating subtraction.
    #[must_use]
    pub const fn saturating_sub(&self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Clamps the amount into `[min, max]`.
    #[must_use]
    pub fn clamp(self, min: Self, max: Self) -> Self {
        Self(self.0.clamp(min.0, max.0))
    }

    /// Applies a rate, rounding half away from zero to the minor unit.
    ///
    /// Intermediates are `i128`, so no practical amount can overflow.
    #[must_use]
    pub const fn apply_rate(self, rate: Rate) -> Self {
        Self(round_div(
            self.0 as i128 * rate.as_basis_points() as i128,
            BASIS_POINTS,
        ))
    }

    /// Multiplies by `num / den`, rounding half away from zero.
    ///
    /// Used for pro-rating an hourly rate over labor minutes.
    #[must_use]
    pub const fn mul_div(self, num: u64, den: u64) -> Self {
        Self(round_div(self.0 as i128 * num as i128, den as i128))
    }

    /// Multiplies by an integer factor, saturating on overflow.
    #[must_use]
    pub const fn scale(self, factor: u32) -> Self {
        Self(self.0.saturating_mul(factor as i64))
    }
}

/// Division rounding half away from zero. `den` must be positive.
const fn round_div(num: i128, den: i128) -> i64 {
    let half = den / 2;
    let rounded = if num >= 0 {
        (num + half) / den
    } else {
        (num - half) / den
    };
    rounded as i64
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(
            f,
            "{sign}{}.{:02}",
            abs / MINOR_PER_MAJOR as u64,
            abs % MINOR_PER_MAJOR as u64
        )
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }
}

/// A proportional rate in basis points (1 bp = 0.01%).
///
/// Doubles as the urgency multiplier: 150% is `Rate::from_percent(150)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rate(u32);

impl Rate {
    /// Zero rate.
    pub const ZERO: Self = Self(0);

    /// Creates a rate from basis points.
    #[must_use]
    pub const fn from_basis_points(bp: u32) -> Self {
        Self(bp)
    }

    /// Creates a rate from whole percent.
    #[must_use]
    pub const fn from_percent(percent: u32) -> Self {
        Self(percent * 100)
    }

    /// Returns the rate in basis points.
    #[must_use]
    pub const fn as_basis_points(&self) -> u32 {
        self.0
    }

    /// Returns true if the rate is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn major_minor_conversion() {
        assert_eq!(Money::from_major(7).minor(), 700);
        assert_eq!(Money::from_minor(700), Money::from_major(7));
    }

    #[test]
    fn display_formats_two_decimals() {
        assert_eq!(Money::from_minor(70_000).to_string(), "700.00");
        assert_eq!(Money::from_minor(2_401).to_string(), "24.01");
        assert_eq!(Money::from_minor(-150).to_string(), "-1.50");
    }

    #[test]
    fn apply_rate_rounds_half_up() {
        // 1.25 at 2% = 0.025 -> rounds to 0.03
        assert_eq!(
            Money::from_minor(125).apply_rate(Rate::from_percent(2)),
            Money::from_minor(3)
        );
        // 1.20 at 2% = 0.024 -> rounds to 0.02
        assert_eq!(
            Money::from_minor(120).apply_rate(Rate::from_percent(2)),
            Money::from_minor(2)
        );
    }

    #[test]
    fn apply_rate_as_multiplier() {
        // 150% of 1000.00
        assert_eq!(
            Money::from_major(1000).apply_rate(Rate::from_percent(150)),
            Money::from_major(1500)
        );
    }

    #[test]
    fn mul_div_pro_rates_minutes() {
        // 1500/h for 30 minutes = 750
        assert_eq!(
            Money::from_major(1500).mul_div(30, 60),
            Money::from_major(750)
        );
        // 1000/h for 90 minutes = 1500
        assert_eq!(
            Money::from_major(1000).mul_div(90, 60),
            Money::from_major(1500)
        );
    }

    #[test]
    fn scale_multiplies_by_quantity() {
        assert_eq!(Money::from_major(150).scale(2), Money::from_major(300));
        assert_eq!(Money::from_minor(i64::MAX).scale(2).minor(), i64::MAX);
    }

    #[test]
    fn checked_ops_detect_overflow() {
        assert!(Money::from_minor(i64::MAX).checked_add(Money::from_minor(1)).is_none());
        assert_eq!(
            Money::from_minor(3).checked_sub(Money::from_minor(1)),
            Some(Money::from_minor(2))
        );
    }

    #[test]
    fn clamp_bounds() {
        let min = Money::from_major(500);
        let max = Money::from_major(50_000);
        assert_eq!(Money::from_major(100).clamp(min, max), min);
        assert_eq!(Money::from_major(700).clamp(min, max), Money::from_major(700));
        assert_eq!(Money::from_major(99_999).clamp(min, max), max);
    }

    #[test]
    fn rate_display() {
        assert_eq!(Rate::from_percent(2).to_string(), "2.00%");
        assert_eq!(Rate::from_basis_points(70).to_string(), "0.70%");
    }

    proptest! {
        #[test]
        fn apply_rate_never_exceeds_input_for_sub_unity_rates(
            minor in 0i64..=1_000_000_000_000,
            bp in 0u32..=10_000,
        ) {
            let amount = Money::from_minor(minor);
            let part = amount.apply_rate(Rate::from_basis_points(bp));
            prop_assert!(part.minor() >= 0);
            prop_assert!(part <= amount);
        }

        #[test]
        fn rounding_error_is_at_most_half_a_unit(
            minor in 0i64..=1_000_000_000_000,
            bp in 0u32..=10_000,
        ) {
            let exact = minor as i128 * bp as i128;
            let rounded = Money::from_minor(minor)
                .apply_rate(Rate::from_basis_points(bp))
                .minor() as i128;
            let diff = (rounded * BASIS_POINTS - exact).abs();
            prop_assert!(diff <= BASIS_POINTS / 2);
        }
    }
}
