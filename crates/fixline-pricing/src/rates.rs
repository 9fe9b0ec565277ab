//! Per-category hourly rates and quote bounds.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use fixline_core::{JobCategory, Money};

use crate::error::{PricingError, Result};

/// Hourly rate and quote bounds for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRates {
    /// Labor rate per hour.
    pub hourly_rate: Money,
    /// Lowest quote the platform will issue for this category.
    pub min_cost: Money,
    /// Highest quote the platform will issue for this category.
    pub max_cost: Money,
}

impl CategoryRates {
    /// Creates rates with the given hourly rate and bounds.
    #[must_use]
    pub const fn new(hourly_rate: Money, min_cost: Money, max_cost: Money) -> Self {
        Self {
            hourly_rate,
            min_cost,
            max_cost,
        }
    }
}

/// The static rate configuration the calculator prices against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateTable {
    rates: HashMap<JobCategory, CategoryRates>,
}

impl RateTable {
    /// Creates an empty table. Mostly useful for testing the
    /// unknown-category path; production code starts from `default()`.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            rates: HashMap::new(),
        }
    }

    /// Sets the rates for one category.
    pub fn set(&mut self, category: JobCategory, rates: CategoryRates) {
        self.rates.insert(category, rates);
    }

    /// Looks up the rates for a category.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::UnknownCategory`] if the table has no entry.
    pub fn get(&self, category: JobCategory) -> Result<CategoryRates> {
        self.rates
            .get(&category)
            .copied()
            .ok_or(PricingError::UnknownCategory(category))
    }
}

impl Default for RateTable {
    fn default() -> Self {
        let bounds = (Money::from_major(500), Money::from_major(50_000));
        let mut rates = HashMap::new();
        rates.insert(
            JobCategory::Electrical,
            CategoryRates::new(Money::from_major(1500), bounds.0, bounds.1),
        );
        rates.insert(
            JobCategory::Plumbing,
            CategoryRates::new(Money::from_major(1800), bounds.0, bounds.1),
        );
        rates.insert(
            JobCategory::Renovation,
            CategoryRates::new(Money::from_major(1400), bounds.0, bounds.1),
        );
        rates.insert(
            JobCategory::Appliance,
            CategoryRates::new(Money::from_major(2000), bounds.0, bounds.1),
        );
        Self { rates }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_covers_every_category() {
        let table = RateTable::default();
        for category in JobCategory::ALL {
            let rates = table.get(category).unwrap();
            assert!(rates.hourly_rate.is_positive());
            assert!(rates.min_cost < rates.max_cost);
        }
    }

    #[test]
    fn empty_table_reports_unknown_category() {
        let table = RateTable::empty();
        let err = table.get(JobCategory::Plumbing).unwrap_err();
        assert!(matches!(err, PricingError::UnknownCategory(_)));
    }

    #[test]
    fn set_overrides_defaults() {
        let mut table = RateTable::default();
        table.set(
            JobCategory::Electrical,
            CategoryRates::new(
                Money::from_major(1000),
                Money::from_major(300),
                Money::from_major(9000),
            ),
        );
        let rates = table.get(JobCategory::Electrical).unwrap();
        assert_eq!(rates.hourly_rate, Money::from_major(1000));
    }
}
