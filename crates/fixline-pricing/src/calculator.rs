//! The quote algorithm.

use serde::{Deserialize, Serialize};
use tracing::debug;

use fixline_core::{Complexity, JobCategory, Money, QuoteBreakdown, Urgency};

use crate::error::{PricingError, Result};
use crate::rates::RateTable;

/// Everything the calculator needs to price one job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingInput {
    /// Service category.
    pub category: JobCategory,
    /// Complexity tier, used for the labor default.
    pub complexity: Complexity,
    /// Urgency tier, mapped to the labor multiplier.
    pub urgency: Urgency,
    /// Explicit labor estimate in minutes; the complexity default applies
    /// when absent.
    pub labor_minutes: Option<u32>,
    /// Materials cost estimate.
    pub materials_cost: Money,
}

/// Pure quote calculator over a static rate table.
#[derive(Debug, Clone, Default)]
pub struct PricingCalculator {
    table: RateTable,
}

impl PricingCalculator {
    /// Creates a calculator over the given rate table.
    #[must_use]
    pub const fn new(table: RateTable) -> Self {
        Self { table }
    }

    /// The rate table in use.
    #[must_use]
    pub const fn table(&self) -> &RateTable {
        &self.table
    }

    /// Computes a quote breakdown.
    ///
    /// `labor = hourly_rate * minutes / 60`, half-up;
    /// `subtotal = labor * urgency_multiplier + materials`;
    /// `total = clamp(subtotal, min_cost, max_cost)`.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::UnknownCategory`] when the rate table has no
    /// entry for the category and [`PricingError::InvalidInput`] for a zero
    /// labor estimate or negative materials cost.
    pub fn quote(&self, input: &PricingInput) -> Result<QuoteBreakdown> {
        let rates = self.table.get(input.category)?;

        let minutes = input
            .labor_minutes
            .unwrap_or_else(|| input.complexity.default_labor_minutes());
        if minutes == 0 {
            return Err(PricingError::InvalidInput {
                message: "labor estimate is zero minutes".to_string(),
            });
        }
        if input.materials_cost.is_negative() {
            return Err(PricingError::InvalidInput {
                message: format!("negative materials cost {}", input.materials_cost),
            });
        }

        let labor = rates.hourly_rate.mul_div(u64::from(minutes), 60);
        let multiplier = input.urgency.multiplier();
        let subtotal = labor
            .apply_rate(multiplier)
            .saturating_add(input.materials_cost);
        let total = subtotal.clamp(rates.min_cost, rates.max_cost);

        debug!(
            category = %input.category,
            %labor,
            materials = %input.materials_cost,
            %multiplier,
            %total,
            "quote computed"
        );

        Ok(QuoteBreakdown {
            labor,
            materials: input.materials_cost,
            multiplier,
            subtotal,
            total,
        })
    }
}
