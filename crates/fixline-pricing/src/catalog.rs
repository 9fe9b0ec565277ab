//! Materials catalog with per-category unit prices.
//!
//! Upstream diagnosis produces an item list; this module prices it into the
//! single materials estimate the quote algorithm consumes. Items the catalog
//! does not know are skipped rather than failing the whole estimate.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use fixline_core::{JobCategory, Money};

/// One material item with a quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialLine {
    /// Catalog item name.
    pub name: String,
    /// Number of units needed.
    pub quantity: u32,
}

impl MaterialLine {
    /// Creates a line item.
    #[must_use]
    pub fn new(name: impl Into<String>, quantity: u32) -> Self {
        Self {
            name: name.into(),
            quantity,
        }
    }
}

/// Unit prices for common materials, keyed by category and item name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialsCatalog {
    items: HashMap<JobCategory, HashMap<String, Money>>,
}

impl MaterialsCatalog {
    /// Looks up the unit price of one item.
    #[must_use]
    pub fn unit_price(&self, category: JobCategory, name: &str) -> Option<Money> {
        self.items.get(&category)?.get(name).copied()
    }

    /// Prices an item list. Unknown items are skipped.
    #[must_use]
    pub fn estimate(&self, category: JobCategory, lines: &[MaterialLine]) -> Money {
        let mut total = Money::ZERO;
        for line in lines {
            match self.unit_price(category, &line.name) {
                Some(price) => {
                    total = total.saturating_add(price.scale(line.quantity));
                }
                None => {
                    debug!(category = %category, item = %line.name, "unknown material, skipping");
                }
            }
        }
        total
    }
}

impl Default for MaterialsCatalog {
    fn default() -> Self {
        let mut items: HashMap<JobCategory, HashMap<String, Money>> = HashMap::new();

        let electrical = [
            ("outlet", 150),
            ("switch", 200),
            ("circuit_breaker", 500),
            ("wire_1m", 80),
            ("junction_box", 100),
            ("cable_10m", 600),
            ("led_lamp", 300),
        ];
        items.insert(
            JobCategory::Electrical,
            electrical
                .into_iter()
                .map(|(name, major)| (name.to_string(), Money::from_major(major)))
                .collect(),
        );

        let plumbing = [
            ("pipe_1m", 200),
            ("faucet", 1500),
            ("valve", 400),
            ("sealant", 150),
        ];
        items.insert(
            JobCategory::Plumbing,
            plumbing
                .into_iter()
                .map(|(name, major)| (name.to_string(), Money::from_major(major)))
                .collect(),
        );

        Self { items }
    }
}
