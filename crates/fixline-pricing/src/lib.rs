//! # fixline-pricing
//!
//! The Pricing Calculator: turns a job request into a bounded monetary
//! quote with a retained breakdown.
//!
//! This crate provides:
//!
//! - The per-category rate table with [min, max] quote bounds
//! - The quote algorithm (labor x urgency multiplier + materials, clamped)
//! - A materials catalog for estimating materials cost from item lists

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod calculator;
pub mod catalog;
pub mod error;
pub mod rates;

pub use calculator::{PricingCalculator, PricingInput};
pub use catalog::{MaterialLine, MaterialsCatalog};
pub use error::PricingError;
pub use rates::{CategoryRates, RateTable};
