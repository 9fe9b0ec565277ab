//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use fixline_pricing::RateTable;
use fixline_settlement::FeeSchedule;

/// Configuration for the dispatch orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How long a client has to confirm a quote before it expires.
    pub quote_expiry: Duration,
    /// How long a worker has to answer one offer.
    pub offer_timeout: Duration,
    /// How often the sweeper re-checks unassigned jobs.
    pub rematch_interval: Duration,
    /// How long an unassigned job keeps re-matching before it is
    /// cancelled as unservable.
    pub unassigned_retry_window: Duration,
    /// Per-category hourly rates and quote bounds.
    pub rates: RateTable,
    /// Gateway fees and platform commission.
    pub fees: FeeSchedule,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            quote_expiry: Duration::from_secs(24 * 60 * 60),
            offer_timeout: Duration::from_secs(15 * 60),
            rematch_interval: Duration::from_secs(60),
            unassigned_retry_window: Duration::from_secs(6 * 60 * 60),
            rates: RateTable::default(),
            fees: FeeSchedule::default(),
        }
    }
}
