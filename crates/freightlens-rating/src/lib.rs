//! # Freightlens Rating
//!
//! Tariff cache, rating algorithms, and the batch rerate pipeline.
//!
//! ## Charge Formula
//!
//! ```text
//! Hundredweight: charge = max(ceil(w / 100) x rate, min) x 1.53
//! Skid:          charge = spot_charge(min(ceil(pallets), max_tier)) x 1.53
//! ```
//!
//! The 1.53 composite is 25% fuel + 13% tax + 15% margin applied as a single
//! additive multiplier.
//!
//! ## Flow
//!
//! Caller supplies an audit run id -> the pipeline loads shipments from a
//! [`ShipmentStore`] -> each shipment is priced against every origin-matching
//! tariff via the [`TariffCache`] snapshot -> per-shipment best carriers and
//! run totals come back in a [`RerateResult`](freightlens_common::RerateResult),
//! alongside the consolidation opportunities.

pub mod algorithms;
pub mod cache;
pub mod config;
pub mod consolidation;
pub mod pipeline;

pub use cache::{
    LaneRates, RateSchedule, TariffCache, TariffEntry, TariffSnapshot, TariffSource, WeightBreak,
};
pub use config::EngineConfig;
pub use pipeline::{run_rerate, ShipmentStore};

use std::sync::Arc;

use uuid::Uuid;

use freightlens_common::{RerateResult, Result};

/// Rating engine facade: a tariff cache plus its configuration
pub struct RatingEngine {
    config: EngineConfig,
    cache: TariffCache,
}

impl RatingEngine {
    /// Create an engine over a tariff source
    pub fn new(source: Arc<dyn TariffSource>, config: EngineConfig) -> Self {
        let cache = TariffCache::new(source, config.cache_ttl_secs);
        Self { config, cache }
    }

    /// Create an engine with default configuration
    pub fn with_defaults(source: Arc<dyn TariffSource>) -> Self {
        Self::new(source, EngineConfig::default())
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Re-rate an audit run against the cached tariffs
    pub async fn rerate(
        &self,
        store: &dyn ShipmentStore,
        audit_run_id: Uuid,
        tariff_ids: Option<&[Uuid]>,
    ) -> Result<RerateResult> {
        pipeline::run_rerate(store, &self.cache, &self.config, audit_run_id, tariff_ids).await
    }

    /// Force a snapshot rebuild, e.g. after new tariff ingestion
    pub async fn refresh_tariffs(&self) -> Result<()> {
        self.cache.get(true).await?;
        Ok(())
    }
}
