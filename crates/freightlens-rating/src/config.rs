//! Engine configuration

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use freightlens_common::{
    Result, DEFAULT_CACHE_TTL_SECS, DEFAULT_CONSOLIDATION_TOP_N, DEFAULT_SKID_WEIGHT_CAP_PER_SPOT,
};

/// Rating engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Tariff snapshot time-to-live in seconds
    pub cache_ttl_secs: u64,
    /// Group consolidation candidates by Mon-Thu ISO week (true) or by exact
    /// calendar day (false)
    pub weekly_consolidation: bool,
    /// How many consolidation opportunities a pass returns
    pub consolidation_top_n: usize,
    /// Weight allowance per skid spot in pounds
    pub skid_weight_cap_per_spot: Decimal,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            weekly_consolidation: true,
            consolidation_top_n: DEFAULT_CONSOLIDATION_TOP_N,
            skid_weight_cap_per_spot: DEFAULT_SKID_WEIGHT_CAP_PER_SPOT,
        }
    }
}

impl EngineConfig {
    /// Load configuration from the environment, falling back to defaults
    /// for anything unset or unparseable
    pub fn load() -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();

        let mut cfg = Self::default();

        if let Ok(val) = std::env::var("FREIGHTLENS_CACHE_TTL_SECS") {
            if let Ok(v) = val.parse() {
                cfg.cache_ttl_secs = v;
            }
        }
        if let Ok(val) = std::env::var("FREIGHTLENS_WEEKLY_CONSOLIDATION") {
            if let Ok(v) = val.parse() {
                cfg.weekly_consolidation = v;
            }
        }
        if let Ok(val) = std::env::var("FREIGHTLENS_CONSOLIDATION_TOP_N") {
            if let Ok(v) = val.parse() {
                cfg.consolidation_top_n = v;
            }
        }
        if let Ok(val) = std::env::var("FREIGHTLENS_SKID_WEIGHT_CAP") {
            if let Ok(v) = val.parse() {
                cfg.skid_weight_cap_per_spot = v;
            }
        }

        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.cache_ttl_secs, 600);
        assert!(cfg.weekly_consolidation);
        assert_eq!(cfg.consolidation_top_n, 15);
        assert_eq!(cfg.skid_weight_cap_per_spot, dec!(2000));
    }
}
