//! # Freightlens Common
//!
//! Shared types and errors for the Freightlens freight-invoice audit engine.
//!
//! ## Core Types
//!
//! - [`Shipment`]: normalized shipment record supplied by the ingestion layer
//! - [`Tariff`]/[`Lane`]/[`RateBreak`]: one carrier's rate card for one origin
//! - [`RatingUpdate`]: per-shipment rerate outcome, addressed by shipment id
//! - [`ConsolidationOpportunity`]: a group of shipments cheaper shipped as one
//! - [`RerateResult`]: the full output contract of a rerate pass

pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{FreightlensError, RatingError, Result};
pub use types::{
    rating::{ConsolidationOpportunity, MatchStatus, RatingUpdate, RerateResult},
    shipment::Shipment,
    tariff::{Lane, RateBreak, Tariff, TariffKind},
};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Freightlens version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fuel surcharge (25%) + tax (13%) + margin (15%), applied as one additive
/// multiplier. A fixed business rule, not a compounded derivation.
pub const FUEL_TAX_MARGIN_MULTIPLIER: Decimal = dec!(1.53);

/// Pounds per hundredweight pricing unit
pub const LBS_PER_CWT: Decimal = dec!(100);

/// Default weight allowance per skid spot in pounds
pub const DEFAULT_SKID_WEIGHT_CAP_PER_SPOT: Decimal = dec!(2000);

/// Default tariff cache time-to-live in seconds
pub const DEFAULT_CACHE_TTL_SECS: u64 = 600;

/// Default number of consolidation opportunities returned per pass
pub const DEFAULT_CONSOLIDATION_TOP_N: usize = 15;
