//! Tariff model - one carrier's rate card for one origin facility
//!
//! A tariff is either hundredweight-structured (weight-tier rates per 100 lb)
//! or skid-structured (flat charge per spot count). The two break shapes are
//! a tagged variant so rating can dispatch on structure without runtime
//! inspection.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tariff rate structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TariffKind {
    /// Weight-tier rates expressed per hundredweight (100 lb)
    Hundredweight,
    /// Flat charge per skid/spot count
    Skid,
}

/// One rate break within a lane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateBreak {
    /// Weight range `[start, end)` with a rate per hundredweight. `end` is
    /// `None` for the open-ended top tier.
    Hundredweight {
        start: Decimal,
        end: Option<Decimal>,
        rate_per_cwt: Decimal,
    },
    /// Flat charge for exactly `spots` skid positions
    Skid { spots: u32, charge: Decimal },
}

/// A destination matching rule within a tariff
///
/// A lane with a city is more specific than a lane with only a province;
/// lookup prefers the city+province match and falls back to province-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lane {
    /// Destination city; `None` makes this a province-wide lane
    pub dest_city: Option<String>,
    /// Destination province/state (required)
    pub dest_province: String,
    /// Minimum charge; missing values default to zero during caching
    pub min_charge: Option<Decimal>,
    /// Rate breaks for this lane
    pub breaks: Vec<RateBreak>,
}

impl Lane {
    /// Province-wide lane
    pub fn province(dest_province: impl Into<String>) -> Self {
        Self {
            dest_city: None,
            dest_province: dest_province.into(),
            min_charge: None,
            breaks: Vec::new(),
        }
    }

    /// City-specific lane
    pub fn city(dest_city: impl Into<String>, dest_province: impl Into<String>) -> Self {
        Self {
            dest_city: Some(dest_city.into()),
            dest_province: dest_province.into(),
            min_charge: None,
            breaks: Vec::new(),
        }
    }

    /// Set the minimum charge
    pub fn with_min_charge(mut self, min_charge: Decimal) -> Self {
        self.min_charge = Some(min_charge);
        self
    }

    /// Append a hundredweight break
    pub fn with_weight_break(
        mut self,
        start: Decimal,
        end: Option<Decimal>,
        rate_per_cwt: Decimal,
    ) -> Self {
        self.breaks.push(RateBreak::Hundredweight {
            start,
            end,
            rate_per_cwt,
        });
        self
    }

    /// Append a skid break
    pub fn with_skid_break(mut self, spots: u32, charge: Decimal) -> Self {
        self.breaks.push(RateBreak::Skid { spots, charge });
        self
    }
}

/// One carrier's rate card for one origin facility
///
/// Created by the ingestion layer; immutable once cached for a rating pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tariff {
    /// Unique tariff ID
    pub id: Uuid,
    /// Carrier name (e.g. "APPS", "Rosedale", "Maritime Ontario")
    pub carrier_name: String,
    /// Origin distribution centre code this card prices from
    pub origin_dc: String,
    /// Rate structure
    pub kind: TariffKind,
    /// Destination lanes
    pub lanes: Vec<Lane>,
    /// Validity window, carried for the ingestion layer; rating does not
    /// filter on it
    pub effective_from: Option<DateTime<Utc>>,
    pub effective_to: Option<DateTime<Utc>>,
}

impl Tariff {
    /// Create a new tariff with no lanes
    pub fn new(
        carrier_name: impl Into<String>,
        origin_dc: impl Into<String>,
        kind: TariffKind,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            carrier_name: carrier_name.into(),
            origin_dc: origin_dc.into(),
            kind,
            lanes: Vec::new(),
            effective_from: None,
            effective_to: None,
        }
    }

    /// Append a lane
    pub fn with_lane(mut self, lane: Lane) -> Self {
        self.lanes.push(lane);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_lane_builder() {
        let lane = Lane::city("Winnipeg", "MB")
            .with_min_charge(dec!(45))
            .with_weight_break(dec!(0), Some(dec!(500)), dec!(20))
            .with_weight_break(dec!(500), None, dec!(15));

        assert_eq!(lane.dest_city.as_deref(), Some("Winnipeg"));
        assert_eq!(lane.min_charge, Some(dec!(45)));
        assert_eq!(lane.breaks.len(), 2);
    }

    #[test]
    fn test_tariff_kind_serde_tag() {
        let json = serde_json::to_string(&TariffKind::Hundredweight).unwrap();
        assert_eq!(json, "\"hundredweight\"");
    }
}
