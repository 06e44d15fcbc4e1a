//! Rerate output contract
//!
//! These types are what the pipeline hands back to its caller: one
//! [`RatingUpdate`] per shipment, the surviving [`ConsolidationOpportunity`]
//! groups, and the run-level totals in [`RerateResult`]. The persistence and
//! presentation layers translate them into whatever format they need.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome code describing why a shipment could or could not be rated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    /// At least one carrier produced an expected charge
    Matched,
    /// No destination lane matched in any candidate tariff
    NoLane,
    /// The candidate tariff set was empty
    NoTariff,
}

/// Per-shipment rerate outcome, one per shipment per pass
///
/// Supersedes any prior update for the same shipment; addressed by shipment
/// identity, never by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingUpdate {
    /// Shipment this update applies to
    pub shipment_id: Uuid,
    /// Expected charge per carrier; carriers whose tariff did not apply are
    /// absent, not zero
    pub expected_charge_per_carrier: BTreeMap<String, Decimal>,
    /// Cheapest carrier, when any charge was produced
    pub best_carrier: Option<String>,
    /// The cheapest carrier's charge
    pub best_charge: Option<Decimal>,
    /// `max(0, actual - best)`; zero when either side is missing
    pub savings_vs_actual: Decimal,
    /// Match outcome
    pub match_status: MatchStatus,
    /// Human-readable note for unmatched shipments, naming the destination
    pub match_notes: Option<String>,
}

/// A set of shipments that would cost less shipped as one consolidated load
///
/// Ephemeral: recomputed every rerate pass, never persisted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidationOpportunity {
    /// Group origin DC
    pub origin_dc: String,
    /// Group destination city (empty when the group matched province-wide)
    pub dest_city: String,
    /// Group destination province
    pub dest_province: String,
    /// Representative departure date: the Thursday of the grouping week in
    /// weekly mode, the shared calendar day otherwise
    pub ship_date: NaiveDate,
    /// Number of shipments in the group
    pub shipment_count: usize,
    /// Sum of charges actually paid
    pub actual_sum: Decimal,
    /// Sum of each member's individually best charge (actual charge where no
    /// carrier matched)
    pub individual_best_sum: Decimal,
    /// Best achievable charge if the group ships as one load
    pub consolidated_charge: Decimal,
    /// `individual_best_sum - consolidated_charge`, always positive for a
    /// surviving group
    pub incremental_savings: Decimal,
    /// Carrier offering the consolidated charge
    pub carrier: Option<String>,
}

/// Full output of one rerate pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerateResult {
    /// One update per loaded shipment
    pub shipment_updates: Vec<RatingUpdate>,
    /// Sum of per-shipment savings versus actual
    pub carrier_savings_total: Decimal,
    /// Sum of best charges across rerated shipments
    pub carrier_best_total: Decimal,
    /// Shipments for which a best charge was found
    pub rerated_count: usize,
    /// Incremental savings across all surviving consolidation groups
    pub consolidation_savings_total: Decimal,
    /// Top consolidation opportunities, sorted by savings descending
    pub consolidation_groups: Vec<ConsolidationOpportunity>,
    /// Count of all surviving groups, including those beyond the top-N cut
    pub consolidation_group_count: usize,
}

impl RerateResult {
    /// Result for a run with no shipments: zero counts, zero totals
    pub fn empty() -> Self {
        Self {
            shipment_updates: Vec::new(),
            carrier_savings_total: Decimal::ZERO,
            carrier_best_total: Decimal::ZERO,
            rerated_count: 0,
            consolidation_savings_total: Decimal::ZERO,
            consolidation_groups: Vec::new(),
            consolidation_group_count: 0,
        }
    }

    /// Carrier savings plus consolidation savings
    pub fn total_opportunity(&self) -> Decimal {
        self.carrier_savings_total + self.consolidation_savings_total
    }
}
