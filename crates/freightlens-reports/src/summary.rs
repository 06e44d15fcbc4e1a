//! Lane and audit-level summary folding
//!
//! Folds per-shipment rating updates into lane summaries and one audit-level
//! summary. Consumes only the pipeline's output contract; persistence and
//! presentation of the folded numbers belong to the calling service.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use freightlens_common::{MatchStatus, RatingUpdate, RerateResult, Shipment};

use crate::metrics::{compute_cost_metrics, compute_flags, ExceptionFlag};

/// Aggregated statistics for one lane (origin x destination)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneSummary {
    /// Origin DC, "UNKNOWN" when the shipments carried none
    pub origin_dc: String,
    pub dest_city: Option<String>,
    pub dest_province: Option<String>,
    pub dest_region: Option<String>,
    /// Shipments on this lane
    pub shipment_count: usize,
    /// Sum of actual charges
    pub total_spend: Decimal,
    /// Sum of scale weights
    pub total_weight: Decimal,
    /// Sum of pallet counts
    pub total_pallets: Decimal,
    /// Average actual charge per shipment
    pub avg_charge_per_shipment: Option<Decimal>,
    /// Spend per pound across the lane
    pub avg_cost_per_lb: Option<Decimal>,
    /// Spend per pallet across the lane
    pub avg_cost_per_pallet: Option<Decimal>,
    /// Sum of best charges from the rerate pass, where members rated
    pub best_spend: Option<Decimal>,
    /// Sum of savings versus actual from the rerate pass
    pub savings: Decimal,
    /// Savings as a percentage of lane spend
    pub savings_pct: Option<Decimal>,
}

#[derive(Default)]
struct LaneAccumulator {
    shipment_count: usize,
    total_spend: Decimal,
    total_weight: Decimal,
    total_pallets: Decimal,
    charged_count: usize,
    best_spend: Option<Decimal>,
    savings: Decimal,
}

/// Fold shipments and their rating updates into per-lane summaries
///
/// Lanes are keyed by the raw (origin, province, region, city) values the
/// shipments carried, matching how the audit views group them.
pub fn lane_summaries(shipments: &[Shipment], updates: &[RatingUpdate]) -> Vec<LaneSummary> {
    let update_by_shipment: HashMap<Uuid, &RatingUpdate> =
        updates.iter().map(|u| (u.shipment_id, u)).collect();

    type LaneKey = (String, Option<String>, Option<String>, Option<String>);
    let mut lanes: BTreeMap<LaneKey, LaneAccumulator> = BTreeMap::new();

    for shipment in shipments {
        let key = (
            shipment.origin_key(),
            shipment.dest_province.clone(),
            shipment.dest_region.clone(),
            shipment.dest_city.clone(),
        );
        let acc = lanes.entry(key).or_default();

        acc.shipment_count += 1;
        if let Some(actual) = shipment.actual_charge {
            acc.total_spend += actual;
            acc.charged_count += 1;
        }
        acc.total_weight += shipment.weight.unwrap_or(Decimal::ZERO);
        acc.total_pallets += shipment.pallets.unwrap_or(Decimal::ZERO);

        if let Some(update) = update_by_shipment.get(&shipment.id) {
            if let Some(best) = update.best_charge {
                *acc.best_spend.get_or_insert(Decimal::ZERO) += best;
            }
            acc.savings += update.savings_vs_actual;
        }
    }

    let summaries: Vec<LaneSummary> = lanes
        .into_iter()
        .map(|((origin_dc, dest_province, dest_region, dest_city), acc)| {
            let avg_charge_per_shipment = (acc.charged_count > 0)
                .then(|| acc.total_spend / Decimal::from(acc.charged_count as u64));
            let avg_cost_per_lb =
                (acc.total_weight > Decimal::ZERO).then(|| acc.total_spend / acc.total_weight);
            let avg_cost_per_pallet =
                (acc.total_pallets > Decimal::ZERO).then(|| acc.total_spend / acc.total_pallets);
            let savings_pct = (acc.total_spend > Decimal::ZERO)
                .then(|| acc.savings / acc.total_spend * dec!(100));

            LaneSummary {
                origin_dc,
                dest_city,
                dest_province,
                dest_region,
                shipment_count: acc.shipment_count,
                total_spend: acc.total_spend,
                total_weight: acc.total_weight,
                total_pallets: acc.total_pallets,
                avg_charge_per_shipment,
                avg_cost_per_lb,
                avg_cost_per_pallet,
                best_spend: acc.best_spend,
                savings: acc.savings,
                savings_pct,
            }
        })
        .collect();

    debug!(lane_count = summaries.len(), "Folded lane summaries");
    summaries
}

/// Audit-level rollup of an entire run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub shipment_count: usize,
    pub total_spend: Decimal,
    pub total_weight: Decimal,
    pub total_pallets: Decimal,
    pub avg_cost_per_shipment: Option<Decimal>,
    pub avg_cost_per_lb: Option<Decimal>,
    pub avg_cost_per_pallet: Option<Decimal>,
    /// Savings from carrier selection across the run
    pub carrier_savings_total: Decimal,
    /// Best-charge spend across rerated shipments
    pub carrier_best_total: Decimal,
    /// Shipments for which a best carrier was found
    pub rerated_count: usize,
    /// Savings from consolidation across all surviving groups
    pub consolidation_savings_total: Decimal,
    pub consolidation_group_count: usize,
    /// Carrier savings plus consolidation savings
    pub total_opportunity: Decimal,
}

/// Build the audit-level summary for a run and its rerate result
pub fn audit_summary(shipments: &[Shipment], result: &RerateResult) -> AuditSummary {
    let mut total_spend = Decimal::ZERO;
    let mut total_weight = Decimal::ZERO;
    let mut total_pallets = Decimal::ZERO;

    for shipment in shipments {
        total_spend += shipment.actual_charge.unwrap_or(Decimal::ZERO);
        total_weight += shipment.weight.unwrap_or(Decimal::ZERO);
        total_pallets += shipment.pallets.unwrap_or(Decimal::ZERO);
    }

    let count = shipments.len();
    AuditSummary {
        shipment_count: count,
        total_spend,
        total_weight,
        total_pallets,
        avg_cost_per_shipment: (count > 0).then(|| total_spend / Decimal::from(count as u64)),
        avg_cost_per_lb: (total_weight > Decimal::ZERO).then(|| total_spend / total_weight),
        avg_cost_per_pallet: (total_pallets > Decimal::ZERO)
            .then(|| total_spend / total_pallets),
        carrier_savings_total: result.carrier_savings_total,
        carrier_best_total: result.carrier_best_total,
        rerated_count: result.rerated_count,
        consolidation_savings_total: result.consolidation_savings_total,
        consolidation_group_count: result.consolidation_group_count,
        total_opportunity: result.total_opportunity(),
    }
}

/// One exception shipment surfaced for analyst attention
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionRecord {
    pub shipment_id: Uuid,
    pub shipment_ref: Option<String>,
    pub origin_dc: Option<String>,
    pub dest_city: Option<String>,
    pub dest_province: Option<String>,
    pub weight: Option<Decimal>,
    pub pallets: Option<Decimal>,
    pub actual_charge: Option<Decimal>,
    pub cost_per_lb: Option<Decimal>,
    /// Data-quality flags raised on the shipment
    pub flags: Vec<ExceptionFlag>,
    /// Rating outcome from the latest rerate pass, when one ran
    pub match_status: Option<MatchStatus>,
    pub match_notes: Option<String>,
    pub expected_charge: Option<Decimal>,
    pub best_carrier: Option<String>,
}

/// List shipments needing analyst attention: any flagged shipment, plus any
/// the rerate pass could not match to a lane or tariff
pub fn list_exceptions(shipments: &[Shipment], updates: &[RatingUpdate]) -> Vec<ExceptionRecord> {
    let update_by_shipment: HashMap<Uuid, &RatingUpdate> =
        updates.iter().map(|u| (u.shipment_id, u)).collect();

    shipments
        .iter()
        .filter_map(|shipment| {
            let flags = compute_flags(shipment);
            let update = update_by_shipment.get(&shipment.id);
            let unmatched = update.is_some_and(|u| u.match_status != MatchStatus::Matched);
            if flags.is_empty() && !unmatched {
                return None;
            }

            let metrics = compute_cost_metrics(shipment);
            Some(ExceptionRecord {
                shipment_id: shipment.id,
                shipment_ref: shipment.shipment_ref.clone(),
                origin_dc: shipment.origin_dc.clone(),
                dest_city: shipment.dest_city.clone(),
                dest_province: shipment.dest_province.clone(),
                weight: shipment.weight,
                pallets: shipment.pallets,
                actual_charge: shipment.actual_charge,
                cost_per_lb: metrics.cost_per_lb,
                flags,
                match_status: update.map(|u| u.match_status),
                match_notes: update.and_then(|u| u.match_notes.clone()),
                expected_charge: update.and_then(|u| u.best_charge),
                best_carrier: update.and_then(|u| u.best_carrier.clone()),
            })
        })
        .collect()
}

/// The `n` costliest exceptions by cost per pound, for outlier review
pub fn top_outliers(mut exceptions: Vec<ExceptionRecord>, n: usize) -> Vec<ExceptionRecord> {
    exceptions.sort_by(|a, b| {
        b.cost_per_lb
            .unwrap_or(Decimal::ZERO)
            .cmp(&a.cost_per_lb.unwrap_or(Decimal::ZERO))
    });
    exceptions.truncate(n);
    exceptions
}
