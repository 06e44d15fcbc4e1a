//! Rerate pipeline - batch re-rating of an audit run's shipments
//!
//! Loads every shipment for a run, prices each against every tariff whose
//! origin matches, picks the best carrier per shipment, and hands the whole
//! shipment set to consolidation detection. Rating itself is pure over the
//! snapshot; ordering across shipments is irrelevant since every update is
//! addressed by shipment id.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use freightlens_common::{
    MatchStatus, RatingError, RatingUpdate, RerateResult, Result, Shipment,
};

use crate::algorithms::{best_carrier, rate_lane};
use crate::cache::{LaneRates, TariffCache, TariffEntry};
use crate::config::EngineConfig;
use crate::consolidation;

/// Supplies the shipments of an audit run
///
/// Implemented by the caller; typically backed by the persistence layer.
#[async_trait]
pub trait ShipmentStore: Send + Sync {
    /// Load all shipments belonging to an audit run
    async fn shipments_for_run(&self, audit_run_id: Uuid) -> Result<Vec<Shipment>>;
}

/// Re-rate every shipment of an audit run against the cached tariffs
///
/// `tariff_ids` restricts the candidate tariffs; `None` uses all cached
/// entries. An empty run yields an empty result; an empty candidate set is a
/// configuration error.
#[instrument(skip(store, cache, config))]
pub async fn run_rerate(
    store: &dyn ShipmentStore,
    cache: &TariffCache,
    config: &EngineConfig,
    audit_run_id: Uuid,
    tariff_ids: Option<&[Uuid]>,
) -> Result<RerateResult> {
    let shipments = store.shipments_for_run(audit_run_id).await?;
    if shipments.is_empty() {
        debug!(%audit_run_id, "No shipments to rerate");
        return Ok(RerateResult::empty());
    }

    let snapshot = cache.get(false).await?;
    let entries = snapshot.select_entries(tariff_ids);
    if entries.is_empty() {
        return Err(RatingError::NoTariffsAvailable.into());
    }

    let result = rerate_shipments(&shipments, &entries, config);
    info!(
        %audit_run_id,
        shipment_count = shipments.len(),
        rerated = result.rerated_count,
        carrier_savings = %result.carrier_savings_total,
        consolidation_groups = result.consolidation_group_count,
        "Rerate pass complete"
    );
    Ok(result)
}

/// Pure core of the rerate pass, shared with tests
pub(crate) fn rerate_shipments(
    shipments: &[Shipment],
    entries: &[&TariffEntry],
    config: &EngineConfig,
) -> RerateResult {
    let matrix = compute_charge_matrix(shipments, entries, config);
    let (shipment_updates, carrier_savings_total, carrier_best_total, rerated_count) =
        build_shipment_updates(shipments, entries, &matrix);

    let (consolidation_savings_total, consolidation_groups, consolidation_group_count) =
        consolidation::detect_opportunities(shipments, &shipment_updates, entries, config);

    RerateResult {
        shipment_updates,
        carrier_savings_total,
        carrier_best_total,
        rerated_count,
        consolidation_savings_total,
        consolidation_groups,
        consolidation_group_count,
    }
}

/// One column of expected charges per tariff entry, `None` where the entry
/// does not apply to the shipment
fn compute_charge_matrix(
    shipments: &[Shipment],
    entries: &[&TariffEntry],
    config: &EngineConfig,
) -> Vec<Vec<Option<Decimal>>> {
    entries
        .iter()
        .map(|entry| {
            // Lane resolution repeats per destination, so memoize per entry
            let mut lane_lookup: HashMap<(String, String), Option<&LaneRates>> = HashMap::new();

            shipments
                .iter()
                .map(|shipment| {
                    if shipment.origin_key() != entry.origin_key {
                        return None;
                    }
                    let lane_key = (shipment.dest_city_key(), shipment.dest_province_key());
                    let lane = *lane_lookup.entry(lane_key).or_insert_with(|| {
                        entry.find_lane(
                            shipment.dest_city.as_deref(),
                            shipment.dest_province.as_deref(),
                        )
                    });
                    let lane = lane?;
                    rate_lane(
                        lane,
                        shipment.billable_weight(),
                        shipment.pallets,
                        shipment.weight,
                        config.skid_weight_cap_per_spot,
                    )
                })
                .collect()
        })
        .collect()
}

fn build_shipment_updates(
    shipments: &[Shipment],
    entries: &[&TariffEntry],
    matrix: &[Vec<Option<Decimal>>],
) -> (Vec<RatingUpdate>, Decimal, Decimal, usize) {
    let mut updates = Vec::with_capacity(shipments.len());
    let mut carrier_savings_total = Decimal::ZERO;
    let mut carrier_best_total = Decimal::ZERO;
    let mut rerated_count = 0usize;

    for (idx, shipment) in shipments.iter().enumerate() {
        let mut expected: BTreeMap<String, Decimal> = BTreeMap::new();
        for (entry, column) in entries.iter().zip(matrix) {
            if let Some(charge) = column[idx] {
                expected.insert(entry.carrier_name.clone(), charge);
            }
        }

        let best = best_carrier(&expected);
        let mut savings = Decimal::ZERO;

        if let Some((_, best_charge)) = &best {
            let actual = shipment.actual_charge.unwrap_or(Decimal::ZERO);
            if actual > Decimal::ZERO {
                let diff = actual - best_charge;
                if diff > Decimal::ZERO {
                    savings = diff;
                    carrier_savings_total += diff;
                }
            }
            carrier_best_total += best_charge;
            rerated_count += 1;
        }

        let (match_status, match_notes) = if best.is_some() {
            (MatchStatus::Matched, None)
        } else if entries.is_empty() {
            (
                MatchStatus::NoTariff,
                Some("No tariffs loaded for rating".to_string()),
            )
        } else {
            (
                MatchStatus::NoLane,
                Some(format!(
                    "No lane found for {}/{}",
                    shipment.dest_city.as_deref().unwrap_or(""),
                    shipment.dest_province.as_deref().unwrap_or(""),
                )),
            )
        };

        let (best_carrier_name, best_charge) = match best {
            Some((carrier, charge)) => (Some(carrier), Some(charge)),
            None => (None, None),
        };

        updates.push(RatingUpdate {
            shipment_id: shipment.id,
            expected_charge_per_carrier: expected,
            best_carrier: best_carrier_name,
            best_charge,
            savings_vs_actual: savings,
            match_status,
            match_notes,
        });
    }

    (updates, carrier_savings_total, carrier_best_total, rerated_count)
}
