//! Consolidation opportunity detection
//!
//! After per-shipment rating, same-lane shipments inside one grouping window
//! are combined into a hypothetical single load and re-rated. Default window:
//! the ISO calendar week, restricted to Monday-Thursday ship dates and
//! departing as a consolidated Thursday load. The alternate mode groups by
//! exact calendar day.
//!
//! Detection is greedy within the fixed windows; there is no cross-window or
//! global optimization.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use tracing::debug;

use freightlens_common::{ConsolidationOpportunity, RatingUpdate, Shipment};

use crate::algorithms::rate_lane;
use crate::cache::TariffEntry;
use crate::config::EngineConfig;

/// Grouping window component of a group key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum WindowKey {
    /// ISO (year, week) for weekly Mon-Thu consolidation
    Week(i32, u32),
    /// Exact ship date for same-day consolidation
    Day(NaiveDate),
}

/// Full group identity. Ordered so grouping is deterministic across passes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct GroupKey {
    origin: String,
    dest_city: String,
    dest_province: String,
    window: WindowKey,
}

fn is_mon_thu(date: NaiveDate) -> bool {
    date.weekday().num_days_from_monday() <= 3
}

/// The Thursday of `date`'s week, the departure day of a weekly
/// consolidated load
fn thursday_of_week(date: NaiveDate) -> NaiveDate {
    let offset = (3 - date.weekday().num_days_from_monday() as i64).rem_euclid(7);
    date + Duration::days(offset)
}

/// Detect consolidation opportunities over a rated shipment set
///
/// Returns the savings total and group count across every surviving group,
/// and the top-N groups by incremental savings.
pub fn detect_opportunities(
    shipments: &[Shipment],
    updates: &[RatingUpdate],
    entries: &[&TariffEntry],
    config: &EngineConfig,
) -> (Decimal, Vec<ConsolidationOpportunity>, usize) {
    let mut by_key: BTreeMap<GroupKey, Vec<usize>> = BTreeMap::new();

    for (idx, shipment) in shipments.iter().enumerate() {
        let Some(ship_date) = shipment.ship_date else {
            continue;
        };
        let dest_province = shipment.dest_province_key();
        if dest_province.is_empty() {
            continue;
        }

        let window = if config.weekly_consolidation {
            // Fri-Sun shipments never enter a weekly group
            if !is_mon_thu(ship_date) {
                continue;
            }
            let week = ship_date.iso_week();
            WindowKey::Week(week.year(), week.week())
        } else {
            WindowKey::Day(ship_date)
        };

        by_key
            .entry(GroupKey {
                origin: shipment.origin_key(),
                dest_city: shipment.dest_city_key(),
                dest_province,
                window,
            })
            .or_default()
            .push(idx);
    }

    let mut entries_by_origin: HashMap<&str, Vec<&TariffEntry>> = HashMap::new();
    for entry in entries {
        entries_by_origin
            .entry(entry.origin_key.as_str())
            .or_default()
            .push(entry);
    }

    let mut savings_total = Decimal::ZERO;
    let mut opportunities = Vec::new();
    let mut group_count = 0usize;

    for (key, indices) in &by_key {
        if indices.len() < 2 {
            continue;
        }

        let mut actual_sum = Decimal::ZERO;
        let mut individual_best_sum = Decimal::ZERO;
        let mut pallets_total = Decimal::ZERO;
        let mut weight_total = Decimal::ZERO;
        let mut billed_total = Decimal::ZERO;

        for &idx in indices {
            let shipment = &shipments[idx];
            let actual = shipment.actual_charge.unwrap_or(Decimal::ZERO);
            actual_sum += actual;
            // Members no carrier matched keep their actual charge
            individual_best_sum += updates[idx].best_charge.unwrap_or(actual);
            pallets_total += shipment.pallets.unwrap_or(Decimal::ZERO);
            weight_total += shipment.weight.unwrap_or(Decimal::ZERO);
            billed_total += shipment.billed_weight.unwrap_or(Decimal::ZERO);
        }

        let first = &shipments[indices[0]];
        let combined = weight_total.max(billed_total);
        let combined_billable = (combined > Decimal::ZERO).then_some(combined);

        let consolidated = best_consolidated_charge(
            &key.origin,
            first.dest_city.as_deref(),
            first.dest_province.as_deref(),
            combined_billable,
            Some(pallets_total),
            Some(weight_total),
            &entries_by_origin,
            config,
        );

        let Some((consolidated_charge, carrier)) = consolidated else {
            continue;
        };

        let incremental = individual_best_sum - consolidated_charge;
        if incremental <= Decimal::ZERO {
            continue;
        }

        savings_total += incremental;
        group_count += 1;

        let ship_date = match key.window {
            WindowKey::Week(_, _) => thursday_of_week(first.ship_date.unwrap_or_default()),
            WindowKey::Day(date) => date,
        };

        opportunities.push(ConsolidationOpportunity {
            origin_dc: first.origin_dc.clone().unwrap_or_else(|| "UNKNOWN".to_string()),
            dest_city: first.dest_city.clone().unwrap_or_default(),
            dest_province: first.dest_province.clone().unwrap_or_default(),
            ship_date,
            shipment_count: indices.len(),
            actual_sum,
            individual_best_sum,
            consolidated_charge,
            incremental_savings: incremental,
            carrier: Some(carrier),
        });
    }

    opportunities.sort_by(|a, b| b.incremental_savings.cmp(&a.incremental_savings));
    opportunities.truncate(config.consolidation_top_n);
    debug!(
        group_count,
        savings = %savings_total,
        returned = opportunities.len(),
        "Consolidation detection complete"
    );

    (savings_total, opportunities, group_count)
}

/// Best single-carrier charge for the combined load, with the same explicit
/// tie-break as per-shipment best-carrier selection
#[allow(clippy::too_many_arguments)]
fn best_consolidated_charge(
    origin_key: &str,
    dest_city: Option<&str>,
    dest_province: Option<&str>,
    combined_billable: Option<Decimal>,
    pallets: Option<Decimal>,
    scale_weight: Option<Decimal>,
    entries_by_origin: &HashMap<&str, Vec<&TariffEntry>>,
    config: &EngineConfig,
) -> Option<(Decimal, String)> {
    let mut best: Option<(Decimal, String)> = None;

    for entry in entries_by_origin.get(origin_key)?.iter() {
        let Some(lane) = entry.find_lane(dest_city, dest_province) else {
            continue;
        };
        let Some(charge) = rate_lane(
            lane,
            combined_billable,
            pallets,
            scale_weight,
            config.skid_weight_cap_per_spot,
        ) else {
            continue;
        };

        let better = match &best {
            None => true,
            Some((best_charge, best_name)) => {
                charge < *best_charge
                    || (charge == *best_charge && entry.carrier_name < *best_name)
            }
        };
        if better {
            best = Some((charge, entry.carrier_name.clone()));
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TariffSnapshot;
    use crate::pipeline::rerate_shipments;
    use freightlens_common::{Lane, MatchStatus, Tariff, TariffKind};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn tariff() -> Tariff {
        Tariff::new("Rosedale", "SCARB", TariffKind::Hundredweight).with_lane(
            Lane::city("Winnipeg", "MB")
                .with_min_charge(dec!(45))
                .with_weight_break(dec!(0), Some(dec!(500)), dec!(20))
                .with_weight_break(dec!(500), Some(dec!(1000)), dec!(18))
                .with_weight_break(dec!(1000), None, dec!(15)),
        )
    }

    fn shipment(weight: Decimal, actual: Decimal, date: NaiveDate) -> Shipment {
        Shipment::new(Uuid::new_v4())
            .with_origin("SCARB")
            .with_destination(Some("Winnipeg"), Some("MB"))
            .with_ship_date(date)
            .with_weights(Some(weight), None)
            .with_actual_charge(actual)
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    }

    #[test]
    fn test_thursday_of_week() {
        let thursday = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(thursday_of_week(monday()), thursday);
        assert_eq!(thursday_of_week(thursday), thursday);
    }

    #[test]
    fn test_weekly_group_detected() {
        let snapshot = TariffSnapshot::build(&[tariff()]);
        let entries = snapshot.select_entries(None);
        let config = EngineConfig::default();

        // Monday 750 lb and Wednesday 300 lb, same lane and week.
        // Individually: 8x18x1.53 = 220.32 and 3x20x1.53 = 91.80 (sum 312.12)
        // Combined 1050 lb: 11x15x1.53 = 252.45 -> incremental 59.67
        let shipments = vec![
            shipment(dec!(750), dec!(400), monday()),
            shipment(dec!(300), dec!(150), monday() + Duration::days(2)),
        ];
        let result = rerate_shipments(&shipments, &entries, &config);

        assert_eq!(result.consolidation_group_count, 1);
        let group = &result.consolidation_groups[0];
        assert_eq!(group.shipment_count, 2);
        assert_eq!(group.individual_best_sum, dec!(312.12));
        assert_eq!(group.consolidated_charge, dec!(252.45));
        assert_eq!(group.incremental_savings, dec!(59.67));
        assert_eq!(group.carrier.as_deref(), Some("Rosedale"));
        // Departs the Thursday of the grouping week
        assert_eq!(group.ship_date, NaiveDate::from_ymd_opt(2024, 3, 7).unwrap());
        assert_eq!(result.consolidation_savings_total, dec!(59.67));
    }

    #[test]
    fn test_friday_shipment_never_groups() {
        let snapshot = TariffSnapshot::build(&[tariff()]);
        let entries = snapshot.select_entries(None);
        let friday = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();

        let shipments = vec![
            shipment(dec!(750), dec!(400), friday),
            shipment(dec!(300), dec!(150), friday),
        ];
        let result = rerate_shipments(&shipments, &entries, &EngineConfig::default());

        assert_eq!(result.consolidation_group_count, 0);
        assert!(result.consolidation_groups.is_empty());
    }

    #[test]
    fn test_same_day_mode_groups_friday() {
        let snapshot = TariffSnapshot::build(&[tariff()]);
        let entries = snapshot.select_entries(None);
        let config = EngineConfig {
            weekly_consolidation: false,
            ..EngineConfig::default()
        };
        let friday = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();

        let shipments = vec![
            shipment(dec!(750), dec!(400), friday),
            shipment(dec!(300), dec!(150), friday),
        ];
        let result = rerate_shipments(&shipments, &entries, &config);

        assert_eq!(result.consolidation_group_count, 1);
        assert_eq!(result.consolidation_groups[0].ship_date, friday);
    }

    #[test]
    fn test_single_shipment_group_discarded() {
        let snapshot = TariffSnapshot::build(&[tariff()]);
        let entries = snapshot.select_entries(None);

        let shipments = vec![shipment(dec!(750), dec!(400), monday())];
        let result = rerate_shipments(&shipments, &entries, &EngineConfig::default());

        assert_eq!(result.consolidation_group_count, 0);
    }

    #[test]
    fn test_group_dropped_when_consolidation_costs_more() {
        let skid = Tariff::new("APPS", "CGY", TariffKind::Skid).with_lane(
            Lane::city("Winnipeg", "MB")
                .with_skid_break(1, dec!(100))
                .with_skid_break(2, dec!(300)),
        );
        let snapshot = TariffSnapshot::build(&[skid]);
        let entries = snapshot.select_entries(None);

        // One pallet each: 100 x 1.53 = 153.00 individually (sum 306.00);
        // combined 2 pallets: 300 x 1.53 = 459.00 > 306.00 -> dropped
        let make = |date| {
            Shipment::new(Uuid::new_v4())
                .with_origin("CGY")
                .with_destination(Some("Winnipeg"), Some("MB"))
                .with_ship_date(date)
                .with_pallets(dec!(1))
                .with_actual_charge(dec!(200))
        };
        let shipments = vec![make(monday()), make(monday())];
        let result = rerate_shipments(&shipments, &entries, &EngineConfig::default());

        assert_eq!(result.shipment_updates[0].best_charge, Some(dec!(153.00)));
        assert_eq!(result.consolidation_group_count, 0);
    }

    #[test]
    fn test_unmatched_member_falls_back_to_actual() {
        let snapshot = TariffSnapshot::build(&[tariff()]);
        let entries = snapshot.select_entries(None);

        // Second shipment has no weight, so no carrier matches; its actual
        // charge stands in for its individual best.
        let rated = shipment(dec!(750), dec!(400), monday());
        let unrated = Shipment::new(Uuid::new_v4())
            .with_origin("SCARB")
            .with_destination(Some("Winnipeg"), Some("MB"))
            .with_ship_date(monday())
            .with_actual_charge(dec!(500));

        let shipments = vec![rated, unrated];
        let result = rerate_shipments(&shipments, &entries, &EngineConfig::default());

        assert_eq!(
            result.shipment_updates[1].match_status,
            MatchStatus::NoLane
        );
        assert_eq!(result.consolidation_group_count, 1);
        let group = &result.consolidation_groups[0];
        // 220.32 (rated best) + 500.00 (actual fallback)
        assert_eq!(group.individual_best_sum, dec!(720.32));
    }

    #[test]
    fn test_top_n_truncates_but_counts_all() {
        let snapshot = TariffSnapshot::build(&[tariff()]);
        let entries = snapshot.select_entries(None);
        let config = EngineConfig {
            consolidation_top_n: 1,
            ..EngineConfig::default()
        };

        // Two distinct weeks, each with a saving group
        let week2 = monday() + Duration::days(7);
        let shipments = vec![
            shipment(dec!(750), dec!(400), monday()),
            shipment(dec!(300), dec!(150), monday()),
            shipment(dec!(750), dec!(400), week2),
            shipment(dec!(300), dec!(150), week2),
        ];
        let result = rerate_shipments(&shipments, &entries, &config);

        assert_eq!(result.consolidation_group_count, 2);
        assert_eq!(result.consolidation_groups.len(), 1);
        // Totals cover both groups
        assert_eq!(result.consolidation_savings_total, dec!(119.34));
    }
}
