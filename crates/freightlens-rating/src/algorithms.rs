//! Rating algorithms - pure functions pricing one shipment against one lane
//!
//! Business rules (carried unchanged from the analyst rate model):
//! 1. Hundredweight: `cwt = ceil(weight / 100)`, linehaul = cwt x tier rate,
//!    floored at the lane minimum charge
//! 2. Skid: flat charge for `ceil(pallets)` spots, clamped to the largest
//!    defined tier, subject to a per-spot weight cap
//! 3. Both: final charge = base x 1.53 (25% fuel + 13% tax + 15% margin as
//!    one additive multiplier), rounded to cents

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use freightlens_common::{FUEL_TAX_MARGIN_MULTIPLIER, LBS_PER_CWT};

use crate::cache::{LaneRates, RateSchedule, WeightBreak};

/// Apply the fuel/tax/margin multiplier and round to cents
fn finalize(base: Decimal) -> Decimal {
    (base * FUEL_TAX_MARGIN_MULTIPLIER)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rate a shipment against a hundredweight lane
///
/// Returns `None` when the weight is absent or non-positive, or when no
/// break can be selected.
pub fn rate_hundredweight(
    billable_weight: Option<Decimal>,
    breaks: &[WeightBreak],
    min_charge: Decimal,
) -> Option<Decimal> {
    let weight = billable_weight.filter(|w| *w > Decimal::ZERO)?;
    let cwt = (weight / LBS_PER_CWT).ceil();

    // Breaks arrive sorted by start ascending. A well-formed lane covers
    // [0, inf), so containment always hits; the largest-start-below fallback
    // only fires on a lane with a gap.
    let selected = breaks
        .iter()
        .find(|br| br.contains(weight))
        .or_else(|| breaks.iter().filter(|br| br.start <= weight).last())?;

    let linehaul = cwt * selected.rate_per_cwt;
    let base = linehaul.max(min_charge);
    Some(finalize(base))
}

/// Rate a shipment against a skid/spot lane
///
/// Returns `None` when the lane defines no spot tiers or the shipment is too
/// heavy for its declared spot count. A shipment needing more spots than the
/// tariff defines is priced at the maximum tier - a documented approximation,
/// not an error.
pub fn rate_skid(
    pallets: Option<Decimal>,
    weight: Option<Decimal>,
    spot_charges: &BTreeMap<u32, Decimal>,
    weight_cap_per_spot: Decimal,
) -> Option<Decimal> {
    let pallets = pallets.unwrap_or(Decimal::ONE);
    let spots = pallets.ceil().to_u32().unwrap_or(1).max(1);

    if let Some(weight) = weight {
        if weight > weight_cap_per_spot * Decimal::from(spots) {
            return None;
        }
    }

    let (&max_spots, _) = spot_charges.last_key_value()?;
    let charge = spot_charges.get(&spots.min(max_spots))?;
    Some(finalize(*charge))
}

/// Rate a shipment against a lane, dispatching on the lane's rate schedule
pub fn rate_lane(
    lane: &LaneRates,
    billable_weight: Option<Decimal>,
    pallets: Option<Decimal>,
    scale_weight: Option<Decimal>,
    skid_weight_cap_per_spot: Decimal,
) -> Option<Decimal> {
    match &lane.schedule {
        RateSchedule::Hundredweight(breaks) => {
            rate_hundredweight(billable_weight, breaks, lane.min_charge)
        }
        RateSchedule::Skid(spot_charges) => {
            rate_skid(pallets, scale_weight, spot_charges, skid_weight_cap_per_spot)
        }
    }
}

/// Pick the carrier with the lowest charge
///
/// Exact ties resolve to the lexicographically smallest carrier name, so the
/// winner is stable across cache rebuild orders.
pub fn best_carrier(charges: &BTreeMap<String, Decimal>) -> Option<(String, Decimal)> {
    charges
        .iter()
        .min_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(carrier, charge)| (carrier.clone(), *charge))
}
