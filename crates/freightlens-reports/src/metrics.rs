//! Per-shipment cost metrics and exception flags

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use freightlens_common::Shipment;

/// Billed weight more than 10% above scale weight raises `DimHeavy`
const DIM_HEAVY_TOLERANCE: Decimal = dec!(1.1);

/// Unit-cost metrics for one shipment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostMetrics {
    /// Actual charge per pound of scale weight
    pub cost_per_lb: Option<Decimal>,
    /// Actual charge per pallet
    pub cost_per_pallet: Option<Decimal>,
}

/// Compute cost per lb and cost per pallet; absent where a denominator is
/// missing or non-positive
pub fn compute_cost_metrics(shipment: &Shipment) -> CostMetrics {
    let charge = shipment.actual_charge.filter(|c| *c > Decimal::ZERO);

    let cost_per_lb = match (charge, shipment.weight) {
        (Some(charge), Some(weight)) if weight > Decimal::ZERO => Some(charge / weight),
        _ => None,
    };
    let cost_per_pallet = match (charge, shipment.pallets) {
        (Some(charge), Some(pallets)) if pallets > Decimal::ZERO => Some(charge / pallets),
        _ => None,
    };

    CostMetrics {
        cost_per_lb,
        cost_per_pallet,
    }
}

/// Data-quality exception raised on a shipment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExceptionFlag {
    /// Missing or non-positive actual charge
    ZeroCharge,
    /// Positive charge with missing or non-positive scale weight
    ZeroWeight,
    /// Positive charge with missing or non-positive pallet count
    ZeroPallets,
    /// Billed weight more than 10% above scale weight
    DimHeavy,
}

/// Compute exception flags for a shipment
pub fn compute_flags(shipment: &Shipment) -> Vec<ExceptionFlag> {
    let mut flags = Vec::new();

    let charge = shipment.actual_charge.unwrap_or(Decimal::ZERO);
    if charge <= Decimal::ZERO {
        flags.push(ExceptionFlag::ZeroCharge);
    } else {
        if shipment.weight.unwrap_or(Decimal::ZERO) <= Decimal::ZERO {
            flags.push(ExceptionFlag::ZeroWeight);
        }
        if shipment.pallets.unwrap_or(Decimal::ZERO) <= Decimal::ZERO {
            flags.push(ExceptionFlag::ZeroPallets);
        }
    }

    if let (Some(billed), Some(weight)) = (shipment.billed_weight, shipment.weight) {
        if billed != Decimal::ZERO
            && weight != Decimal::ZERO
            && billed > weight * DIM_HEAVY_TOLERANCE
        {
            flags.push(ExceptionFlag::DimHeavy);
        }
    }

    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_cost_metrics() {
        let shipment = Shipment::new(Uuid::new_v4())
            .with_weights(Some(dec!(500)), None)
            .with_pallets(dec!(2))
            .with_actual_charge(dec!(250));

        let metrics = compute_cost_metrics(&shipment);
        assert_eq!(metrics.cost_per_lb, Some(dec!(0.5)));
        assert_eq!(metrics.cost_per_pallet, Some(dec!(125)));
    }

    #[test]
    fn test_cost_metrics_missing_denominators() {
        let shipment = Shipment::new(Uuid::new_v4()).with_actual_charge(dec!(250));
        let metrics = compute_cost_metrics(&shipment);
        assert_eq!(metrics.cost_per_lb, None);
        assert_eq!(metrics.cost_per_pallet, None);
    }

    #[test]
    fn test_zero_charge_flag() {
        let shipment = Shipment::new(Uuid::new_v4()).with_weights(Some(dec!(500)), None);
        assert_eq!(compute_flags(&shipment), vec![ExceptionFlag::ZeroCharge]);
    }

    #[test]
    fn test_zero_weight_and_pallet_flags() {
        let shipment = Shipment::new(Uuid::new_v4()).with_actual_charge(dec!(250));
        let flags = compute_flags(&shipment);
        assert!(flags.contains(&ExceptionFlag::ZeroWeight));
        assert!(flags.contains(&ExceptionFlag::ZeroPallets));
        assert!(!flags.contains(&ExceptionFlag::ZeroCharge));
    }

    #[test]
    fn test_dim_heavy_flag() {
        let heavy = Shipment::new(Uuid::new_v4())
            .with_weights(Some(dec!(1000)), Some(dec!(1200)))
            .with_pallets(dec!(2))
            .with_actual_charge(dec!(250));
        assert_eq!(compute_flags(&heavy), vec![ExceptionFlag::DimHeavy]);

        // Inside the 10% tolerance
        let ok = Shipment::new(Uuid::new_v4())
            .with_weights(Some(dec!(1000)), Some(dec!(1050)))
            .with_pallets(dec!(2))
            .with_actual_charge(dec!(250));
        assert!(compute_flags(&ok).is_empty());
    }

    #[test]
    fn test_flag_wire_format() {
        let json = serde_json::to_string(&ExceptionFlag::DimHeavy).unwrap();
        assert_eq!(json, "\"DIM_HEAVY\"");
    }
}
