//! Shipment record - normalized input to the rating engine
//!
//! Shipments arrive already normalized from the ingestion layer (file
//! parsing and column mapping are not this crate's concern). The engine
//! never mutates a shipment; every rerate outcome is a fresh
//! [`RatingUpdate`](super::rating::RatingUpdate) addressed by shipment id.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::normalize_key;

/// One normalized shipment row from a carrier invoice file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    /// Unique shipment ID
    pub id: Uuid,
    /// Audit run this shipment belongs to
    pub audit_run_id: Uuid,
    /// Carrier's own reference number, if the file carried one
    pub shipment_ref: Option<String>,
    /// Origin distribution centre code (e.g. "SCARB", "CGY")
    pub origin_dc: Option<String>,
    /// Destination city
    pub dest_city: Option<String>,
    /// Destination province/state
    pub dest_province: Option<String>,
    /// Coarse destination region used by reporting (e.g. "West", "ON")
    pub dest_region: Option<String>,
    /// Ship date
    pub ship_date: Option<NaiveDate>,
    /// Pallet count (fractional pallets occur in source files)
    pub pallets: Option<Decimal>,
    /// Scale weight in pounds
    pub weight: Option<Decimal>,
    /// Billed/dimensional weight in pounds (the weight the carrier charged on)
    pub billed_weight: Option<Decimal>,
    /// Charge actually paid to the carrier
    pub actual_charge: Option<Decimal>,
    /// Carrier that moved the shipment
    pub carrier: Option<String>,
}

impl Shipment {
    /// Create a new shipment for an audit run, fields unset
    pub fn new(audit_run_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            audit_run_id,
            shipment_ref: None,
            origin_dc: None,
            dest_city: None,
            dest_province: None,
            dest_region: None,
            ship_date: None,
            pallets: None,
            weight: None,
            billed_weight: None,
            actual_charge: None,
            carrier: None,
        }
    }

    /// Set origin DC code
    pub fn with_origin(mut self, origin_dc: impl Into<String>) -> Self {
        self.origin_dc = Some(origin_dc.into());
        self
    }

    /// Set destination city and province
    pub fn with_destination(
        mut self,
        dest_city: Option<&str>,
        dest_province: Option<&str>,
    ) -> Self {
        self.dest_city = dest_city.map(String::from);
        self.dest_province = dest_province.map(String::from);
        self
    }

    /// Set ship date
    pub fn with_ship_date(mut self, ship_date: NaiveDate) -> Self {
        self.ship_date = Some(ship_date);
        self
    }

    /// Set pallet count
    pub fn with_pallets(mut self, pallets: Decimal) -> Self {
        self.pallets = Some(pallets);
        self
    }

    /// Set scale and billed weights
    pub fn with_weights(mut self, weight: Option<Decimal>, billed_weight: Option<Decimal>) -> Self {
        self.weight = weight;
        self.billed_weight = billed_weight;
        self
    }

    /// Set the charge actually paid
    pub fn with_actual_charge(mut self, actual_charge: Decimal) -> Self {
        self.actual_charge = Some(actual_charge);
        self
    }

    /// Normalized origin key; shipments with no origin group under "UNKNOWN"
    pub fn origin_key(&self) -> String {
        let key = normalize_key(self.origin_dc.as_deref());
        if key.is_empty() {
            "UNKNOWN".to_string()
        } else {
            key
        }
    }

    /// Normalized destination city key (empty when absent)
    pub fn dest_city_key(&self) -> String {
        normalize_key(self.dest_city.as_deref())
    }

    /// Normalized destination province key (empty when absent)
    pub fn dest_province_key(&self) -> String {
        normalize_key(self.dest_province.as_deref())
    }

    /// Billable weight: the greater of scale and billed weight, over whichever
    /// of the two is present and positive. `None` when neither qualifies -
    /// such a shipment cannot be rated by weight.
    pub fn billable_weight(&self) -> Option<Decimal> {
        [self.weight, self.billed_weight]
            .into_iter()
            .flatten()
            .filter(|w| *w > Decimal::ZERO)
            .max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_billable_weight_prefers_heavier() {
        let shipment = Shipment::new(Uuid::new_v4()).with_weights(Some(dec!(750)), Some(dec!(910)));
        assert_eq!(shipment.billable_weight(), Some(dec!(910)));
    }

    #[test]
    fn test_billable_weight_ignores_nonpositive() {
        let shipment = Shipment::new(Uuid::new_v4()).with_weights(Some(dec!(0)), Some(dec!(-5)));
        assert_eq!(shipment.billable_weight(), None);

        let shipment = Shipment::new(Uuid::new_v4()).with_weights(None, Some(dec!(420)));
        assert_eq!(shipment.billable_weight(), Some(dec!(420)));
    }

    #[test]
    fn test_origin_key_normalizes() {
        let shipment = Shipment::new(Uuid::new_v4()).with_origin(" scarb ");
        assert_eq!(shipment.origin_key(), "SCARB");

        let blank = Shipment::new(Uuid::new_v4());
        assert_eq!(blank.origin_key(), "UNKNOWN");
    }

    #[test]
    fn test_destination_keys() {
        let shipment =
            Shipment::new(Uuid::new_v4()).with_destination(Some("Toronto"), Some(" on "));
        assert_eq!(shipment.dest_city_key(), "TORONTO");
        assert_eq!(shipment.dest_province_key(), "ON");
    }
}
