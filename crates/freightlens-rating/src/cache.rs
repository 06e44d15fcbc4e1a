//! Tariff cache - immutable, query-optimized snapshot of all carrier tariffs
//!
//! The snapshot is built lazily from a [`TariffSource`], held behind a
//! read/write lock as an atomically-swapped `Arc`, and rebuilt when stale or
//! on a forced refresh (e.g. after new tariff ingestion). At most one rebuild
//! runs at a time; readers arriving mid-rebuild wait for the fresh snapshot.
//! Once built, a snapshot is immutable and safe for unlimited concurrent
//! readers without further locking.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use freightlens_common::types::normalize_key;
use freightlens_common::{RateBreak, Result, Tariff, TariffKind};

/// Supplies the tariffs a snapshot is built from
///
/// Implemented by the caller; typically backed by the persistence layer.
#[async_trait]
pub trait TariffSource: Send + Sync {
    /// Load every tariff that should participate in rating
    async fn load_tariffs(&self) -> Result<Vec<Tariff>>;
}

/// A hundredweight break in query form: range `[start, end)`, open top tier
#[derive(Debug, Clone, PartialEq)]
pub struct WeightBreak {
    pub start: Decimal,
    pub end: Option<Decimal>,
    pub rate_per_cwt: Decimal,
}

impl WeightBreak {
    /// Whether `weight` falls in `[start, end)`; an unbounded top break
    /// matches any weight at or above its start
    pub fn contains(&self, weight: Decimal) -> bool {
        weight >= self.start && self.end.map_or(true, |end| weight < end)
    }
}

/// Rate schedule for one lane, tagged by the owning tariff's structure
#[derive(Debug, Clone)]
pub enum RateSchedule {
    /// Breaks sorted by start weight ascending
    Hundredweight(Vec<WeightBreak>),
    /// Flat charge per spot count
    Skid(BTreeMap<u32, Decimal>),
}

/// Query-optimized rates for one lane
#[derive(Debug, Clone)]
pub struct LaneRates {
    /// Minimum charge floor; zero when the source lane carried none
    pub min_charge: Decimal,
    /// The lane's rate schedule
    pub schedule: RateSchedule,
}

/// One tariff's cache entry with the two-tier destination index
#[derive(Debug, Clone)]
pub struct TariffEntry {
    /// Source tariff ID
    pub id: Uuid,
    /// Carrier name
    pub carrier_name: String,
    /// Normalized origin DC key
    pub origin_key: String,
    /// Exact (city, province) lanes
    lanes_by_city: HashMap<(String, String), LaneRates>,
    /// Province-wide fallback lanes
    lanes_by_province: HashMap<String, LaneRates>,
}

impl TariffEntry {
    /// Resolve the lane for a destination: city+province match first, then
    /// the province-only fallback. Destination province is mandatory; a
    /// shipment without one never matches.
    pub fn find_lane(
        &self,
        dest_city: Option<&str>,
        dest_province: Option<&str>,
    ) -> Option<&LaneRates> {
        let prov_key = normalize_key(dest_province);
        if prov_key.is_empty() {
            return None;
        }
        let city_key = normalize_key(dest_city);
        if !city_key.is_empty() {
            if let Some(lane) = self.lanes_by_city.get(&(city_key, prov_key.clone())) {
                return Some(lane);
            }
        }
        self.lanes_by_province.get(&prov_key)
    }

    fn from_tariff(tariff: &Tariff) -> Self {
        let mut entry = Self {
            id: tariff.id,
            carrier_name: tariff.carrier_name.clone(),
            origin_key: normalize_key(Some(&tariff.origin_dc)),
            lanes_by_city: HashMap::new(),
            lanes_by_province: HashMap::new(),
        };

        for lane in &tariff.lanes {
            let rates = build_lane_rates(tariff.kind, lane.min_charge, &lane.breaks);
            let prov_key = normalize_key(Some(&lane.dest_province));
            match lane.dest_city.as_deref() {
                // Duplicate lane keys within one tariff: last lane wins
                Some(city) => {
                    let city_key = normalize_key(Some(city));
                    entry.lanes_by_city.insert((city_key, prov_key), rates);
                }
                None => {
                    entry.lanes_by_province.insert(prov_key, rates);
                }
            }
        }

        entry
    }
}

fn build_lane_rates(kind: TariffKind, min_charge: Option<Decimal>, breaks: &[RateBreak]) -> LaneRates {
    let schedule = match kind {
        TariffKind::Hundredweight => {
            let mut weight_breaks: Vec<WeightBreak> = breaks
                .iter()
                .filter_map(|br| match br {
                    RateBreak::Hundredweight {
                        start,
                        end,
                        rate_per_cwt,
                    } => Some(WeightBreak {
                        start: *start,
                        end: *end,
                        rate_per_cwt: *rate_per_cwt,
                    }),
                    RateBreak::Skid { .. } => None,
                })
                .collect();
            weight_breaks.sort_by(|a, b| a.start.cmp(&b.start));
            RateSchedule::Hundredweight(weight_breaks)
        }
        TariffKind::Skid => {
            let spots = breaks
                .iter()
                .filter_map(|br| match br {
                    RateBreak::Skid { spots, charge } => Some((*spots, *charge)),
                    RateBreak::Hundredweight { .. } => None,
                })
                .collect();
            RateSchedule::Skid(spots)
        }
    };

    LaneRates {
        min_charge: min_charge.unwrap_or(Decimal::ZERO),
        schedule,
    }
}

/// Immutable snapshot of every cached tariff
#[derive(Debug)]
pub struct TariffSnapshot {
    /// Entries in source order
    pub entries: Vec<TariffEntry>,
    /// Build timestamp, used for TTL staleness
    pub built_at: DateTime<Utc>,
}

impl TariffSnapshot {
    /// Build a snapshot from tariff records
    pub fn build(tariffs: &[Tariff]) -> Self {
        let entries = tariffs.iter().map(TariffEntry::from_tariff).collect();
        Self {
            entries,
            built_at: Utc::now(),
        }
    }

    /// Time elapsed since the snapshot was built
    pub fn age(&self) -> Duration {
        Utc::now() - self.built_at
    }

    /// Entries filtered to an optional tariff-id subset, in snapshot order
    pub fn select_entries(&self, tariff_ids: Option<&[Uuid]>) -> Vec<&TariffEntry> {
        match tariff_ids {
            Some(ids) => self
                .entries
                .iter()
                .filter(|entry| ids.contains(&entry.id))
                .collect(),
            None => self.entries.iter().collect(),
        }
    }
}

/// Lock-guarded holder of the current snapshot
pub struct TariffCache {
    source: Arc<dyn TariffSource>,
    ttl: Duration,
    slot: RwLock<Option<Arc<TariffSnapshot>>>,
}

impl TariffCache {
    /// Create a cache over a tariff source with the given TTL in seconds
    pub fn new(source: Arc<dyn TariffSource>, ttl_secs: u64) -> Self {
        Self {
            source,
            ttl: Duration::seconds(ttl_secs as i64),
            slot: RwLock::new(None),
        }
    }

    /// Get the current snapshot, rebuilding when missing, stale, or forced
    pub async fn get(&self, force_reload: bool) -> Result<Arc<TariffSnapshot>> {
        if !force_reload {
            let slot = self.slot.read().await;
            if let Some(snapshot) = slot.as_ref() {
                if snapshot.age() <= self.ttl {
                    return Ok(Arc::clone(snapshot));
                }
                debug!(age_secs = snapshot.age().num_seconds(), "Tariff snapshot stale");
            }
        }

        // Rebuild under the write lock; a second caller that queued behind
        // the same rebuild re-checks and reuses the fresh snapshot.
        let mut slot = self.slot.write().await;
        if !force_reload {
            if let Some(snapshot) = slot.as_ref() {
                if snapshot.age() <= self.ttl {
                    return Ok(Arc::clone(snapshot));
                }
            }
        }

        let tariffs = self.source.load_tariffs().await?;
        let snapshot = Arc::new(TariffSnapshot::build(&tariffs));
        info!(
            tariff_count = snapshot.entries.len(),
            "Rebuilt tariff snapshot"
        );
        *slot = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }
}
