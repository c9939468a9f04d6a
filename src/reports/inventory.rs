//! Inventory value, aging and the raw snapshot table.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::aggregate::{mean, ratio, top_n, GroupBy};
use crate::config::AGE_BUCKETS;
use crate::insights::inventory_insights;
use crate::models::{
    AgeBucketUnits, InsightCard, InventoryDelta, InventorySnapshot, InventorySummary, KeyedValue,
    StockValueRow, VelocityPoint,
};
use crate::snapshot::{latest_day, latest_per_day, previous_period, select_as_of, snapshot_dates};

use super::{Loader, ReportParams};

/// How far back the comparison snapshot is looked for.
pub const DELTA_LOOKBACK_DAYS: i64 = 7;
pub const TOP_BY_AVAILABLE: usize = 15;
pub const TOP_BY_VALUE: usize = 10;

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryValueReport {
    pub summary: InventorySummary,
    pub top_by_value: Vec<StockValueRow>,
    pub top_by_available: Vec<StockValueRow>,
    pub value_by_store: Vec<KeyedValue>,
    pub insights: Vec<InsightCard>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgingReport {
    pub as_of: Option<NaiveDate>,
    /// Non-empty brackets only, youngest first.
    pub buckets: Vec<AgeBucketUnits>,
    pub velocity: Vec<VelocityPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryTable {
    pub as_of: Option<NaiveDate>,
    /// Every snapshot day on record, newest first.
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<InventorySnapshot>,
}

// ---------------------------------------------------------------------------
// Pure computations
// ---------------------------------------------------------------------------

/// Headline figures for `current`, with the change against the newest day of
/// `previous` when there is one.
pub fn summarize(current: &[InventorySnapshot], previous: &[InventorySnapshot]) -> InventorySummary {
    let total_units: i64 = current.iter().map(|r| r.available).sum();
    let total_value: f64 = current.iter().map(InventorySnapshot::stock_value).sum();
    let priced: Vec<f64> = current
        .iter()
        .map(|r| r.price)
        .filter(|p| *p > 0.0)
        .collect();
    let velocity: f64 = current.iter().filter_map(|r| r.velocity).sum();

    let prev = latest_day(previous);
    let delta = prev.first().map(|first| {
        let prev_units: i64 = prev.iter().map(|r| r.available).sum();
        let prev_value: f64 = prev.iter().map(InventorySnapshot::stock_value).sum();
        InventoryDelta {
            as_of: first.snapshot_date(),
            units_delta: total_units - prev_units,
            value_delta: total_value - prev_value,
            sku_count_delta: current.len() as i64 - prev.len() as i64,
        }
    });

    InventorySummary {
        as_of: current.iter().map(InventorySnapshot::snapshot_date).max(),
        sku_count: current.len(),
        total_units,
        total_value,
        velocity_30d_units: velocity * 30.0,
        avg_price: mean(&priced),
        value_per_unit: ratio(total_value, total_units as f64),
        previous: delta,
    }
}

/// Units per age bracket in bracket order, empty brackets left out.
pub fn age_buckets(rows: &[InventorySnapshot]) -> Vec<AgeBucketUnits> {
    AGE_BUCKETS
        .iter()
        .map(|bucket| AgeBucketUnits {
            bucket: bucket.to_string(),
            units: rows
                .iter()
                .filter_map(|r| r.age_buckets.get(*bucket))
                .sum(),
        })
        .filter(|b| b.units > 0.0)
        .collect()
}

/// Stock against sell-through for SKUs that hold priced stock and report a
/// velocity.
pub fn velocity_points(rows: &[InventorySnapshot]) -> Vec<VelocityPoint> {
    rows.iter()
        .filter(|r| r.available > 0 && r.stock_value() > 0.0)
        .filter_map(|r| {
            r.velocity.filter(|v| *v >= 0.0).map(|velocity| VelocityPoint {
                sku: r.sku.clone(),
                store_name: r.store_name.clone(),
                available: r.available,
                velocity,
                stock_value: r.stock_value(),
            })
        })
        .collect()
}

/// Stock value per store, largest first.
pub fn value_by_store(rows: &[InventorySnapshot]) -> Vec<KeyedValue> {
    let grouped: Vec<KeyedValue> = GroupBy::new(rows, |r| r.store_name.clone())
        .sum("value", InventorySnapshot::stock_value)
        .finish()
        .into_iter()
        .map(|row| KeyedValue {
            value: row.get("value"),
            key: row.key,
        })
        .collect();
    top_n(&grouped, grouped.len(), |k| k.value)
}

// ---------------------------------------------------------------------------
// InventoryQuery
// ---------------------------------------------------------------------------

/// Query interface for the inventory snapshot table.
pub struct InventoryQuery<'a> {
    loader: Loader<'a>,
}

impl<'a> InventoryQuery<'a> {
    pub(crate) fn new(loader: Loader<'a>) -> Self {
        Self { loader }
    }

    /// Every snapshot, one per SKU and day.
    pub fn snapshots(&self) -> Vec<InventorySnapshot> {
        latest_per_day(&self.loader.inventory())
    }

    /// Snapshot days on record, newest first.
    pub fn snapshot_dates(&self) -> Vec<NaiveDate> {
        snapshot_dates(&self.loader.inventory())
    }

    fn for_store(&self, params: &ReportParams) -> Vec<InventorySnapshot> {
        let rows = self.snapshots();
        match params.store.as_deref() {
            Some(store) => rows.into_iter().filter(|r| r.store_name == store).collect(),
            None => rows,
        }
    }

    /// The stock position to report on.
    ///
    /// With `as_of` set, each SKU's latest snapshot on or before that day;
    /// otherwise the SKUs captured on the newest day.
    pub fn current(&self, params: &ReportParams) -> Vec<InventorySnapshot> {
        let rows = self.for_store(params);
        match params.as_of {
            Some(day) => select_as_of(&rows, day),
            None => latest_day(&rows),
        }
    }

    pub fn summary(&self, params: &ReportParams) -> InventorySummary {
        let rows = self.for_store(params);
        let current = match params.as_of {
            Some(day) => select_as_of(&rows, day),
            None => latest_day(&rows),
        };
        let previous = match current.iter().map(InventorySnapshot::snapshot_date).max() {
            Some(day) => previous_period(&rows, day, DELTA_LOOKBACK_DAYS),
            None => Vec::new(),
        };
        summarize(&current, &previous)
    }

    pub fn value_report(&self, params: &ReportParams) -> InventoryValueReport {
        let current = self.current(params);
        let rows: Vec<StockValueRow> = current.iter().map(StockValueRow::from).collect();
        InventoryValueReport {
            summary: self.summary(params),
            top_by_value: top_n(&rows, TOP_BY_VALUE, |r| r.stock_value),
            top_by_available: top_n(&rows, TOP_BY_AVAILABLE, |r| r.available as f64),
            value_by_store: value_by_store(&current),
            insights: inventory_insights(&current),
        }
    }

    pub fn aging_report(&self, params: &ReportParams) -> AgingReport {
        let current = self.current(params);
        AgingReport {
            as_of: current.iter().map(InventorySnapshot::snapshot_date).max(),
            buckets: age_buckets(&current),
            velocity: velocity_points(&current),
        }
    }

    pub fn table(&self, params: &ReportParams) -> InventoryTable {
        let current = self.current(params);
        InventoryTable {
            as_of: current.iter().map(InventorySnapshot::snapshot_date).max(),
            dates: self.snapshot_dates(),
            rows: current,
        }
    }
}
