use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// InventorySnapshot: one SKU as captured by one ingestion run
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    pub sku: String,
    pub asin: String,
    pub store_name: String,
    pub product_name: String,
    pub available: i64,
    pub inbound: i64,
    pub reserved: i64,
    pub price: f64,
    /// Average daily units sold; `None` when the source carries no velocity column.
    pub velocity: Option<f64>,
    /// Units per age bracket, keyed by bracket name.
    pub age_buckets: BTreeMap<String, f64>,
    pub created_at: NaiveDateTime,
}

impl InventorySnapshot {
    pub fn stock_value(&self) -> f64 {
        self.available as f64 * self.price
    }

    pub fn snapshot_date(&self) -> NaiveDate {
        self.created_at.date()
    }

    /// Velocity was reported and is exactly zero.
    pub fn is_dead_stock(&self) -> bool {
        matches!(self.velocity, Some(v) if v == 0.0)
    }
}

// ---------------------------------------------------------------------------
// Report outputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySummary {
    pub as_of: Option<NaiveDate>,
    pub sku_count: usize,
    pub total_units: i64,
    pub total_value: f64,
    /// Units expected to sell over 30 days at the current velocity.
    pub velocity_30d_units: f64,
    /// Mean price over priced SKUs only.
    pub avg_price: f64,
    pub value_per_unit: f64,
    pub previous: Option<InventoryDelta>,
}

/// Change versus the latest snapshot of the lookback window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryDelta {
    pub as_of: NaiveDate,
    pub units_delta: i64,
    pub value_delta: f64,
    pub sku_count_delta: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockValueRow {
    pub sku: String,
    pub product_name: String,
    pub store_name: String,
    pub available: i64,
    pub price: f64,
    pub stock_value: f64,
}

impl From<&InventorySnapshot> for StockValueRow {
    fn from(s: &InventorySnapshot) -> Self {
        Self {
            sku: s.sku.clone(),
            product_name: s.product_name.clone(),
            store_name: s.store_name.clone(),
            available: s.available,
            price: s.price,
            stock_value: s.stock_value(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeBucketUnits {
    pub bucket: String,
    pub units: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityPoint {
    pub sku: String,
    pub store_name: String,
    pub available: i64,
    pub velocity: f64,
    pub stock_value: f64,
}
