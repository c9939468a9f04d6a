use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ReturnRecord: one customer return
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnRecord {
    pub return_date: NaiveDateTime,
    pub order_id: String,
    pub sku: String,
    pub product_name: String,
    pub quantity: i64,
    /// Unit price when the return report carries one.
    pub price: Option<f64>,
    pub reason: String,
    pub status: String,
    pub store_name: String,
}

/// A return with its unit price resolved and its value computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnValueRow {
    #[serde(flatten)]
    pub record: ReturnRecord,
    pub unit_price: f64,
    pub value: f64,
}

// ---------------------------------------------------------------------------
// ReturnsSummary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnsSummary {
    pub total_returns: usize,
    pub unique_skus: usize,
    pub return_rate_pct: f64,
    pub total_value: f64,
    pub avg_value: f64,
}
