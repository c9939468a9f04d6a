use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TrafficRecord: one child ASIN on one report day
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficRecord {
    pub report_date: NaiveDate,
    pub child_asin: String,
    pub sessions: i64,
    pub page_views: i64,
    pub units_ordered: i64,
    pub ordered_product_sales: f64,
    pub buy_box_percentage: f64,
    pub mobile_sessions: i64,
    pub browser_sessions: i64,
    pub mobile_page_views: i64,
    pub browser_page_views: i64,
}

// ---------------------------------------------------------------------------
// Report outputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficTotals {
    pub sessions: i64,
    pub page_views: i64,
    pub units: i64,
    pub revenue: f64,
    pub conversion_pct: f64,
    /// Mean of the per-row buy box percentages.
    pub buy_box_pct: f64,
    pub mobile_share_pct: f64,
    pub revenue_per_session: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsinTraffic {
    pub asin: String,
    pub sessions: i64,
    pub page_views: i64,
    pub units: i64,
    pub revenue: f64,
    pub buy_box_pct: f64,
    pub conversion_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTraffic {
    pub date: NaiveDate,
    pub sessions: i64,
    pub page_views: i64,
    pub units: i64,
    pub revenue: f64,
    pub conversion_pct: f64,
}
