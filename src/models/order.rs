use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Order: one order line
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub sku: String,
    pub order_date: NaiveDateTime,
    pub quantity: i64,
    pub item_price: f64,
    pub item_tax: f64,
    pub shipping_price: f64,
    pub status: String,
    pub store_name: String,
}

impl Order {
    /// `item_price × quantity`; the revenue figure of the orders report.
    pub fn line_total(&self) -> f64 {
        self.item_price * self.quantity as f64
    }

    /// `item_price + item_tax + shipping_price`; what the buyer was charged.
    pub fn charged_total(&self) -> f64 {
        self.item_price + self.item_tax + self.shipping_price
    }

    pub fn order_day(&self) -> NaiveDate {
        self.order_date.date()
    }
}

// ---------------------------------------------------------------------------
// OrdersSummary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdersSummary {
    pub order_count: usize,
    pub revenue: f64,
    pub items: i64,
    pub avg_order_value: f64,
    /// Revenue over the covered span, at least one day.
    pub revenue_per_day: f64,
    pub monthly_projection: f64,
}
