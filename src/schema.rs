//! Schema normalization.
//!
//! Raw rows come from tables whose column spelling depends on which export
//! produced them. Each domain has a priority-ordered alias list per canonical
//! field (see [`Domain::aliases`]); a [`ColumnMap`] resolves it once for the
//! whole row set and the per-domain functions read canonical fields through it.
//!
//! Nothing in here fails on a bad row: numbers that do not parse become zero
//! and rows without a usable required date are skipped.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;

use crate::config::{Domain, AGE_BUCKETS};
use crate::connection::Row;
use crate::models::{InventorySnapshot, Order, ReturnRecord, Review, Settlement, TrafficRecord};

// ---------------------------------------------------------------------------
// ColumnMap
// ---------------------------------------------------------------------------

/// Canonical field name to the source column chosen for it.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    domain: Domain,
    resolved: HashMap<&'static str, String>,
    missing: Vec<&'static str>,
}

impl ColumnMap {
    /// Resolve the alias table of `domain` against the columns present in `rows`.
    pub fn resolve(domain: Domain, rows: &[Row]) -> Self {
        let mut present: HashSet<&str> = HashSet::new();
        for row in rows {
            present.extend(row.keys().map(String::as_str));
        }
        Self::from_columns(domain, present)
    }

    pub fn from_columns<'a, I>(domain: Domain, columns: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let present: HashSet<&str> = columns.into_iter().collect();
        let mut resolved = HashMap::new();
        let mut missing = Vec::new();
        for (field, aliases) in domain.aliases() {
            match aliases.iter().find(|a| present.contains(**a)) {
                Some(source) => {
                    resolved.insert(*field, source.to_string());
                }
                None => missing.push(*field),
            }
        }
        if !missing.is_empty() && !present.is_empty() {
            tracing::debug!(
                domain = ?domain,
                missing = ?missing,
                "source is missing canonical columns, defaulting"
            );
        }
        Self {
            domain,
            resolved,
            missing,
        }
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Source column chosen for `field`, if any alias was present.
    pub fn source(&self, field: &str) -> Option<&str> {
        self.resolved.get(field).map(String::as_str)
    }

    pub fn has(&self, field: &str) -> bool {
        self.resolved.contains_key(field)
    }

    /// Canonical fields for which no alias was found.
    pub fn missing(&self) -> &[&'static str] {
        &self.missing
    }

    fn value<'r>(&self, row: &'r Row, field: &str) -> Option<&'r Value> {
        self.source(field).and_then(|col| row.get(col))
    }

    pub fn number(&self, row: &Row, field: &str) -> f64 {
        self.value(row, field).map(coerce_f64).unwrap_or(0.0)
    }

    pub fn int(&self, row: &Row, field: &str) -> i64 {
        self.number(row, field) as i64
    }

    pub fn text(&self, row: &Row, field: &str) -> String {
        self.value(row, field).map(coerce_text).unwrap_or_default()
    }

    pub fn flag(&self, row: &Row, field: &str) -> bool {
        self.value(row, field).map(coerce_bool).unwrap_or(false)
    }

    pub fn datetime(&self, row: &Row, field: &str) -> Option<NaiveDateTime> {
        match self.value(row, field)? {
            Value::String(s) => parse_datetime(s),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Coercion
// ---------------------------------------------------------------------------

/// Lenient numeric coercion: JSON numbers, booleans and numeric text with
/// currency symbols, thousands separators or a percent sign. Anything else is 0.
pub fn coerce_f64(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::String(s) => parse_number(s).unwrap_or(0.0),
        _ => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

fn parse_number(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | '¥' | '₴' | ',' | '%' | ' ' | '\u{a0}'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

pub fn coerce_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

pub fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "t" | "1" | "yes" | "y" | "verified"
        ),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Tolerant timestamp parser. Ambiguous numeric dates are read day-first.
/// Date-only input maps to midnight.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    let s = s.strip_suffix(" UTC").unwrap_or(s);
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    parse_date(s).map(|d| d.and_time(NaiveTime::MIN))
}

/// Tolerant date parser, including review captions such as
/// `Reviewed in the United States on March 5, 2024`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    if let Some(idx) = s.rfind(" on ") {
        return parse_date(&s[idx + 4..]);
    }
    // Timestamps: keep the calendar day
    if s.len() > 10 && s.is_char_boundary(10) {
        if let Ok(d) = NaiveDate::parse_from_str(&s[..10], "%Y-%m-%d") {
            return Some(d);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// Canonical records of one domain.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Inventory(Vec<InventorySnapshot>),
    Orders(Vec<Order>),
    Settlements(Vec<Settlement>),
    Traffic(Vec<TrafficRecord>),
    Returns(Vec<ReturnRecord>),
    Reviews(Vec<Review>),
}

impl Frame {
    pub fn empty(domain: Domain) -> Self {
        match domain {
            Domain::Inventory => Frame::Inventory(Vec::new()),
            Domain::Orders => Frame::Orders(Vec::new()),
            Domain::Settlements => Frame::Settlements(Vec::new()),
            Domain::Traffic => Frame::Traffic(Vec::new()),
            Domain::Returns => Frame::Returns(Vec::new()),
            Domain::Reviews => Frame::Reviews(Vec::new()),
        }
    }

    pub fn domain(&self) -> Domain {
        match self {
            Frame::Inventory(_) => Domain::Inventory,
            Frame::Orders(_) => Domain::Orders,
            Frame::Settlements(_) => Domain::Settlements,
            Frame::Traffic(_) => Domain::Traffic,
            Frame::Returns(_) => Domain::Returns,
            Frame::Reviews(_) => Domain::Reviews,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Frame::Inventory(v) => v.len(),
            Frame::Orders(v) => v.len(),
            Frame::Settlements(v) => v.len(),
            Frame::Traffic(v) => v.len(),
            Frame::Returns(v) => v.len(),
            Frame::Reviews(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_inventory(self) -> Vec<InventorySnapshot> {
        match self {
            Frame::Inventory(v) => v,
            _ => Vec::new(),
        }
    }

    pub fn into_orders(self) -> Vec<Order> {
        match self {
            Frame::Orders(v) => v,
            _ => Vec::new(),
        }
    }

    pub fn into_settlements(self) -> Vec<Settlement> {
        match self {
            Frame::Settlements(v) => v,
            _ => Vec::new(),
        }
    }

    pub fn into_traffic(self) -> Vec<TrafficRecord> {
        match self {
            Frame::Traffic(v) => v,
            _ => Vec::new(),
        }
    }

    pub fn into_returns(self) -> Vec<ReturnRecord> {
        match self {
            Frame::Returns(v) => v,
            _ => Vec::new(),
        }
    }

    pub fn into_reviews(self) -> Vec<Review> {
        match self {
            Frame::Reviews(v) => v,
            _ => Vec::new(),
        }
    }
}

/// Normalize raw rows of `domain` into canonical records.
pub fn normalize(domain: Domain, rows: &[Row]) -> Frame {
    match domain {
        Domain::Inventory => Frame::Inventory(normalize_inventory(rows)),
        Domain::Orders => Frame::Orders(normalize_orders(rows)),
        Domain::Settlements => Frame::Settlements(normalize_settlements(rows)),
        Domain::Traffic => Frame::Traffic(normalize_traffic(rows)),
        Domain::Returns => Frame::Returns(normalize_returns(rows)),
        Domain::Reviews => Frame::Reviews(normalize_reviews(rows)),
    }
}

fn log_dropped(domain: Domain, dropped: usize) {
    if dropped > 0 {
        tracing::debug!(domain = ?domain, dropped, "skipped rows without a usable date");
    }
}

// ---------------------------------------------------------------------------
// Per-domain normalizers
// ---------------------------------------------------------------------------

pub fn normalize_inventory(rows: &[Row]) -> Vec<InventorySnapshot> {
    let map = ColumnMap::resolve(Domain::Inventory, rows);
    let has_velocity = map.has("velocity");
    let buckets: Vec<&str> = AGE_BUCKETS.iter().copied().filter(|b| map.has(b)).collect();

    let out: Vec<InventorySnapshot> = rows
        .iter()
        .filter_map(|row| {
            let created_at = map.datetime(row, "created_at")?;
            let age_buckets: BTreeMap<String, f64> = buckets
                .iter()
                .map(|b| (b.to_string(), map.number(row, b)))
                .collect();
            Some(InventorySnapshot {
                sku: map.text(row, "sku"),
                asin: map.text(row, "asin"),
                store_name: map.text(row, "store_name"),
                product_name: map.text(row, "product_name"),
                available: map.int(row, "available"),
                inbound: map.int(row, "inbound"),
                reserved: map.int(row, "reserved"),
                price: map.number(row, "price"),
                velocity: has_velocity.then(|| map.number(row, "velocity")),
                age_buckets,
                created_at,
            })
        })
        .collect();
    log_dropped(Domain::Inventory, rows.len() - out.len());
    out
}

pub fn normalize_orders(rows: &[Row]) -> Vec<Order> {
    let map = ColumnMap::resolve(Domain::Orders, rows);
    let out: Vec<Order> = rows
        .iter()
        .filter_map(|row| {
            Some(Order {
                order_date: map.datetime(row, "order_date")?,
                order_id: map.text(row, "order_id"),
                sku: map.text(row, "sku"),
                quantity: map.int(row, "quantity"),
                item_price: map.number(row, "item_price"),
                item_tax: map.number(row, "item_tax"),
                shipping_price: map.number(row, "shipping_price"),
                status: map.text(row, "status"),
                store_name: map.text(row, "store_name"),
            })
        })
        .collect();
    log_dropped(Domain::Orders, rows.len() - out.len());
    out
}

pub fn normalize_settlements(rows: &[Row]) -> Vec<Settlement> {
    let map = ColumnMap::resolve(Domain::Settlements, rows);
    let out: Vec<Settlement> = rows
        .iter()
        .filter_map(|row| {
            let currency = map.text(row, "currency");
            Some(Settlement {
                posted_date: map.datetime(row, "posted_date")?,
                transaction_type: map.text(row, "transaction_type"),
                order_id: map.text(row, "order_id"),
                amount: map.number(row, "amount"),
                currency: if currency.is_empty() {
                    "USD".to_string()
                } else {
                    currency
                },
                quantity: map.int(row, "quantity"),
                description: map.text(row, "description"),
            })
        })
        .collect();
    log_dropped(Domain::Settlements, rows.len() - out.len());
    out
}

pub fn normalize_traffic(rows: &[Row]) -> Vec<TrafficRecord> {
    let map = ColumnMap::resolve(Domain::Traffic, rows);
    let out: Vec<TrafficRecord> = rows
        .iter()
        .filter_map(|row| {
            let report_date = map
                .datetime(row, "report_date")
                .or_else(|| map.datetime(row, "created_at"))?
                .date();
            Some(TrafficRecord {
                report_date,
                child_asin: map.text(row, "child_asin"),
                sessions: map.int(row, "sessions"),
                page_views: map.int(row, "page_views"),
                units_ordered: map.int(row, "units_ordered"),
                ordered_product_sales: map.number(row, "ordered_product_sales"),
                buy_box_percentage: map.number(row, "buy_box_percentage"),
                mobile_sessions: map.int(row, "mobile_sessions"),
                browser_sessions: map.int(row, "browser_sessions"),
                mobile_page_views: map.int(row, "mobile_page_views"),
                browser_page_views: map.int(row, "browser_page_views"),
            })
        })
        .collect();
    log_dropped(Domain::Traffic, rows.len() - out.len());
    out
}

pub fn normalize_returns(rows: &[Row]) -> Vec<ReturnRecord> {
    let map = ColumnMap::resolve(Domain::Returns, rows);
    let has_price = map.has("price");
    let out: Vec<ReturnRecord> = rows
        .iter()
        .filter_map(|row| {
            // Quantity defaults to one unit when absent or unreadable
            let quantity = map
                .source("quantity")
                .and_then(|col| row.get(col))
                .and_then(|v| match v {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => parse_number(s),
                    _ => None,
                })
                .map(|q| q as i64)
                .unwrap_or(1);
            Some(ReturnRecord {
                return_date: map.datetime(row, "return_date")?,
                order_id: map.text(row, "order_id"),
                sku: map.text(row, "sku"),
                product_name: map.text(row, "product_name"),
                quantity,
                price: has_price.then(|| map.number(row, "price")),
                reason: map.text(row, "reason"),
                status: map.text(row, "status"),
                store_name: map.text(row, "store_name"),
            })
        })
        .collect();
    log_dropped(Domain::Returns, rows.len() - out.len());
    out
}

pub fn normalize_reviews(rows: &[Row]) -> Vec<Review> {
    let map = ColumnMap::resolve(Domain::Reviews, rows);
    let mut out_of_range = 0usize;
    let out: Vec<Review> = rows
        .iter()
        .filter_map(|row| {
            let rating = map.number(row, "rating").trunc();
            if !(1.0..=5.0).contains(&rating) {
                out_of_range += 1;
                return None;
            }
            Some(Review {
                review_id: map.text(row, "review_id"),
                asin: map.text(row, "asin"),
                domain: map.text(row, "domain").to_lowercase(),
                rating: rating as u8,
                is_verified: map.flag(row, "is_verified"),
                review_date: map.datetime(row, "review_date").map(|d| d.date()),
                title: map.text(row, "title"),
                content: map.text(row, "content"),
                author: map.text(row, "author"),
                product_attributes: map.text(row, "product_attributes"),
            })
        })
        .collect();
    if out_of_range > 0 {
        tracing::debug!(dropped = out_of_range, "skipped reviews with a rating outside 1..=5");
    }
    out
}
