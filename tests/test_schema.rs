//! Schema normalization tests: alias resolution, coercion, date parsing.

mod common;

use fba_insights::schema::{
    coerce_bool, coerce_f64, normalize, normalize_orders, normalize_returns, normalize_reviews,
    normalize_settlements, normalize_traffic, parse_date, parse_datetime, ColumnMap, Frame,
};
use fba_insights::{Domain, Row};
use serde_json::json;

fn row(value: serde_json::Value) -> Row {
    serde_json::from_value(value).unwrap()
}

// ---------------------------------------------------------------------------
// ColumnMap
// ---------------------------------------------------------------------------

#[test]
fn first_present_alias_wins() {
    let map = ColumnMap::from_columns(Domain::Inventory, ["sku", "SKU", "seller-sku"]);
    assert_eq!(map.source("sku"), Some("SKU"));
}

#[test]
fn lower_priority_alias_used_when_alone() {
    let map = ColumnMap::from_columns(Domain::Orders, ["purchase-date", "amazon-order-id"]);
    assert_eq!(map.source("order_date"), Some("purchase-date"));
    assert_eq!(map.source("order_id"), Some("amazon-order-id"));
}

#[test]
fn missing_fields_are_listed() {
    let map = ColumnMap::from_columns(Domain::Settlements, ["Amount"]);
    assert!(map.has("amount"));
    assert!(!map.has("currency"));
    assert!(map.missing().contains(&"posted_date"));
}

#[test]
fn missing_numeric_column_reads_as_zero() {
    let rows = vec![row(json!({"Order Date": "2024-03-01", "Order ID": "O-1"}))];
    let orders = normalize_orders(&rows);
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].quantity, 0);
    assert_eq!(orders[0].item_price, 0.0);
    assert_eq!(orders[0].sku, "");
}

// ---------------------------------------------------------------------------
// Coercion
// ---------------------------------------------------------------------------

#[test]
fn numbers_with_symbols_parse() {
    assert_eq!(coerce_f64(&json!("$1,234.50")), 1234.5);
    assert_eq!(coerce_f64(&json!("12%")), 12.0);
    assert_eq!(coerce_f64(&json!(" 7 ")), 7.0);
    assert_eq!(coerce_f64(&json!(3)), 3.0);
}

#[test]
fn unparseable_numbers_become_zero() {
    assert_eq!(coerce_f64(&json!("n/a")), 0.0);
    assert_eq!(coerce_f64(&json!("")), 0.0);
    assert_eq!(coerce_f64(&serde_json::Value::Null), 0.0);
    assert_eq!(coerce_f64(&json!(["x"])), 0.0);
}

#[test]
fn flags_accept_common_spellings() {
    assert!(coerce_bool(&json!(true)));
    assert!(coerce_bool(&json!("Yes")));
    assert!(coerce_bool(&json!(1)));
    assert!(!coerce_bool(&json!("no")));
    assert!(!coerce_bool(&serde_json::Value::Null));
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

#[test]
fn parses_iso_and_day_first_timestamps() {
    let expected = common::at("2024-03-05 14:30:00");
    assert_eq!(parse_datetime("2024-03-05 14:30:00"), Some(expected));
    assert_eq!(parse_datetime("2024-03-05T14:30:00"), Some(expected));
    assert_eq!(parse_datetime("2024-03-05T14:30:00+00:00"), Some(expected));
    assert_eq!(parse_datetime("05.03.2024 14:30:00"), Some(expected));
    assert_eq!(parse_datetime("05/03/2024 14:30"), Some(expected));
}

#[test]
fn date_only_maps_to_midnight() {
    assert_eq!(
        parse_datetime("2024-03-05"),
        Some(common::at("2024-03-05 00:00:00"))
    );
}

#[test]
fn parses_review_caption_dates() {
    assert_eq!(
        parse_date("Reviewed in the United States on March 5, 2024"),
        Some(common::day("2024-03-05"))
    );
    assert_eq!(parse_date("5 March 2024"), Some(common::day("2024-03-05")));
}

#[test]
fn garbage_dates_are_none() {
    assert_eq!(parse_datetime("not a date"), None);
    assert_eq!(parse_datetime(""), None);
    assert_eq!(parse_date("2024-13-45"), None);
}

// ---------------------------------------------------------------------------
// Per-domain normalizers
// ---------------------------------------------------------------------------

#[test]
fn rows_without_a_date_are_dropped() {
    let rows = vec![
        row(json!({"Order ID": "O-1", "Order Date": "2024-03-01 10:00:00"})),
        row(json!({"Order ID": "O-2", "Order Date": "yesterday"})),
        row(json!({"Order ID": "O-3"})),
    ];
    let orders = normalize_orders(&rows);
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].order_id, "O-1");
}

#[test]
fn settlement_currency_defaults_to_usd() {
    let rows = vec![row(json!({"posted-date": "2024-03-01", "amount": "-4.50"}))];
    let s = normalize_settlements(&rows);
    assert_eq!(s[0].currency, "USD");
    assert_eq!(s[0].amount, -4.5);
}

#[test]
fn return_quantity_defaults_to_one() {
    let rows = vec![
        row(json!({"return-date": "2024-03-01", "qty": null})),
        row(json!({"return-date": "2024-03-01", "qty": "3"})),
    ];
    let r = normalize_returns(&rows);
    assert_eq!(r[0].quantity, 1);
    assert_eq!(r[1].quantity, 3);
    assert_eq!(r[0].price, None);
}

#[test]
fn traffic_falls_back_to_created_at() {
    let rows = vec![row(json!({
        "created_at": "2024-03-07 09:00:00",
        "Child ASIN": "B0TEST0001",
        "Sessions": "1,200",
    }))];
    let t = normalize_traffic(&rows);
    assert_eq!(t[0].report_date, common::day("2024-03-07"));
    assert_eq!(t[0].sessions, 1200);
}

#[test]
fn review_ratings_outside_range_are_dropped() {
    let rows = vec![
        row(json!({"asin": "A", "domain": "COM", "rating": 4.6})),
        row(json!({"asin": "A", "domain": "com", "rating": 0})),
        row(json!({"asin": "A", "domain": "com", "ratingScore": 9})),
    ];
    let r = normalize_reviews(&rows);
    assert_eq!(r.len(), 1);
    assert_eq!(r[0].rating, 4);
    assert_eq!(r[0].domain, "com");
}

#[test]
fn fractional_ratings_truncate_to_their_star() {
    let rows = vec![
        row(json!({"asin": "A", "domain": "com", "rating": 4.5})),
        row(json!({"asin": "A", "domain": "com", "rating": 1.9})),
        row(json!({"asin": "A", "domain": "com", "rating": 0.9})),
    ];
    let stars: Vec<u8> = normalize_reviews(&rows).iter().map(|r| r.rating).collect();
    assert_eq!(stars, vec![4, 1]);
}

#[test]
fn normalize_dispatches_by_domain() {
    let frame = normalize(Domain::Reviews, &[]);
    assert!(matches!(frame, Frame::Reviews(ref v) if v.is_empty()));
    assert_eq!(frame.domain(), Domain::Reviews);
}

#[test]
fn sample_inventory_skips_undated_rows() {
    let fba = common::setup_sample_fba();
    let snapshots = fba.inventory().snapshots();
    assert!(snapshots.iter().all(|s| s.sku != "SKU-D"));
    // SKU-A twice on 03-01 collapses to one row
    assert_eq!(snapshots.len(), 6);
}
