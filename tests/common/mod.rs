//! Shared test fixtures for the fba-insights integration tests.
//!
//! Provides `setup_sample_fba()` which builds an in-memory [`FbaInsights`]
//! with small sample tables (fba_inventory, orders, settlements,
//! sales_traffic, returns, amazon_reviews) loaded via NDJSON temp files, plus
//! record constructors for the pure-function tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io::Write;

use chrono::{NaiveDate, NaiveDateTime};
use fba_insights::models::{InventorySnapshot, Order, ReturnRecord, Review, Settlement};
use fba_insights::{Connection, FbaInsights};
use tempfile::NamedTempFile;

/// An `FbaInsights` over an in-memory database holding every sample table.
///
/// Snapshot days run 2024-03-01..=2024-03-03, orders 2024-02-01..=2024-03-05.
pub fn setup_sample_fba() -> FbaInsights {
    let fba = FbaInsights::builder().build().unwrap();
    let conn = fba.connection();

    // -- fba_inventory table ----------------------------------------------------
    register_inventory(conn);

    // -- orders table -----------------------------------------------------------
    register_orders(conn);

    // -- settlements table ------------------------------------------------------
    register_settlements(conn);

    // -- sales_traffic table ----------------------------------------------------
    register_traffic(conn);

    // -- returns table ----------------------------------------------------------
    register_returns(conn);

    // -- amazon_reviews table ---------------------------------------------------
    register_reviews(conn);

    fba
}

/// An `FbaInsights` with no tables at all.
pub fn empty_fba() -> FbaInsights {
    FbaInsights::builder().build().unwrap()
}

/// Write `rows` to a temp NDJSON file and register it as `table`.
pub fn write_table(conn: &Connection, table: &str, rows: &[serde_json::Value]) {
    let mut tmp = NamedTempFile::new().unwrap();
    for row in rows {
        writeln!(tmp, "{}", serde_json::to_string(row).unwrap()).unwrap();
    }
    tmp.flush().unwrap();
    conn.register_table_from_ndjson(table, tmp.path().to_str().unwrap())
        .unwrap();
}

fn register_inventory(conn: &Connection) {
    let row = |sku: &str, at: &str, available: i64, price: f64, velocity: f64| {
        serde_json::json!({
            "SKU": sku,
            "ASIN": format!("ASIN-{}", sku),
            "Store Name": "US",
            "Product Name": format!("Product {}", sku),
            "Available": available,
            "Inbound": 5,
            "Reserved": 1,
            "Price": price,
            "Velocity": velocity,
            "created_at": at,
        })
    };
    let mut a_last = row("SKU-A", "2024-03-03 12:00:00", 70, 10.0, 5.0);
    a_last["Upto 90 Days"] = serde_json::json!(60);
    a_last["91 to 180 Days"] = serde_json::json!(10);
    let mut b_last = row("SKU-B", "2024-03-03 12:00:00", 40, 20.0, 0.0);
    b_last["Upto 90 Days"] = serde_json::json!(0);
    b_last["91 to 180 Days"] = serde_json::json!(40);

    let rows = vec![
        row("SKU-A", "2024-03-01 08:00:00", 100, 10.0, 5.0),
        row("SKU-A", "2024-03-01 18:00:00", 90, 10.0, 5.0),
        row("SKU-A", "2024-03-02 12:00:00", 80, 10.0, 5.0),
        a_last,
        row("SKU-B", "2024-03-01 12:00:00", 50, 20.0, 0.0),
        b_last,
        row("SKU-C", "2024-03-03 12:00:00", 0, 5.0, 1.0),
        row("SKU-D", "not a date", 999, 1.0, 1.0),
    ];
    write_table(conn, "fba_inventory", &rows);
}

fn register_orders(conn: &Connection) {
    let row = |id: &str, sku: &str, at: &str, qty: i64, price: f64, status: &str, store: &str| {
        serde_json::json!({
            "Order ID": id,
            "SKU": sku,
            "Order Date": at,
            "Quantity": qty,
            "Item Price": price,
            "Item Tax": 1.0,
            "Shipping Price": 0.0,
            "Order Status": status,
            "Store Name": store,
        })
    };
    let rows = vec![
        row("O-0", "SKU-A", "2024-02-01 09:00:00", 1, 16.0, "Shipped", "US"),
        row("O-1", "SKU-A", "2024-03-01 10:00:00", 2, 10.0, "Shipped", "US"),
        row("O-2", "SKU-B", "2024-03-02 11:00:00", 1, 20.0, "Shipped", "US"),
        row("O-3", "SKU-A", "2024-03-05 09:00:00", 1, 10.0, "Pending", "EU"),
    ];
    write_table(conn, "orders", &rows);
}

fn register_settlements(conn: &Connection) {
    let row = |at: &str, kind: &str, id: &str, amount: f64, currency: &str| {
        serde_json::json!({
            "Posted Date": at,
            "Transaction Type": kind,
            "Order ID": id,
            "Amount": amount,
            "Currency": currency,
        })
    };
    let rows = vec![
        row("2024-03-01 10:00:00", "Order", "O-1", 100.0, "USD"),
        row("2024-03-02 10:00:00", "Refund", "O-1", -20.0, "USD"),
        row("2024-03-02 11:00:00", "FBA Fee", "O-2", -10.0, "USD"),
        row("2024-03-03 10:00:00", "Order", "O-3", 50.0, "EUR"),
    ];
    write_table(conn, "settlements", &rows);
}

fn register_traffic(conn: &Connection) {
    let rows = vec![
        serde_json::json!({
            "report_date": "2024-03-01", "child_asin": "ASIN-1",
            "sessions": 100, "page_views": 150, "units_ordered": 10,
            "ordered_product_sales": 200.0, "buy_box_percentage": 100.0,
            "mobile_sessions": 70, "browser_sessions": 30,
        }),
        serde_json::json!({
            "report_date": "2024-03-01", "child_asin": "ASIN-2",
            "sessions": 100, "page_views": 120, "units_ordered": 5,
            "ordered_product_sales": 100.0, "buy_box_percentage": 60.0,
            "mobile_sessions": 40, "browser_sessions": 60,
        }),
        serde_json::json!({
            "report_date": "2024-03-02", "child_asin": "ASIN-1",
            "sessions": 200, "page_views": 300, "units_ordered": 20,
            "ordered_product_sales": 400.0, "buy_box_percentage": 95.0,
            "mobile_sessions": 120, "browser_sessions": 80,
        }),
    ];
    write_table(conn, "sales_traffic", &rows);
}

fn register_returns(conn: &Connection) {
    let rows = vec![
        serde_json::json!({
            "Return Date": "2024-03-02 15:00:00", "Order ID": "O-1", "SKU": "SKU-A",
            "Quantity": 1, "Reason": "Defective", "Status": "Refunded", "Store Name": "US",
        }),
        serde_json::json!({
            "Return Date": "2024-03-05 15:00:00", "Order ID": "O-3", "SKU": "SKU-A",
            "Quantity": 2, "Reason": "Too small", "Status": "Refunded", "Store Name": "EU",
        }),
        serde_json::json!({
            "Return Date": "2024-03-05 16:00:00", "Order ID": "O-9", "SKU": "SKU-Z",
            "Quantity": null, "Reason": "Defective", "Status": "Pending", "Store Name": "US",
        }),
    ];
    write_table(conn, "returns", &rows);
}

fn register_reviews(conn: &Connection) {
    let mut rows = Vec::new();
    let mut push = |asin: &str, domain: &str, ratings: &[i64], attrs: &str| {
        for rating in ratings {
            let n = rows.len();
            rows.push(serde_json::json!({
                "review_id": format!("R{:03}", n),
                "asin": asin,
                "domain": domain,
                "rating": rating,
                "is_verified": n % 2 == 0,
                "review_date": format!("2024-03-{:02}", 1 + n % 9),
                "title": format!("Review {}", n),
                "content": "text",
                "author": "buyer",
                "product_attributes": attrs,
            }));
        }
    };
    push("ASIN-1", "com", &[5, 5, 5, 4, 1, 2], "Size: M, Color: Blue");
    push("ASIN-2", "de", &[1, 1, 1, 2], "Size: L, Color: Red");
    push("ASIN-3", "com", &[1, 1, 5, 5, 5], "");
    // Outside 1..=5, dropped on load
    push("ASIN-3", "com", &[0], "");
    write_table(conn, "amazon_reviews", &rows);
}

// ---------------------------------------------------------------------------
// Record constructors
// ---------------------------------------------------------------------------

pub fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

pub fn snapshot(sku: &str, created_at: &str, available: i64, price: f64) -> InventorySnapshot {
    InventorySnapshot {
        sku: sku.to_string(),
        asin: String::new(),
        store_name: "US".to_string(),
        product_name: String::new(),
        available,
        inbound: 0,
        reserved: 0,
        price,
        velocity: Some(1.0),
        age_buckets: BTreeMap::new(),
        created_at: at(created_at),
    }
}

pub fn order(id: &str, sku: &str, date: &str, quantity: i64, price: f64) -> Order {
    Order {
        order_id: id.to_string(),
        sku: sku.to_string(),
        order_date: at(date),
        quantity,
        item_price: price,
        item_tax: 0.0,
        shipping_price: 0.0,
        status: "Shipped".to_string(),
        store_name: "US".to_string(),
    }
}

pub fn return_record(order_id: &str, sku: &str, quantity: i64, price: Option<f64>) -> ReturnRecord {
    ReturnRecord {
        return_date: at("2024-03-02 12:00:00"),
        order_id: order_id.to_string(),
        sku: sku.to_string(),
        product_name: String::new(),
        quantity,
        price,
        reason: "Defective".to_string(),
        status: String::new(),
        store_name: "US".to_string(),
    }
}

pub fn settlement(kind: &str, amount: f64) -> Settlement {
    Settlement {
        posted_date: at("2024-03-01 10:00:00"),
        transaction_type: kind.to_string(),
        order_id: String::new(),
        amount,
        currency: "USD".to_string(),
        quantity: 0,
        description: String::new(),
    }
}

pub fn review(asin: &str, domain: &str, rating: u8) -> Review {
    Review {
        review_id: String::new(),
        asin: asin.to_string(),
        domain: domain.to_string(),
        rating,
        is_verified: true,
        review_date: None,
        title: String::new(),
        content: String::new(),
        author: String::new(),
        product_attributes: String::new(),
    }
}

/// Reviews of one ASIN in one marketplace with the given ratings.
pub fn reviews_of(asin: &str, domain: &str, ratings: &[u8]) -> Vec<Review> {
    ratings.iter().map(|r| review(asin, domain, *r)).collect()
}
