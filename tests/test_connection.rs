//! Connection integration tests: raw SQL execution, table registration,
//! value conversion and the `RowSource` seam.

mod common;

use fba_insights::{Connection, RowSource};

fn sample_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    common::write_table(
        &conn,
        "orders",
        &[
            serde_json::json!({"Order ID": "O-1", "SKU": "SKU-A", "Quantity": 2, "Item Price": 9.5,
                               "Gift": false, "Note": null, "Order Date": "2024-03-01 10:00:00"}),
            serde_json::json!({"Order ID": "O-2", "SKU": "SKU-B", "Quantity": 1, "Item Price": 20.0,
                               "Gift": true, "Note": "rush", "Order Date": "2024-03-02 00:00:00"}),
            serde_json::json!({"Order ID": "O-3", "SKU": "SKU-A", "Quantity": 4, "Item Price": 9.5,
                               "Gift": false, "Note": null, "Order Date": "2024-03-03 12:30:00"}),
        ],
    );
    conn
}

// ---------------------------------------------------------------------------
// execute
// ---------------------------------------------------------------------------

#[test]
fn execute_returns_correct_rows() {
    let conn = sample_conn();
    let rows = conn
        .execute("SELECT * FROM orders ORDER BY \"Order ID\"", &[])
        .unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["Order ID"], "O-1");
    assert_eq!(rows[2]["Order ID"], "O-3");
}

#[test]
fn execute_with_params() {
    let conn = sample_conn();
    let rows = conn
        .execute("SELECT * FROM orders WHERE SKU = ?", &["SKU-A".to_string()])
        .unwrap();
    assert_eq!(rows.len(), 2);
}

#[test]
fn execute_returns_empty_for_no_matches() {
    let conn = sample_conn();
    let rows = conn
        .execute("SELECT * FROM orders WHERE SKU = ?", &["nope".to_string()])
        .unwrap();
    assert!(rows.is_empty());
}

#[test]
fn execute_on_missing_table_errors() {
    let conn = Connection::open_in_memory().unwrap();
    assert!(conn.execute("SELECT * FROM settlements", &[]).is_err());
}

// ---------------------------------------------------------------------------
// execute_scalar / execute_update / execute_into
// ---------------------------------------------------------------------------

#[test]
fn execute_scalar_returns_single_value() {
    let conn = sample_conn();
    let n = conn
        .execute_scalar("SELECT COUNT(*) FROM orders", &[])
        .unwrap()
        .unwrap();
    assert_eq!(n.as_i64(), Some(3));
}

#[test]
fn execute_scalar_returns_none_for_empty_result() {
    let conn = sample_conn();
    let result = conn
        .execute_scalar("SELECT SKU FROM orders WHERE SKU = ?", &["nope".to_string()])
        .unwrap();
    assert!(result.is_none());
}

#[test]
fn execute_update_reports_affected_rows() {
    let conn = sample_conn();
    let n = conn
        .execute_update("DELETE FROM orders WHERE SKU = ?", &["SKU-A".to_string()])
        .unwrap();
    assert_eq!(n, 2);
}

#[test]
fn execute_into_deserializes_rows() {
    #[derive(serde::Deserialize, Debug)]
    struct Line {
        sku: String,
        qty: i64,
    }
    let conn = sample_conn();
    let lines: Vec<Line> = conn
        .execute_into(
            "SELECT SKU AS sku, Quantity AS qty FROM orders ORDER BY qty DESC",
            &[],
        )
        .unwrap();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0].sku, "SKU-A");
    assert_eq!(lines[0].qty, 4);
}

// ---------------------------------------------------------------------------
// register_table_from_ndjson / has_table / tables
// ---------------------------------------------------------------------------

#[test]
fn register_marks_table() {
    let conn = Connection::open_in_memory().unwrap();
    assert!(!conn.has_table("returns"));
    common::write_table(&conn, "returns", &[serde_json::json!({"x": 1})]);
    common::write_table(&conn, "amazon_reviews", &[serde_json::json!({"x": 1})]);
    assert!(conn.has_table("returns"));
    assert_eq!(conn.tables(), vec!["amazon_reviews", "returns"]);
}

#[test]
fn register_replaces_existing_table() {
    let conn = Connection::open_in_memory().unwrap();
    common::write_table(&conn, "replaceable", &[serde_json::json!({"val": "old"})]);
    common::write_table(&conn, "replaceable", &[serde_json::json!({"val": "new"})]);
    let rows = conn.execute("SELECT * FROM replaceable", &[]).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["val"], "new");
}

#[test]
fn register_quotes_table_name_and_path() {
    let conn = Connection::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seller's export.ndjson");
    std::fs::write(&path, "{\"SKU\": \"SKU-A\"}\n").unwrap();
    conn.register_table_from_ndjson("Settlement Report", path.to_str().unwrap())
        .unwrap();
    assert!(conn.has_table("Settlement Report"));
    let rows = conn
        .execute("SELECT * FROM \"Settlement Report\"", &[])
        .unwrap();
    assert_eq!(rows[0]["SKU"], "SKU-A");
}

#[test]
fn raw_and_batch_share_the_database() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("CREATE TABLE raw_test (id INTEGER, value TEXT)")
        .unwrap();
    conn.raw()
        .execute_batch("INSERT INTO raw_test VALUES (1, 'hello')")
        .unwrap();
    let rows = conn.execute("SELECT * FROM raw_test", &[]).unwrap();
    assert_eq!(rows[0]["value"], "hello");
}

// ---------------------------------------------------------------------------
// Type conversions
// ---------------------------------------------------------------------------

#[test]
fn nulls_booleans_and_numbers_convert() {
    let conn = sample_conn();
    let rows = conn
        .execute("SELECT * FROM orders WHERE \"Order ID\" = ?", &["O-1".to_string()])
        .unwrap();
    assert!(rows[0]["Note"].is_null());
    assert_eq!(rows[0]["Gift"], false);
    assert_eq!(rows[0]["Quantity"].as_i64(), Some(2));
    let price = rows[0]["Item Price"].as_f64().unwrap();
    assert!((price - 9.5).abs() < f64::EPSILON);
}

#[test]
fn timestamps_and_dates_become_iso_strings() {
    let conn = Connection::open_in_memory().unwrap();
    let rows = conn
        .execute(
            "SELECT TIMESTAMP '2024-03-02 00:00:00' AS ts, \
                    TIMESTAMP '2024-03-03 12:30:15.250' AS frac, \
                    DATE '2024-03-05' AS d",
            &[],
        )
        .unwrap();
    assert_eq!(rows[0]["ts"], "2024-03-02 00:00:00");
    assert_eq!(rows[0]["frac"], "2024-03-03 12:30:15.250");
    assert_eq!(rows[0]["d"], "2024-03-05");
}

#[test]
fn decimals_become_numbers() {
    let conn = Connection::open_in_memory().unwrap();
    let v = conn
        .execute_scalar("SELECT CAST(12.34 AS DECIMAL(10,2))", &[])
        .unwrap()
        .unwrap();
    assert!((v.as_f64().unwrap() - 12.34).abs() < 1e-9);
}

// ---------------------------------------------------------------------------
// RowSource
// ---------------------------------------------------------------------------

#[test]
fn connection_is_a_row_source() {
    let conn = sample_conn();
    let source: &dyn RowSource = &conn;
    let rows = source
        .query("SELECT * FROM orders WHERE SKU = ?", &["SKU-A".to_string()])
        .unwrap();
    assert_eq!(rows.len(), 2);
}

#[test]
fn raw_sql_through_fba() {
    let fba = common::setup_sample_fba();
    let rows = fba
        .sql(
            "SELECT COUNT(*) AS n FROM fba_inventory WHERE SKU = ?",
            &["SKU-A".to_string()],
        )
        .unwrap();
    assert_eq!(rows[0]["n"].as_i64(), Some(4));
}
