//! Point-in-time selection tests.

mod common;

use common::{day, snapshot};
use fba_insights::snapshot::{
    latest_day, latest_per_day, previous_period, select_as_of, snapshot_dates,
};

// ---------------------------------------------------------------------------
// latest_per_day
// ---------------------------------------------------------------------------

#[test]
fn later_capture_of_the_day_wins() {
    let rows = vec![
        snapshot("SKU-A", "2024-03-01 08:00:00", 100, 10.0),
        snapshot("SKU-A", "2024-03-01 18:00:00", 90, 10.0),
    ];
    let out = latest_per_day(&rows);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].available, 90);
}

#[test]
fn later_capture_wins_regardless_of_input_order() {
    let rows = vec![
        snapshot("SKU-A", "2024-03-01 18:00:00", 90, 10.0),
        snapshot("SKU-A", "2024-03-01 08:00:00", 100, 10.0),
    ];
    assert_eq!(latest_per_day(&rows)[0].available, 90);
}

#[test]
fn days_and_entities_stay_separate() {
    let rows = vec![
        snapshot("SKU-A", "2024-03-01 08:00:00", 100, 10.0),
        snapshot("SKU-B", "2024-03-01 09:00:00", 5, 10.0),
        snapshot("SKU-A", "2024-03-02 08:00:00", 95, 10.0),
    ];
    let out = latest_per_day(&rows);
    assert_eq!(out.len(), 3);
    assert_eq!(out[0].sku, "SKU-A");
    assert_eq!(out[1].sku, "SKU-B");
}

#[test]
fn same_sku_in_two_stores_is_two_entities() {
    let mut eu = snapshot("SKU-A", "2024-03-01 09:00:00", 7, 10.0);
    eu.store_name = "EU".to_string();
    let rows = vec![snapshot("SKU-A", "2024-03-01 08:00:00", 100, 10.0), eu];
    assert_eq!(latest_per_day(&rows).len(), 2);
}

// ---------------------------------------------------------------------------
// select_as_of
// ---------------------------------------------------------------------------

#[test]
fn as_of_takes_latest_on_or_before() {
    let rows = vec![
        snapshot("SKU-A", "2024-03-01 08:00:00", 100, 10.0),
        snapshot("SKU-A", "2024-03-02 08:00:00", 80, 10.0),
        snapshot("SKU-A", "2024-03-04 08:00:00", 60, 10.0),
        snapshot("SKU-B", "2024-03-05 08:00:00", 1, 10.0),
    ];
    let out = select_as_of(&rows, day("2024-03-03"));
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].available, 80);
}

#[test]
fn as_of_before_history_is_empty() {
    let rows = vec![snapshot("SKU-A", "2024-03-02 08:00:00", 80, 10.0)];
    assert!(select_as_of(&rows, day("2024-03-01")).is_empty());
}

// ---------------------------------------------------------------------------
// previous_period / dates
// ---------------------------------------------------------------------------

#[test]
fn previous_period_is_half_open() {
    let rows = vec![
        snapshot("SKU-A", "2024-02-23 08:00:00", 1, 1.0),
        snapshot("SKU-A", "2024-02-24 08:00:00", 2, 1.0),
        snapshot("SKU-A", "2024-03-02 08:00:00", 3, 1.0),
        snapshot("SKU-A", "2024-03-03 08:00:00", 4, 1.0),
    ];
    let out = previous_period(&rows, day("2024-03-03"), 7);
    let units: Vec<i64> = out.iter().map(|s| s.available).collect();
    assert_eq!(units, vec![2, 3]);
}

#[test]
fn snapshot_dates_newest_first() {
    let rows = vec![
        snapshot("SKU-A", "2024-03-01 08:00:00", 1, 1.0),
        snapshot("SKU-B", "2024-03-03 08:00:00", 1, 1.0),
        snapshot("SKU-A", "2024-03-03 09:00:00", 1, 1.0),
    ];
    assert_eq!(
        snapshot_dates(&rows),
        vec![day("2024-03-03"), day("2024-03-01")]
    );
}

#[test]
fn latest_day_keeps_only_newest_day() {
    let rows = vec![
        snapshot("SKU-A", "2024-03-01 08:00:00", 1, 1.0),
        snapshot("SKU-B", "2024-03-03 08:00:00", 2, 1.0),
        snapshot("SKU-B", "2024-03-03 20:00:00", 3, 1.0),
    ];
    let out = latest_day(&rows);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].available, 3);
    assert!(latest_day::<fba_insights::models::InventorySnapshot>(&[]).is_empty());
}
