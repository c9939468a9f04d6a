//! Point-in-time selection over tables that store repeated snapshots.

use std::collections::{BTreeSet, HashMap};

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use crate::models::InventorySnapshot;

/// A row captured at a point in time for some entity.
pub trait Snapshot {
    fn entity_key(&self) -> String;
    fn captured_at(&self) -> NaiveDateTime;

    fn captured_on(&self) -> NaiveDate {
        self.captured_at().date()
    }
}

impl Snapshot for InventorySnapshot {
    fn entity_key(&self) -> String {
        format!("{}\u{1f}{}", self.store_name, self.sku)
    }

    fn captured_at(&self) -> NaiveDateTime {
        self.created_at
    }
}

/// One row per (entity, calendar day); the latest capture of the day wins.
///
/// Output keeps the order in which each (entity, day) was first seen.
pub fn latest_per_day<T: Snapshot + Clone>(rows: &[T]) -> Vec<T> {
    let mut slot: HashMap<(String, NaiveDate), usize> = HashMap::new();
    let mut out: Vec<T> = Vec::new();
    for row in rows {
        let key = (row.entity_key(), row.captured_on());
        match slot.get(&key) {
            Some(&i) => {
                if row.captured_at() > out[i].captured_at() {
                    out[i] = row.clone();
                }
            }
            None => {
                slot.insert(key, out.len());
                out.push(row.clone());
            }
        }
    }
    out
}

/// Most recent snapshot dated on or before `date`, per entity.
///
/// Entities with no snapshot by then are absent.
pub fn select_as_of<T: Snapshot + Clone>(rows: &[T], date: NaiveDate) -> Vec<T> {
    let mut slot: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<T> = Vec::new();
    for row in rows.iter().filter(|r| r.captured_on() <= date) {
        let key = row.entity_key();
        match slot.get(&key) {
            Some(&i) => {
                if row.captured_at() > out[i].captured_at() {
                    out[i] = row.clone();
                }
            }
            None => {
                slot.insert(key, out.len());
                out.push(row.clone());
            }
        }
    }
    out
}

/// Rows captured in `[current_date - lookback_days, current_date)`.
pub fn previous_period<T: Snapshot + Clone>(
    rows: &[T],
    current_date: NaiveDate,
    lookback_days: i64,
) -> Vec<T> {
    let start = current_date - TimeDelta::days(lookback_days);
    rows.iter()
        .filter(|r| {
            let d = r.captured_on();
            d >= start && d < current_date
        })
        .cloned()
        .collect()
}

/// Distinct capture days, newest first.
pub fn snapshot_dates<T: Snapshot>(rows: &[T]) -> Vec<NaiveDate> {
    let days: BTreeSet<NaiveDate> = rows.iter().map(Snapshot::captured_on).collect();
    days.into_iter().rev().collect()
}

/// Rows captured on the newest day present.
pub fn latest_day<T: Snapshot + Clone>(rows: &[T]) -> Vec<T> {
    match rows.iter().map(Snapshot::captured_on).max() {
        Some(day) => latest_per_day(rows)
            .into_iter()
            .filter(|r| r.captured_on() == day)
            .collect(),
        None => Vec::new(),
    }
}
