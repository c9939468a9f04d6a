//! Grouping and ranking primitives shared by every report.
//!
//! # Example
//!
//! ```
//! use fba_insights::aggregate::GroupBy;
//!
//! let rows = vec![("A", 2.0), ("B", 5.0), ("A", 3.0)];
//! let out = GroupBy::new(&rows, |r| r.0.to_string())
//!     .sum("total", |r| r.1)
//!     .count("n")
//!     .finish();
//!
//! assert_eq!(out[0].key, "A");
//! assert_eq!(out[0].get("total"), 5.0);
//! assert_eq!(out[1].get("n"), 1.0);
//! ```

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{DailyValue, KeyedCount};

// ---------------------------------------------------------------------------
// GroupBy
// ---------------------------------------------------------------------------

/// One output row of a [`GroupBy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggRow {
    pub key: String,
    pub values: BTreeMap<String, f64>,
}

impl AggRow {
    /// Value of an output column, 0 when the column was never computed.
    pub fn get(&self, column: &str) -> f64 {
        self.values.get(column).copied().unwrap_or(0.0)
    }
}

/// Groups rows by a key and computes named output columns per group.
///
/// Groups come out in the order their key was first seen.
pub struct GroupBy<'a, T> {
    keys: Vec<String>,
    groups: Vec<Vec<&'a T>>,
    columns: Vec<(String, Vec<f64>)>,
}

impl<'a, T> GroupBy<'a, T> {
    pub fn new<K>(rows: &'a [T], key_fn: K) -> Self
    where
        K: Fn(&T) -> String,
    {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut keys = Vec::new();
        let mut groups: Vec<Vec<&'a T>> = Vec::new();
        for row in rows {
            let key = key_fn(row);
            match index.get(&key) {
                Some(&i) => groups[i].push(row),
                None => {
                    index.insert(key.clone(), keys.len());
                    keys.push(key);
                    groups.push(vec![row]);
                }
            }
        }
        Self {
            keys,
            groups,
            columns: Vec::new(),
        }
    }

    fn column<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&[&'a T]) -> f64,
    {
        let values = self.groups.iter().map(|g| f(g.as_slice())).collect();
        self.columns.push((name.to_string(), values));
        self
    }

    pub fn sum<F>(self, name: &str, value: F) -> Self
    where
        F: Fn(&T) -> f64,
    {
        self.column(name, |g| g.iter().map(|r| value(r)).sum())
    }

    pub fn mean<F>(self, name: &str, value: F) -> Self
    where
        F: Fn(&T) -> f64,
    {
        self.column(name, |g| {
            let total: f64 = g.iter().map(|r| value(r)).sum();
            if g.is_empty() {
                0.0
            } else {
                total / g.len() as f64
            }
        })
    }

    pub fn count(self, name: &str) -> Self {
        self.column(name, |g| g.len() as f64)
    }

    pub fn count_distinct<F>(self, name: &str, value: F) -> Self
    where
        F: Fn(&T) -> String,
    {
        self.column(name, |g| {
            g.iter().map(|r| value(r)).collect::<BTreeSet<_>>().len() as f64
        })
    }

    pub fn count_where<P>(self, name: &str, predicate: P) -> Self
    where
        P: Fn(&T) -> bool,
    {
        self.column(name, |g| g.iter().filter(|r| predicate(r)).count() as f64)
    }

    pub fn min<F>(self, name: &str, value: F) -> Self
    where
        F: Fn(&T) -> f64,
    {
        self.column(name, |g| {
            g.iter().map(|r| value(r)).reduce(f64::min).unwrap_or(0.0)
        })
    }

    pub fn max<F>(self, name: &str, value: F) -> Self
    where
        F: Fn(&T) -> f64,
    {
        self.column(name, |g| {
            g.iter().map(|r| value(r)).reduce(f64::max).unwrap_or(0.0)
        })
    }

    pub fn finish(self) -> Vec<AggRow> {
        let columns = self.columns;
        self.keys
            .into_iter()
            .enumerate()
            .map(|(i, key)| AggRow {
                key,
                values: columns
                    .iter()
                    .map(|(name, vals)| (name.clone(), vals[i]))
                    .collect(),
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

fn desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// The `n` rows with the highest metric. Ties keep input order.
pub fn top_n<T, F>(rows: &[T], n: usize, metric: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> f64,
{
    let mut sorted: Vec<T> = rows.to_vec();
    sorted.sort_by(|a, b| desc(metric(a), metric(b)));
    sorted.truncate(n);
    sorted
}

/// The `n` rows with the lowest metric. Ties keep input order.
pub fn bottom_n<T, F>(rows: &[T], n: usize, metric: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> f64,
{
    let mut sorted: Vec<T> = rows.to_vec();
    sorted.sort_by(|a, b| desc(metric(b), metric(a)));
    sorted.truncate(n);
    sorted
}

/// Occurrence counts, most frequent first; ties keep first-seen order.
pub fn value_counts<I, S>(values: I) -> Vec<KeyedCount>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<KeyedCount> = Vec::new();
    for v in values {
        let key = v.into();
        match index.get(&key) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(key.clone(), counts.len());
                counts.push(KeyedCount { key, count: 1 });
            }
        }
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Per-day sums in ascending date order.
pub fn daily_sum<T, D, V>(rows: &[T], date: D, value: V) -> Vec<DailyValue>
where
    D: Fn(&T) -> NaiveDate,
    V: Fn(&T) -> f64,
{
    let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for row in rows {
        *by_day.entry(date(row)).or_insert(0.0) += value(row);
    }
    by_day
        .into_iter()
        .map(|(date, value)| DailyValue { date, value })
        .collect()
}

// ---------------------------------------------------------------------------
// Numeric helpers
// ---------------------------------------------------------------------------

/// `num / den × 100`, or 0 when `den` is 0.
pub fn pct(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den * 100.0
    }
}

/// `num / den`, or 0 when `den` is 0.
pub fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// Round to one decimal place. Display only.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Median; the mean of the two middle values for even lengths, 0 when empty.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
