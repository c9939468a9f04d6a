//! Returns report, joined against the orders table.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::aggregate::{daily_sum, ratio, top_n, value_counts, GroupBy};
use crate::insights::return_insights;
use crate::joiner::{return_rate, return_value};
use crate::models::{
    DailyValue, DateRange, InsightCard, KeyedCount, KeyedValue, ReturnRecord, ReturnValueRow,
    ReturnsSummary,
};

use super::{trailing_window, Loader, ReportParams};

/// Default window, in days back from the newest return.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;
pub const TOP_SKUS_BY_VALUE: usize = 10;
pub const TOP_REASONS_BY_VALUE: usize = 8;
pub const TOP_SKUS_BY_COUNT: usize = 15;
pub const TOP_REASONS_BY_COUNT: usize = 10;
pub const RECENT_RETURNS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnsReport {
    pub range: Option<DateRange>,
    pub summary: ReturnsSummary,
    pub value_by_sku: Vec<KeyedValue>,
    pub value_by_reason: Vec<KeyedValue>,
    pub daily_value: Vec<DailyValue>,
    pub count_by_sku: Vec<KeyedCount>,
    pub count_by_reason: Vec<KeyedCount>,
    pub recent: Vec<ReturnValueRow>,
    pub insights: Vec<InsightCard>,
}

pub fn summarize(rows: &[ReturnValueRow], return_rate_pct: f64) -> ReturnsSummary {
    let total_value: f64 = rows.iter().map(|r| r.value).sum();
    ReturnsSummary {
        total_returns: rows.len(),
        unique_skus: rows
            .iter()
            .map(|r| r.record.sku.as_str())
            .collect::<HashSet<_>>()
            .len(),
        return_rate_pct,
        total_value,
        avg_value: ratio(total_value, rows.len() as f64),
    }
}

fn value_by<F>(rows: &[ReturnValueRow], n: usize, key: F) -> Vec<KeyedValue>
where
    F: Fn(&ReturnValueRow) -> String,
{
    let grouped: Vec<KeyedValue> = GroupBy::new(rows, key)
        .sum("value", |r| r.value)
        .finish()
        .into_iter()
        .map(|row| KeyedValue {
            value: row.get("value"),
            key: row.key,
        })
        .collect();
    top_n(&grouped, n, |k| k.value)
}

/// Query interface for the returns table.
pub struct ReturnsQuery<'a> {
    loader: Loader<'a>,
}

impl<'a> ReturnsQuery<'a> {
    pub(crate) fn new(loader: Loader<'a>) -> Self {
        Self { loader }
    }

    pub fn list(&self, range: Option<DateRange>) -> Vec<ReturnRecord> {
        self.loader.returns(range)
    }

    /// The requested range, or the last 30 days of data.
    pub fn default_range(&self, params: &ReportParams) -> Option<DateRange> {
        params.range.or_else(|| {
            trailing_window(
                self.loader
                    .returns(None)
                    .iter()
                    .map(|r| r.return_date.date()),
                DEFAULT_WINDOW_DAYS,
            )
        })
    }

    /// Returned orders over placed orders within `range`, in percent.
    pub fn return_rate(&self, range: Option<DateRange>) -> f64 {
        return_rate(&self.loader.returns(range), &self.loader.orders(range))
    }

    pub fn report(&self, params: &ReportParams) -> ReturnsReport {
        let range = self.default_range(params);
        let mut returns = self.loader.returns(range);
        let mut placed = self.loader.orders(range);
        if let Some(store) = params.store.as_deref() {
            returns.retain(|r| r.store_name == store);
            placed.retain(|o| o.store_name == store);
        }
        // Rate against orders of the same period and store; prices from the whole history.
        let rate = return_rate(&returns, &placed);
        let valued = return_value(&returns, &self.loader.orders(None));

        let mut recent = valued.clone();
        recent.sort_by(|a, b| b.record.return_date.cmp(&a.record.return_date));
        recent.truncate(RECENT_RETURNS);

        let mut count_by_sku = value_counts(valued.iter().map(|r| r.record.sku.clone()));
        count_by_sku.truncate(TOP_SKUS_BY_COUNT);
        let mut count_by_reason = value_counts(
            valued
                .iter()
                .map(|r| r.record.reason.clone())
                .filter(|r| !r.is_empty()),
        );
        count_by_reason.truncate(TOP_REASONS_BY_COUNT);
        let with_reason: Vec<ReturnValueRow> = valued
            .iter()
            .filter(|r| !r.record.reason.is_empty())
            .cloned()
            .collect();

        ReturnsReport {
            range,
            summary: summarize(&valued, rate),
            value_by_sku: value_by(&valued, TOP_SKUS_BY_VALUE, |r| r.record.sku.clone()),
            value_by_reason: value_by(&with_reason, TOP_REASONS_BY_VALUE, |r| {
                r.record.reason.clone()
            }),
            daily_value: daily_sum(&valued, |r| r.record.return_date.date(), |r| r.value),
            count_by_sku,
            count_by_reason,
            recent,
            insights: return_insights(&valued, rate),
        }
    }
}
