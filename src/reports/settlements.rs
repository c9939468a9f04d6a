//! Settlement (payout) report.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::aggregate::{daily_sum, pct, top_n, GroupBy};
use crate::insights::settlement_insights;
use crate::models::{DailyValue, DateRange, InsightCard, KeyedValue, Settlement, SettlementSummary};

use super::{trailing_window, Loader, ReportParams};

/// Default window, in days back from the newest transaction.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;
pub const RECENT_TRANSACTIONS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementsReport {
    pub range: Option<DateRange>,
    pub currency: Option<String>,
    pub currencies: Vec<String>,
    pub summary: SettlementSummary,
    /// Net amount per posting day.
    pub payout_trend: Vec<DailyValue>,
    /// Costs per transaction type as positive amounts, largest first.
    pub cost_breakdown: Vec<KeyedValue>,
    pub recent: Vec<Settlement>,
    pub insights: Vec<InsightCard>,
}

/// Ledger totals.
///
/// Gross counts positive `Order` amounts, fees every other negative amount
/// that is not a refund. All figures keep their sign.
pub fn summarize(rows: &[Settlement]) -> SettlementSummary {
    let net_payout: f64 = rows.iter().map(|r| r.amount).sum();
    let gross_sales: f64 = rows
        .iter()
        .filter(|r| r.is_order() && r.amount > 0.0)
        .map(|r| r.amount)
        .sum();
    let refunds: f64 = rows.iter().filter(|r| r.is_refund()).map(|r| r.amount).sum();
    let fees: f64 = rows
        .iter()
        .filter(|r| r.amount < 0.0 && !r.is_refund())
        .map(|r| r.amount)
        .sum();
    SettlementSummary {
        net_payout,
        gross_sales,
        fees,
        refunds,
        margin_pct: pct(net_payout, gross_sales),
        fee_pct: pct(fees.abs(), gross_sales),
        refund_pct: pct(refunds.abs(), gross_sales),
        transaction_count: rows.len(),
    }
}

/// Negative amounts grouped by transaction type, as absolute values.
pub fn cost_breakdown(rows: &[Settlement]) -> Vec<KeyedValue> {
    let costs: Vec<Settlement> = rows.iter().filter(|r| r.amount < 0.0).cloned().collect();
    let grouped: Vec<KeyedValue> = GroupBy::new(&costs, |r| r.transaction_type.clone())
        .sum("amount", |r| r.amount)
        .finish()
        .into_iter()
        .map(|row| KeyedValue {
            value: row.get("amount").abs(),
            key: row.key,
        })
        .collect();
    top_n(&grouped, grouped.len(), |k| k.value)
}

/// Query interface for the settlements table.
pub struct SettlementsQuery<'a> {
    loader: Loader<'a>,
}

impl<'a> SettlementsQuery<'a> {
    pub(crate) fn new(loader: Loader<'a>) -> Self {
        Self { loader }
    }

    pub fn list(&self, range: Option<DateRange>) -> Vec<Settlement> {
        self.loader.settlements(range)
    }

    /// Currencies present in the table, sorted.
    pub fn currencies(&self) -> Vec<String> {
        self.loader
            .settlements(None)
            .into_iter()
            .map(|r| r.currency)
            .filter(|c| !c.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// The requested range, or the last 30 days of data.
    pub fn default_range(&self, params: &ReportParams) -> Option<DateRange> {
        params.range.or_else(|| {
            trailing_window(
                self.loader
                    .settlements(None)
                    .iter()
                    .map(|r| r.posted_date.date()),
                DEFAULT_WINDOW_DAYS,
            )
        })
    }

    pub fn report(&self, params: &ReportParams) -> SettlementsReport {
        let range = self.default_range(params);
        let mut rows = self.loader.settlements(range);
        if let Some(currency) = params.currency.as_deref() {
            rows.retain(|r| r.currency == currency);
        }
        let summary = summarize(&rows);
        let mut recent = rows.clone();
        recent.sort_by(|a, b| b.posted_date.cmp(&a.posted_date));
        recent.truncate(RECENT_TRANSACTIONS);
        SettlementsReport {
            range,
            currency: params.currency.clone(),
            currencies: self.currencies(),
            payout_trend: daily_sum(&rows, |r| r.posted_date.date(), |r| r.amount),
            cost_breakdown: cost_breakdown(&rows),
            recent,
            insights: settlement_insights(&summary),
            summary,
        }
    }
}
