//! Orders report: revenue, top SKUs, daily trend and status mix.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::aggregate::{daily_sum, ratio, top_n, value_counts, GroupBy};
use crate::insights::order_insights;
use crate::models::{
    DailyValue, DateRange, InsightCard, KeyedCount, KeyedValue, Order, OrdersSummary,
};

use super::{trailing_window, Loader, ReportParams};

/// Default window, in days back from the newest order.
pub const DEFAULT_WINDOW_DAYS: i64 = 7;
pub const TOP_SKUS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdersReport {
    pub range: Option<DateRange>,
    pub summary: OrdersSummary,
    pub daily_revenue: Vec<DailyValue>,
    pub top_skus: Vec<KeyedValue>,
    pub status_counts: Vec<KeyedCount>,
    pub insights: Vec<InsightCard>,
}

/// Order totals. Revenue is the sum of line totals; orders are counted by
/// distinct non-empty id.
pub fn summarize(orders: &[Order]) -> OrdersSummary {
    let revenue: f64 = orders.iter().map(Order::line_total).sum();
    let order_count = orders
        .iter()
        .map(|o| o.order_id.as_str())
        .filter(|id| !id.is_empty())
        .collect::<HashSet<_>>()
        .len();
    let span_days = match (
        orders.iter().map(|o| o.order_date).min(),
        orders.iter().map(|o| o.order_date).max(),
    ) {
        (Some(first), Some(last)) => (last - first).num_days().max(1),
        _ => 1,
    };
    let revenue_per_day = revenue / span_days as f64;
    OrdersSummary {
        order_count,
        revenue,
        items: orders.iter().map(|o| o.quantity).sum(),
        avg_order_value: ratio(revenue, order_count as f64),
        revenue_per_day,
        monthly_projection: revenue_per_day * 30.0,
    }
}

/// Revenue per SKU, the `n` largest.
pub fn top_skus(orders: &[Order], n: usize) -> Vec<KeyedValue> {
    let per_sku: Vec<KeyedValue> = GroupBy::new(orders, |o| o.sku.clone())
        .sum("revenue", Order::line_total)
        .finish()
        .into_iter()
        .map(|row| KeyedValue {
            value: row.get("revenue"),
            key: row.key,
        })
        .collect();
    top_n(&per_sku, n, |k| k.value)
}

/// Query interface for the orders table.
pub struct OrdersQuery<'a> {
    loader: Loader<'a>,
}

impl<'a> OrdersQuery<'a> {
    pub(crate) fn new(loader: Loader<'a>) -> Self {
        Self { loader }
    }

    /// Orders in `range`, or every order when `None`.
    pub fn list(&self, range: Option<DateRange>) -> Vec<Order> {
        self.loader.orders(range)
    }

    /// The requested range, or the last week of data.
    pub fn default_range(&self, params: &ReportParams) -> Option<DateRange> {
        params.range.or_else(|| {
            trailing_window(
                self.loader.orders(None).iter().map(Order::order_day),
                DEFAULT_WINDOW_DAYS,
            )
        })
    }

    pub fn report(&self, params: &ReportParams) -> OrdersReport {
        let range = self.default_range(params);
        let mut orders = self.loader.orders(range);
        if let Some(store) = params.store.as_deref() {
            orders.retain(|o| o.store_name == store);
        }
        let summary = summarize(&orders);
        OrdersReport {
            range,
            daily_revenue: daily_sum(&orders, Order::order_day, Order::line_total),
            top_skus: top_skus(&orders, TOP_SKUS),
            status_counts: value_counts(
                orders
                    .iter()
                    .map(|o| o.status.clone())
                    .filter(|s| !s.is_empty()),
            ),
            insights: order_insights(&summary, &orders),
            summary,
        }
    }
}
