//! Landing report: the inventory headline plus one insight section per
//! domain, each computed on its own.

use serde::Serialize;

use crate::aggregate::top_n;
use crate::insights::{
    inventory_insights, order_insights, return_insights, review_insights, settlement_insights,
    traffic_insights,
};
use crate::joiner::{return_rate, return_value};
use crate::models::{InsightCard, InventorySummary, Order, StockValueRow};

use super::inventory::{InventoryQuery, TOP_BY_AVAILABLE};
use super::{orders, settlements, traffic, trailing_window, Loader, ReportParams, Section};

/// Insight window for settlements, orders and returns.
pub const MONTH_WINDOW_DAYS: i64 = 30;
/// Insight window for traffic.
pub const TRAFFIC_WINDOW_DAYS: i64 = 14;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewReport {
    pub inventory: InventorySummary,
    pub top_by_available: Vec<StockValueRow>,
    pub insights: OverviewInsights,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewInsights {
    pub inventory: Section<Vec<InsightCard>>,
    pub settlements: Section<Vec<InsightCard>>,
    pub traffic: Section<Vec<InsightCard>>,
    pub orders: Section<Vec<InsightCard>>,
    pub returns: Section<Vec<InsightCard>>,
    pub reviews: Section<Vec<InsightCard>>,
}

fn cards_or_empty<T, F>(rows: Vec<T>, cards: F) -> Section<Vec<InsightCard>>
where
    F: FnOnce(&[T]) -> Vec<InsightCard>,
{
    if rows.is_empty() {
        Section::NoData
    } else {
        Section::Ready(cards(&rows))
    }
}

/// Rows of the trailing window, or all rows when the window is empty.
fn recent<T, D>(rows: Vec<T>, days: i64, date: D) -> Vec<T>
where
    T: Clone,
    D: Fn(&T) -> chrono::NaiveDate,
{
    let Some(window) = trailing_window(rows.iter().map(&date), days) else {
        return rows;
    };
    let inside: Vec<T> = rows
        .iter()
        .filter(|r| window.contains(date(r)))
        .cloned()
        .collect();
    if inside.is_empty() {
        rows
    } else {
        inside
    }
}

/// Query interface for the overview.
pub struct OverviewQuery<'a> {
    loader: Loader<'a>,
}

impl<'a> OverviewQuery<'a> {
    pub(crate) fn new(loader: Loader<'a>) -> Self {
        Self { loader }
    }

    pub fn report(&self, params: &ReportParams) -> OverviewReport {
        let inventory = InventoryQuery::new(self.loader);
        let current = inventory.current(params);
        let rows: Vec<StockValueRow> = current.iter().map(StockValueRow::from).collect();
        OverviewReport {
            inventory: inventory.summary(params),
            top_by_available: top_n(&rows, TOP_BY_AVAILABLE, |r| r.available as f64),
            insights: OverviewInsights {
                inventory: cards_or_empty(current, inventory_insights),
                settlements: self.settlement_cards(),
                traffic: self.traffic_cards(),
                orders: self.order_cards(),
                returns: self.return_cards(),
                reviews: cards_or_empty(self.loader.reviews(), |r| review_insights(r, None)),
            },
        }
    }

    fn settlement_cards(&self) -> Section<Vec<InsightCard>> {
        let rows = recent(self.loader.settlements(None), MONTH_WINDOW_DAYS, |r| {
            r.posted_date.date()
        });
        cards_or_empty(rows, |r| settlement_insights(&settlements::summarize(r)))
    }

    fn traffic_cards(&self) -> Section<Vec<InsightCard>> {
        let rows = recent(self.loader.traffic(None), TRAFFIC_WINDOW_DAYS, |r| r.report_date);
        cards_or_empty(rows, |r| {
            traffic_insights(&traffic::totals(r), &traffic::per_asin(r))
        })
    }

    fn order_cards(&self) -> Section<Vec<InsightCard>> {
        let rows = recent(self.loader.orders(None), MONTH_WINDOW_DAYS, Order::order_day);
        cards_or_empty(rows, |r| order_insights(&orders::summarize(r), r))
    }

    fn return_cards(&self) -> Section<Vec<InsightCard>> {
        let rows = recent(self.loader.returns(None), MONTH_WINDOW_DAYS, |r| {
            r.return_date.date()
        });
        let orders_in_window = match trailing_window(
            rows.iter().map(|r| r.return_date.date()),
            MONTH_WINDOW_DAYS,
        ) {
            Some(window) => self.loader.orders(Some(window)),
            None => Vec::new(),
        };
        let all_orders = self.loader.orders(None);
        cards_or_empty(rows, |r| {
            let rate = return_rate(r, &orders_in_window);
            let valued = return_value(r, &all_orders);
            return_insights(&valued, rate)
        })
    }
}
