//! Sales & traffic report.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::aggregate::{mean, pct, ratio, top_n, GroupBy};
use crate::insights::traffic_insights;
use crate::models::{AsinTraffic, DailyTraffic, DateRange, InsightCard, TrafficRecord, TrafficTotals};

use super::{trailing_window, Loader, ReportParams};

/// Default window, in days back from the newest report date.
pub const DEFAULT_WINDOW_DAYS: i64 = 14;
pub const TOP_ASINS: usize = 15;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficReport {
    pub range: Option<DateRange>,
    pub totals: TrafficTotals,
    pub daily: Vec<DailyTraffic>,
    /// Every ASIN, highest revenue first.
    pub per_asin: Vec<AsinTraffic>,
    pub top_by_revenue: Vec<AsinTraffic>,
    pub top_by_sessions: Vec<AsinTraffic>,
    pub insights: Vec<InsightCard>,
}

/// Period totals. Conversion is weighted by sessions; buy box is the plain
/// mean of the row percentages.
pub fn totals(rows: &[TrafficRecord]) -> TrafficTotals {
    let sessions: i64 = rows.iter().map(|r| r.sessions).sum();
    let units: i64 = rows.iter().map(|r| r.units_ordered).sum();
    let revenue: f64 = rows.iter().map(|r| r.ordered_product_sales).sum();
    let mobile: i64 = rows.iter().map(|r| r.mobile_sessions).sum();
    let browser: i64 = rows.iter().map(|r| r.browser_sessions).sum();
    let buy_box: Vec<f64> = rows.iter().map(|r| r.buy_box_percentage).collect();
    TrafficTotals {
        sessions,
        page_views: rows.iter().map(|r| r.page_views).sum(),
        units,
        revenue,
        conversion_pct: pct(units as f64, sessions as f64),
        buy_box_pct: mean(&buy_box),
        mobile_share_pct: pct(mobile as f64, (mobile + browser) as f64),
        revenue_per_session: ratio(revenue, sessions as f64),
    }
}

/// Per child ASIN, in first-seen order.
pub fn per_asin(rows: &[TrafficRecord]) -> Vec<AsinTraffic> {
    GroupBy::new(rows, |r| r.child_asin.clone())
        .sum("sessions", |r| r.sessions as f64)
        .sum("page_views", |r| r.page_views as f64)
        .sum("units", |r| r.units_ordered as f64)
        .sum("revenue", |r| r.ordered_product_sales)
        .mean("buy_box", |r| r.buy_box_percentage)
        .finish()
        .into_iter()
        .map(|row| AsinTraffic {
            sessions: row.get("sessions") as i64,
            page_views: row.get("page_views") as i64,
            units: row.get("units") as i64,
            revenue: row.get("revenue"),
            buy_box_pct: row.get("buy_box"),
            conversion_pct: pct(row.get("units"), row.get("sessions")),
            asin: row.key,
        })
        .collect()
}

/// Per report day, ascending.
pub fn daily(rows: &[TrafficRecord]) -> Vec<DailyTraffic> {
    let mut by_day: BTreeMap<_, DailyTraffic> = BTreeMap::new();
    for r in rows {
        let day = by_day.entry(r.report_date).or_insert_with(|| DailyTraffic {
            date: r.report_date,
            sessions: 0,
            page_views: 0,
            units: 0,
            revenue: 0.0,
            conversion_pct: 0.0,
        });
        day.sessions += r.sessions;
        day.page_views += r.page_views;
        day.units += r.units_ordered;
        day.revenue += r.ordered_product_sales;
    }
    by_day
        .into_values()
        .map(|mut d| {
            d.conversion_pct = pct(d.units as f64, d.sessions as f64);
            d
        })
        .collect()
}

/// Query interface for the sales & traffic table.
pub struct TrafficQuery<'a> {
    loader: Loader<'a>,
}

impl<'a> TrafficQuery<'a> {
    pub(crate) fn new(loader: Loader<'a>) -> Self {
        Self { loader }
    }

    pub fn list(&self, range: Option<DateRange>) -> Vec<TrafficRecord> {
        self.loader.traffic(range)
    }

    /// The requested range, or the last two weeks of data.
    pub fn default_range(&self, params: &ReportParams) -> Option<DateRange> {
        params.range.or_else(|| {
            trailing_window(
                self.loader.traffic(None).iter().map(|r| r.report_date),
                DEFAULT_WINDOW_DAYS,
            )
        })
    }

    pub fn report(&self, params: &ReportParams) -> TrafficReport {
        let range = self.default_range(params);
        let rows = self.loader.traffic(range);
        let totals = totals(&rows);
        let asins = per_asin(&rows);
        TrafficReport {
            range,
            daily: daily(&rows),
            top_by_revenue: top_n(&asins, TOP_ASINS, |a| a.revenue),
            top_by_sessions: top_n(&asins, TOP_ASINS, |a| a.sessions as f64),
            per_asin: top_n(&asins, asins.len(), |a| a.revenue),
            insights: traffic_insights(&totals, &asins),
            totals,
        }
    }
}
