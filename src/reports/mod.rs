//! Report computation over the analytical tables.
//!
//! Each domain has a lightweight borrowing query wrapper (e.g.
//! [`InventoryQuery`]) obtained from [`FbaInsights`](crate::FbaInsights).
//! Wrappers load through the shared [`FrameCache`]; a failed load is logged
//! and treated as an empty table, so a broken source only ever shows up as a
//! report with no data.

pub mod forecast;
pub mod inventory;
pub mod orders;
pub mod overview;
pub mod returns;
pub mod reviews;
pub mod settlements;
pub mod traffic;

pub use forecast::{ForecastQuery, ForecastReport};
pub use inventory::{AgingReport, InventoryQuery, InventoryTable, InventoryValueReport};
pub use orders::{OrdersQuery, OrdersReport};
pub use overview::{OverviewQuery, OverviewReport};
pub use returns::{ReturnsQuery, ReturnsReport};
pub use reviews::{CollectedReviews, ReviewsQuery, ReviewsReport};
pub use settlements::{SettlementsQuery, SettlementsReport};
pub use traffic::{TrafficQuery, TrafficReport};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::access::{Report, User};
use crate::cache::{CacheKey, FrameCache};
use crate::config::Domain;
use crate::connection::RowSource;
use crate::error::{FbaError, Result};
use crate::models::{
    DateRange, InventorySnapshot, Order, ReturnRecord, Review, Settlement, TrafficRecord,
};
use crate::schema::{normalize, Frame};
use crate::sql_builder::{quote_ident, SqlBuilder};

// ---------------------------------------------------------------------------
// ReportParams
// ---------------------------------------------------------------------------

/// Filters a caller can pass to a report. Unset fields fall back to each
/// report's default window or selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportParams {
    pub range: Option<DateRange>,
    /// Inventory snapshot day; the newest day when unset.
    pub as_of: Option<NaiveDate>,
    pub store: Option<String>,
    pub currency: Option<String>,
    pub asin: Option<String>,
    /// Marketplace codes to keep; empty keeps all.
    pub domains: Vec<String>,
    /// Review star ratings to keep; empty keeps all.
    pub stars: Vec<u8>,
    pub sku: Option<String>,
    pub horizon_days: Option<u32>,
}

impl ReportParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn range(mut self, range: DateRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn as_of(mut self, date: NaiveDate) -> Self {
        self.as_of = Some(date);
        self
    }

    pub fn store(mut self, store: impl Into<String>) -> Self {
        self.store = Some(store.into());
        self
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn asin(mut self, asin: impl Into<String>) -> Self {
        self.asin = Some(asin.into());
        self
    }

    pub fn domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.domains = domains.into_iter().map(Into::into).collect();
        self
    }

    pub fn stars(mut self, stars: &[u8]) -> Self {
        self.stars = stars.to_vec();
        self
    }

    pub fn sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    pub fn horizon_days(mut self, days: u32) -> Self {
        self.horizon_days = Some(days);
        self
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of [`FbaInsights::open_report`](crate::FbaInsights::open_report).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReportOutcome {
    /// The gate refused the report; nothing was loaded.
    Denied { report: Report },
    /// The report's tables are empty or unreachable.
    NoData { report: Report },
    Ready { view: Box<ReportView> },
}

impl ReportOutcome {
    pub fn is_denied(&self) -> bool {
        matches!(self, ReportOutcome::Denied { .. })
    }

    pub fn view(&self) -> Option<&ReportView> {
        match self {
            ReportOutcome::Ready { view } => Some(view),
            _ => None,
        }
    }
}

/// The computed body of one report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "report", content = "data", rename_all = "snake_case")]
pub enum ReportView {
    Overview(OverviewReport),
    SalesTraffic(TrafficReport),
    Settlements(SettlementsReport),
    InventoryValue(InventoryValueReport),
    Orders(OrdersReport),
    Returns(ReturnsReport),
    Reviews(ReviewsReport),
    InventoryAging(AgingReport),
    Forecast(ForecastReport),
    InventoryTable(InventoryTable),
    ScraperReviews(CollectedReviews),
    UserManagement(Vec<User>),
}

/// One independently computed part of a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum Section<T> {
    Ready(T),
    NoData,
    /// Too few rows for the computation; carries a neutral message.
    Insufficient(String),
    Failed(String),
}

impl<T> Section<T> {
    /// Map a computation result onto a section state.
    pub fn from_result(result: Result<T>) -> Self {
        match result {
            Ok(value) => Section::Ready(value),
            Err(e @ FbaError::InsufficientData { .. }) => Section::Insufficient(e.to_string()),
            Err(e) => {
                tracing::warn!(error = %e, "report section failed");
                Section::Failed(e.to_string())
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Section::Ready(_))
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Section::Ready(v) => Some(v),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// Cached, normalizing access to the six tables.
#[derive(Clone, Copy)]
pub(crate) struct Loader<'a> {
    source: &'a dyn RowSource,
    cache: &'a FrameCache,
}

impl<'a> Loader<'a> {
    pub(crate) fn new(source: &'a dyn RowSource, cache: &'a FrameCache) -> Self {
        Self { source, cache }
    }

    /// Load `domain` restricted to `range`. Store failures come back as an
    /// empty frame and are not cached.
    pub(crate) fn frame(&self, domain: Domain, range: Option<DateRange>) -> Frame {
        let key = CacheKey::new(domain, range);
        match self.cache.get_or_load(key, || self.fetch(domain, range)) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(table = domain.table(), error = %e, "load failed; treating as empty");
                Frame::empty(domain)
            }
        }
    }

    fn fetch(&self, domain: Domain, range: Option<DateRange>) -> Result<Frame> {
        let (sql, params) = SqlBuilder::new(&quote_ident(domain.table())).build();
        let rows = self
            .source
            .query(&sql, &params)
            .map_err(|e| FbaError::DataUnavailable(format!("{}: {}", domain.table(), e)))?;
        tracing::debug!(table = domain.table(), rows = rows.len(), "loaded");
        let frame = normalize(domain, &rows);
        Ok(match range {
            Some(r) => within(frame, r),
            None => frame,
        })
    }

    pub(crate) fn inventory(&self) -> Vec<InventorySnapshot> {
        self.frame(Domain::Inventory, None).into_inventory()
    }

    pub(crate) fn orders(&self, range: Option<DateRange>) -> Vec<Order> {
        self.frame(Domain::Orders, range).into_orders()
    }

    pub(crate) fn settlements(&self, range: Option<DateRange>) -> Vec<Settlement> {
        self.frame(Domain::Settlements, range).into_settlements()
    }

    pub(crate) fn traffic(&self, range: Option<DateRange>) -> Vec<TrafficRecord> {
        self.frame(Domain::Traffic, range).into_traffic()
    }

    pub(crate) fn returns(&self, range: Option<DateRange>) -> Vec<ReturnRecord> {
        self.frame(Domain::Returns, range).into_returns()
    }

    pub(crate) fn reviews(&self) -> Vec<Review> {
        self.frame(Domain::Reviews, None).into_reviews()
    }
}

/// Keep the records whose primary date falls inside `range`.
fn within(frame: Frame, range: DateRange) -> Frame {
    match frame {
        Frame::Inventory(v) => Frame::Inventory(
            v.into_iter()
                .filter(|r| range.contains(r.created_at.date()))
                .collect(),
        ),
        Frame::Orders(v) => Frame::Orders(
            v.into_iter()
                .filter(|r| range.contains(r.order_date.date()))
                .collect(),
        ),
        Frame::Settlements(v) => Frame::Settlements(
            v.into_iter()
                .filter(|r| range.contains(r.posted_date.date()))
                .collect(),
        ),
        Frame::Traffic(v) => {
            Frame::Traffic(v.into_iter().filter(|r| range.contains(r.report_date)).collect())
        }
        Frame::Returns(v) => Frame::Returns(
            v.into_iter()
                .filter(|r| range.contains(r.return_date.date()))
                .collect(),
        ),
        Frame::Reviews(v) => Frame::Reviews(
            v.into_iter()
                .filter(|r| r.review_date.is_some_and(|d| range.contains(d)))
                .collect(),
        ),
    }
}

/// The trailing window of `days` ending on the newest date in `dates`.
/// `None` when there are no dates.
pub(crate) fn trailing_window<I>(dates: I, days: i64) -> Option<DateRange>
where
    I: IntoIterator<Item = NaiveDate>,
{
    dates
        .into_iter()
        .max()
        .map(|end| DateRange::trailing(end, days))
}
