//! FBA seller analytics for Rust.
//!
//! Loads Amazon seller data (inventory snapshots, orders, settlements,
//! sales & traffic, returns, reviews) from DuckDB, normalizes the
//! inconsistently named source columns, and derives the metrics, rankings,
//! time series and rule-based insight cards of each report.
//!
//! # Quick start
//!
//! ```no_run
//! use fba_insights::{Actor, FbaInsights, Report, ReportParams};
//!
//! let fba = FbaInsights::builder()
//!     .database_path("/var/lib/fba/seller.duckdb")
//!     .build()
//!     .unwrap();
//!
//! // Query one domain directly
//! let summary = fba.inventory().summary(&ReportParams::new());
//!
//! // Or go through the access gate
//! let actor = Actor::viewer("ops@example.com", [Report::Settlements]);
//! let outcome = fba
//!     .open_report(&actor, Report::Settlements, &ReportParams::new())
//!     .unwrap();
//! ```

pub mod access;
pub mod aggregate;
#[cfg(feature = "async")]
pub mod async_client;
pub mod cache;
pub mod config;
pub mod connection;
pub mod error;
pub mod forecast;
pub mod insights;
pub mod joiner;
pub mod models;
pub mod reports;
pub mod schema;
pub mod scraper;
pub mod snapshot;
pub mod sql_builder;

pub use access::{AccessGate, Actor, Report, Role, RoleGate, User, UserStore};
#[cfg(feature = "async")]
pub use async_client::AsyncFbaInsights;
pub use cache::{CacheKey, FrameCache};
pub use config::Domain;
pub use connection::{Connection, Row, RowSource};
pub use error::{FbaError, Result};
pub use reports::{ReportOutcome, ReportParams, ReportView, Section};
pub use sql_builder::SqlBuilder;

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::reports::Loader;
use crate::scraper::{DuckDbReviewSink, JobHandle, ReviewFetcher, ScrapeJob, ScrapeOptions};

// ---------------------------------------------------------------------------
// FbaInsightsBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`FbaInsights`] instance.
///
/// Use [`FbaInsights::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](FbaInsightsBuilder::build).
pub struct FbaInsightsBuilder {
    database_path: Option<PathBuf>,
    cache_ttl: Duration,
    read_only: bool,
    gate: Box<dyn AccessGate + Send>,
}

impl Default for FbaInsightsBuilder {
    fn default() -> Self {
        Self {
            database_path: None,
            cache_ttl: config::DEFAULT_CACHE_TTL,
            read_only: false,
            gate: Box::new(RoleGate),
        }
    }
}

impl FbaInsightsBuilder {
    /// Start from `FBA_DATABASE_PATH` and `FBA_CACHE_TTL_SECS`.
    ///
    /// Unset variables keep the defaults. A TTL that does not parse as whole
    /// seconds is ignored with a warning.
    pub fn from_env() -> Self {
        let mut builder = Self::default();
        if let Ok(path) = std::env::var(config::ENV_DATABASE_PATH) {
            if !path.trim().is_empty() {
                builder.database_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(raw) = std::env::var(config::ENV_CACHE_TTL_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) => builder.cache_ttl = Duration::from_secs(secs),
                Err(_) => tracing::warn!(value = %raw, "ignoring unparseable cache TTL"),
            }
        }
        builder
    }

    /// Use a database file instead of an in-memory database.
    pub fn database_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.database_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Use `seller.duckdb` under the per-user data directory.
    pub fn default_location(mut self) -> Self {
        self.database_path = Some(config::default_data_dir().join("seller.duckdb"));
        self
    }

    /// Set how long loaded frames stay fresh.
    ///
    /// Defaults to 60 seconds.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Open the database file read-only. Requires [`database_path`](Self::database_path).
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Replace the default [`RoleGate`].
    pub fn gate<G: AccessGate + Send + 'static>(mut self, gate: G) -> Self {
        self.gate = Box::new(gate);
        self
    }

    pub(crate) fn boxed_gate(mut self, gate: Box<dyn AccessGate + Send>) -> Self {
        self.gate = gate;
        self
    }

    /// Open the database. Nothing is loaded until a report asks for it.
    pub fn build(self) -> Result<FbaInsights> {
        let conn = match (&self.database_path, self.read_only) {
            (Some(path), true) => Connection::open_read_only(path)?,
            (Some(path), false) => Connection::open(path)?,
            (None, true) => {
                return Err(FbaError::InvalidArgument(
                    "read-only mode needs a database path".to_string(),
                ))
            }
            (None, false) => Connection::open_in_memory()?,
        };
        tracing::debug!(
            database = ?self.database_path,
            read_only = self.read_only,
            "opened store"
        );
        Ok(FbaInsights {
            conn,
            cache: FrameCache::new(self.cache_ttl),
            gate: self.gate,
            database_path: self.database_path,
            read_only: self.read_only,
        })
    }
}

// ---------------------------------------------------------------------------
// FbaInsights
// ---------------------------------------------------------------------------

/// The main entry point.
///
/// Owns the DuckDB [`Connection`], the [`FrameCache`] and the
/// [`AccessGate`], and exposes one lightweight borrowing wrapper per report
/// domain.
///
/// Created via [`FbaInsights::builder()`].
pub struct FbaInsights {
    conn: Connection,
    cache: FrameCache,
    gate: Box<dyn AccessGate + Send>,
    database_path: Option<PathBuf>,
    read_only: bool,
}

impl FbaInsights {
    /// Create a new builder.
    pub fn builder() -> FbaInsightsBuilder {
        FbaInsightsBuilder::default()
    }

    fn loader(&self) -> Loader<'_> {
        Loader::new(&self.conn, &self.cache)
    }

    // -- Report accessors --------------------------------------------------

    /// Inventory value, aging and the snapshot table.
    pub fn inventory(&self) -> reports::InventoryQuery<'_> {
        reports::InventoryQuery::new(self.loader())
    }

    pub fn orders(&self) -> reports::OrdersQuery<'_> {
        reports::OrdersQuery::new(self.loader())
    }

    pub fn settlements(&self) -> reports::SettlementsQuery<'_> {
        reports::SettlementsQuery::new(self.loader())
    }

    /// Sales & traffic per child ASIN and day.
    pub fn traffic(&self) -> reports::TrafficQuery<'_> {
        reports::TrafficQuery::new(self.loader())
    }

    /// Returns, joined against orders for rate and value.
    pub fn returns(&self) -> reports::ReturnsQuery<'_> {
        reports::ReturnsQuery::new(self.loader())
    }

    pub fn reviews(&self) -> reports::ReviewsQuery<'_> {
        reports::ReviewsQuery::new(self.loader())
    }

    /// Per-SKU sold-out forecasts.
    pub fn forecasts(&self) -> reports::ForecastQuery<'_> {
        reports::ForecastQuery::new(self.loader())
    }

    pub fn overview(&self) -> reports::OverviewQuery<'_> {
        reports::OverviewQuery::new(self.loader())
    }

    /// Users and their report grants.
    pub fn users(&self) -> UserStore<'_> {
        UserStore::new(&self.conn)
    }

    // -- Access ------------------------------------------------------------

    pub fn gate(&self) -> &dyn AccessGate {
        self.gate.as_ref()
    }

    pub fn permitted_reports(&self, actor: &Actor) -> BTreeSet<Report> {
        self.gate.list_permitted_reports(actor)
    }

    /// `Ok` when the gate lets `actor` open `report`.
    pub fn authorize(&self, actor: &Actor, report: Report) -> Result<()> {
        if self.gate.can_view(actor, report) {
            Ok(())
        } else {
            Err(FbaError::AccessDenied(format!(
                "{} may not view {}",
                actor.email, report
            )))
        }
    }

    /// Compute `report` for `actor`.
    ///
    /// The gate is asked first; a denied report loads nothing. A report
    /// whose source tables are all empty (or unreachable) comes back as
    /// [`ReportOutcome::NoData`].
    pub fn open_report(
        &self,
        actor: &Actor,
        report: Report,
        params: &ReportParams,
    ) -> Result<ReportOutcome> {
        if let Err(e) = self.authorize(actor, report) {
            tracing::info!(error = %e, "report denied");
            return Ok(ReportOutcome::Denied { report });
        }

        let sources = source_domains(report);
        if !sources.is_empty() && sources.iter().all(|d| self.loader().frame(*d, None).is_empty()) {
            return Ok(ReportOutcome::NoData { report });
        }

        let view = match report {
            Report::Overview => ReportView::Overview(self.overview().report(params)),
            Report::SalesTraffic => ReportView::SalesTraffic(self.traffic().report(params)),
            Report::Settlements => ReportView::Settlements(self.settlements().report(params)),
            Report::InventoryValue => {
                ReportView::InventoryValue(self.inventory().value_report(params))
            }
            Report::Orders => ReportView::Orders(self.orders().report(params)),
            Report::Returns => ReportView::Returns(self.returns().report(params)),
            Report::Reviews => ReportView::Reviews(self.reviews().report(params)),
            Report::InventoryAging => {
                ReportView::InventoryAging(self.inventory().aging_report(params))
            }
            Report::Forecast => match self.forecasts().report(params) {
                Ok(forecast) => ReportView::Forecast(forecast),
                Err(FbaError::NotFound(_)) => return Ok(ReportOutcome::NoData { report }),
                Err(e) => return Err(e),
            },
            Report::InventoryTable => ReportView::InventoryTable(self.inventory().table(params)),
            Report::ScraperReviews => ReportView::ScraperReviews(self.reviews().collected()),
            Report::UserManagement => {
                let users = self.users();
                users.ensure_tables()?;
                ReportView::UserManagement(users.list_users()?)
            }
        };
        Ok(ReportOutcome::Ready {
            view: Box::new(view),
        })
    }

    // -- Scraping ----------------------------------------------------------

    /// Start a background review scrape writing into this database.
    ///
    /// The job gets its own handle on the store. Cached review frames are
    /// dropped so the next report sees what is already stored; call
    /// [`invalidate_domain`](Self::invalidate_domain) again once the job is done.
    pub fn start_scrape<F>(
        &self,
        urls: Vec<String>,
        options: ScrapeOptions,
        fetcher: F,
    ) -> Result<JobHandle>
    where
        F: ReviewFetcher + Send + 'static,
    {
        if self.read_only {
            return Err(FbaError::InvalidArgument(
                "cannot scrape into a read-only store".to_string(),
            ));
        }
        let sink = DuckDbReviewSink::new(self.conn.try_clone_raw()?);
        self.cache.invalidate_domain(Domain::Reviews);
        Ok(ScrapeJob::start(urls, options, fetcher, sink))
    }

    // -- Cache -------------------------------------------------------------

    pub fn cache(&self) -> &FrameCache {
        &self.cache
    }

    pub fn invalidate(&self, key: &CacheKey) {
        self.cache.invalidate(key);
    }

    pub fn invalidate_domain(&self, domain: Domain) {
        self.cache.invalidate_domain(domain);
    }

    /// Drop every cached frame, e.g. after new data was ingested.
    pub fn invalidate_all(&self) {
        self.cache.clear();
    }

    // -- Raw access --------------------------------------------------------

    /// Execute a raw SQL query against the DuckDB database.
    ///
    /// * `query` - SQL string with `?` positional placeholders.
    /// * `params` - Parameter values corresponding to the placeholders.
    pub fn sql(&self, query: &str, params: &[String]) -> Result<Vec<Row>> {
        self.conn.execute(query, params)
    }

    /// Return a reference to the underlying [`Connection`] for advanced usage.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Tables a report reads. Empty for reports that do not read seller data.
fn source_domains(report: Report) -> &'static [Domain] {
    match report {
        Report::Overview => &Domain::ALL,
        Report::SalesTraffic => &[Domain::Traffic],
        Report::Settlements => &[Domain::Settlements],
        Report::InventoryValue
        | Report::InventoryAging
        | Report::Forecast
        | Report::InventoryTable => &[Domain::Inventory],
        Report::Orders => &[Domain::Orders],
        Report::Returns => &[Domain::Returns],
        Report::Reviews | Report::ScraperReviews => &[Domain::Reviews],
        Report::UserManagement => &[],
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for FbaInsights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let database = match &self.database_path {
            Some(path) => path.display().to_string(),
            None => ":memory:".to_string(),
        };
        write!(
            f,
            "FbaInsights(database={}, read_only={}, cache_ttl={}s, cached_frames={})",
            database,
            self.read_only,
            self.cache.ttl().as_secs(),
            self.cache.len()
        )
    }
}
