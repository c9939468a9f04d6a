//! Async wrapper around [`FbaInsights`] for use in async runtimes (Tokio, etc.).
//!
//! Runs every operation on the blocking thread pool via
//! [`tokio::task::spawn_blocking`], keeping the async event loop free.
//!
//! # Example
//!
//! ```no_run
//! use fba_insights::{Actor, AsyncFbaInsights, Report, ReportParams};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let fba = AsyncFbaInsights::builder()
//!         .database_path("seller.duckdb")
//!         .build()
//!         .await
//!         .unwrap();
//!
//!     // Run any sync method via closure
//!     let summary = fba
//!         .run(|f| Ok(f.inventory().summary(&ReportParams::new())))
//!         .await
//!         .unwrap();
//!
//!     let outcome = fba
//!         .open_report(Actor::admin("ops@example.com"), Report::Orders, ReportParams::new())
//!         .await
//!         .unwrap();
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::access::{AccessGate, Actor, Report};
use crate::connection::Row;
use crate::error::{FbaError, Result};
use crate::reports::{ReportOutcome, ReportParams};
use crate::FbaInsights;

// ---------------------------------------------------------------------------
// AsyncFbaInsightsBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`AsyncFbaInsights`] instance.
#[derive(Default)]
pub struct AsyncFbaInsightsBuilder {
    database_path: Option<PathBuf>,
    cache_ttl: Option<Duration>,
    read_only: bool,
    gate: Option<Box<dyn AccessGate + Send>>,
}

impl AsyncFbaInsightsBuilder {
    pub fn database_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.database_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// See [`FbaInsightsBuilder::gate`](crate::FbaInsightsBuilder::gate).
    pub fn gate<G: AccessGate + Send + 'static>(mut self, gate: G) -> Self {
        self.gate = Some(Box::new(gate));
        self
    }

    /// Open the store on the blocking thread pool.
    pub async fn build(self) -> Result<AsyncFbaInsights> {
        tokio::task::spawn_blocking(move || {
            let mut builder = FbaInsights::builder().read_only(self.read_only);
            if let Some(path) = self.database_path {
                builder = builder.database_path(path);
            }
            if let Some(ttl) = self.cache_ttl {
                builder = builder.cache_ttl(ttl);
            }
            if let Some(gate) = self.gate {
                builder = builder.boxed_gate(gate);
            }
            let fba = builder.build()?;
            Ok(AsyncFbaInsights {
                inner: Arc::new(Mutex::new(fba)),
            })
        })
        .await
        .map_err(|e| FbaError::InvalidArgument(format!("Task join error: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// AsyncFbaInsights
// ---------------------------------------------------------------------------

/// Async wrapper around [`FbaInsights`].
///
/// The inner instance sits behind a [`Mutex`] since its connection and
/// cache use `RefCell` internally.
#[derive(Clone)]
pub struct AsyncFbaInsights {
    inner: Arc<Mutex<FbaInsights>>,
}

impl AsyncFbaInsights {
    pub fn builder() -> AsyncFbaInsightsBuilder {
        AsyncFbaInsightsBuilder::default()
    }

    /// Wrap an already built instance.
    pub fn from_sync(fba: FbaInsights) -> Self {
        Self {
            inner: Arc::new(Mutex::new(fba)),
        }
    }

    /// Run a sync operation on the blocking thread pool.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&FbaInsights) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let fba = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = fba
                .lock()
                .map_err(|_| FbaError::InvalidArgument("lock poisoned".into()))?;
            f(&guard)
        })
        .await
        .map_err(|e| FbaError::InvalidArgument(format!("Task join error: {e}")))?
    }

    /// See [`FbaInsights::open_report`].
    pub async fn open_report(
        &self,
        actor: Actor,
        report: Report,
        params: ReportParams,
    ) -> Result<ReportOutcome> {
        self.run(move |f| f.open_report(&actor, report, &params)).await
    }

    /// Execute a raw SQL query asynchronously.
    pub async fn sql(&self, query: &str, params: &[String]) -> Result<Vec<Row>> {
        let query = query.to_string();
        let params = params.to_vec();
        self.run(move |f| f.sql(&query, &params)).await
    }

    pub async fn invalidate_all(&self) -> Result<()> {
        self.run(|f| {
            f.invalidate_all();
            Ok(())
        })
        .await
    }
}
