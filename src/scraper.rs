//! Review scrape job.
//!
//! A job walks a list of Amazon product URLs and, for each one, fetches the
//! most recent reviews per star tier (5 down to 1) and writes them to the
//! `amazon_reviews` table. It runs on its own thread. The caller owns a
//! [`JobHandle`]: a stop flag checked before every tier fetch and while
//! pausing, plus a channel carrying progress and log lines back.
//!
//! ```no_run
//! use fba_insights::scraper::{ApifyFetcher, DuckDbReviewSink, ScrapeJob, ScrapeOptions};
//! use fba_insights::FbaInsights;
//!
//! let fba = FbaInsights::builder().database_path("fba.duckdb").build().unwrap();
//! let job = ScrapeJob::start(
//!     vec!["https://www.amazon.de/dp/B0ABCDEFGH".to_string()],
//!     ScrapeOptions::default(),
//!     ApifyFetcher::from_env().unwrap(),
//!     DuckDbReviewSink::new(fba.connection().try_clone_raw().unwrap()),
//! );
//! let progress = job.join();
//! println!("{} cycles, {}%", progress.cycles, progress.progress_pct);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use duckdb::Connection as DuckDbConnection;
use regex::Regex;
use reqwest::blocking::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::config;
use crate::error::{FbaError, Result};

/// Star tiers in fetch order, with the filter name the scraping actor expects.
pub const STAR_TIERS: [(u8, &str); 5] = [
    (5, "fiveStar"),
    (4, "fourStar"),
    (3, "threeStar"),
    (2, "twoStar"),
    (1, "oneStar"),
];

// ---------------------------------------------------------------------------
// Targets and fetched records
// ---------------------------------------------------------------------------

/// A product page to scrape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductTarget {
    pub url: String,
    /// Marketplace domain code, e.g. `de` or `co.uk`.
    pub domain: String,
    pub asin: String,
}

fn asin_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"[A-Z0-9]{10}").ok())
        .as_ref()
}

/// Marketplace and ASIN of an Amazon product URL. The ASIN is `UNKNOWN`
/// when the path holds no 10-character product code.
pub fn parse_product_url(url: &str) -> ProductTarget {
    let url = url.trim();
    let (host, path) = match reqwest::Url::parse(url) {
        Ok(u) => (u.host_str().unwrap_or_default().to_string(), u.path().to_string()),
        Err(_) => (String::new(), url.to_string()),
    };
    let domain = host
        .strip_prefix("www.amazon.")
        .or_else(|| host.strip_prefix("amazon."))
        .unwrap_or(&host)
        .to_string();
    let asin = asin_pattern()
        .and_then(|re| re.find(&path))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "UNKNOWN".to_string());
    ProductTarget {
        url: url.to_string(),
        domain,
        asin,
    }
}

/// One review item as returned by the scraping actor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScrapedReview {
    #[serde(deserialize_with = "null_as_default")]
    pub review_url: String,
    pub position: Option<Value>,
    pub author: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub rating_score: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub review_title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub review_description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub is_verified: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub variant: String,
    #[serde(deserialize_with = "null_as_default")]
    pub date: String,
}

/// The actor sends `null` for fields it could not read.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ScrapedReview {
    /// Last path segment of the review URL, else `<asin>_<domain>_<position>`.
    pub fn review_id(&self, target: &ProductTarget) -> String {
        let from_url = self
            .review_url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();
        if !self.review_url.is_empty() && !from_url.is_empty() {
            return from_url.to_string();
        }
        let position = match &self.position {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => "?".to_string(),
        };
        format!("{}_{}_{}", target.asin, target.domain, position)
    }
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// Source of reviews for one product and star tier.
pub trait ReviewFetcher {
    fn fetch(&self, product_url: &str, tier: &str, max_reviews: u32) -> Result<Vec<ScrapedReview>>;
}

/// Fetches reviews through the Apify Amazon reviews actor.
pub struct ApifyFetcher {
    client: Client,
    endpoint: String,
    token: String,
}

impl ApifyFetcher {
    pub const TIMEOUT: Duration = Duration::from_secs(360);

    pub fn new(token: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(Self::TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: config::APIFY_REVIEWS_ENDPOINT.to_string(),
            token: token.into(),
        })
    }

    /// Read the API token from `APIFY_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var(config::ENV_APIFY_TOKEN).map_err(|_| {
            FbaError::InvalidArgument(format!("{} is not set", config::ENV_APIFY_TOKEN))
        })?;
        Self::new(token)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl ReviewFetcher for ApifyFetcher {
    fn fetch(&self, product_url: &str, tier: &str, max_reviews: u32) -> Result<Vec<ScrapedReview>> {
        let payload = serde_json::json!({
            "productUrls": [{ "url": product_url }],
            "filterByRatings": [tier],
            "maxReviews": max_reviews,
            "sort": "recent",
        });
        let resp = self
            .client
            .post(&self.endpoint)
            .query(&[("token", self.token.as_str())])
            .json(&payload)
            .send()?;
        let status = resp.status();
        if !(status.as_u16() == 200 || status.as_u16() == 201) {
            return Err(FbaError::DataUnavailable(format!("HTTP {}", status.as_u16())));
        }
        let items: Vec<Value> = resp.json()?;
        let mut reviews = Vec::with_capacity(items.len());
        for item in items {
            match serde_json::from_value::<ScrapedReview>(item) {
                Ok(r) => reviews.push(r),
                Err(e) => tracing::warn!(error = %e, "skipping malformed review item"),
            }
        }
        Ok(reviews)
    }
}

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

/// Destination for scraped reviews.
pub trait ReviewSink {
    fn ensure_schema(&mut self) -> Result<()>;
    /// Store reviews, ignoring ids already present. Returns rows written.
    fn save(&mut self, target: &ProductTarget, reviews: &[ScrapedReview]) -> Result<usize>;
    /// Reviews stored for a product.
    fn count(&mut self, target: &ProductTarget) -> Result<usize>;
}

/// Writes reviews into the `amazon_reviews` table of a DuckDB database.
pub struct DuckDbReviewSink {
    conn: DuckDbConnection,
}

impl DuckDbReviewSink {
    pub fn new(conn: DuckDbConnection) -> Self {
        Self { conn }
    }
}

impl ReviewSink for DuckDbReviewSink {
    fn ensure_schema(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS amazon_reviews (
                 review_id          VARCHAR PRIMARY KEY,
                 asin               VARCHAR,
                 domain             VARCHAR,
                 author             VARCHAR,
                 rating             INTEGER,
                 title              VARCHAR,
                 content            VARCHAR,
                 is_verified        BOOLEAN,
                 product_attributes VARCHAR,
                 review_date        VARCHAR,
                 created_at         TIMESTAMP DEFAULT current_timestamp
             );",
        )?;
        Ok(())
    }

    fn save(&mut self, target: &ProductTarget, reviews: &[ScrapedReview]) -> Result<usize> {
        let mut inserted = 0;
        for r in reviews {
            let id = r.review_id(target);
            let author = r.author.clone().unwrap_or_else(|| "Amazon User".to_string());
            let rating = r.rating_score as i64;
            let written = self.conn.execute(
                "INSERT OR IGNORE INTO amazon_reviews \
                 (review_id, asin, domain, author, rating, title, content, is_verified, product_attributes, review_date) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                duckdb::params![
                    id,
                    target.asin,
                    target.domain,
                    author,
                    rating,
                    r.review_title,
                    r.review_description,
                    r.is_verified,
                    r.variant,
                    r.date,
                ],
            );
            match written {
                Ok(n) => inserted += n,
                Err(e) => tracing::debug!(review_id = %id, error = %e, "review not stored"),
            }
        }
        Ok(inserted)
    }

    fn count(&mut self, target: &ProductTarget) -> Result<usize> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM amazon_reviews WHERE asin = ? AND domain = ?",
            duckdb::params![target.asin, target.domain],
            |row| row.get(0),
        )?;
        Ok(n.max(0) as usize)
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeOptions {
    /// Reviews requested per star tier.
    pub max_per_star: u32,
    /// Start over after each pass until stopped.
    pub loop_mode: bool,
    /// Wait between passes in loop mode.
    pub cycle_pause: Duration,
    /// Wait after each tier fetch.
    pub step_delay: Duration,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            max_per_star: 100,
            loop_mode: false,
            cycle_pause: Duration::from_secs(30 * 60),
            step_delay: Duration::from_millis(1500),
        }
    }
}

/// Snapshot of a job's state as seen by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobProgress {
    pub progress_pct: u8,
    pub label: String,
    pub log_lines: Vec<String>,
    pub done: bool,
    pub cycles: u32,
}

enum Event {
    Log(String),
    Progress { pct: u8, label: String },
    Done { cycles: u32 },
}

/// Caller side of a running job.
pub struct JobHandle {
    stop: Arc<AtomicBool>,
    events: Receiver<Event>,
    state: JobProgress,
    worker: Option<JoinHandle<()>>,
}

impl JobHandle {
    /// Ask the job to stop. It finishes the fetch in flight, then exits.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_stopping(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Drain pending events and return the current state.
    pub fn poll(&mut self) -> JobProgress {
        loop {
            match self.events.try_recv() {
                Ok(event) => self.apply(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.state.done = true;
                    break;
                }
            }
        }
        self.state.clone()
    }

    /// Wait for the job to finish and return its final state.
    pub fn join(mut self) -> JobProgress {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("scrape worker panicked");
            }
        }
        while let Ok(event) = self.events.try_recv() {
            self.apply(event);
        }
        self.state.done = true;
        self.state
    }

    fn apply(&mut self, event: Event) {
        match event {
            Event::Log(line) => self.state.log_lines.push(line),
            Event::Progress { pct, label } => {
                self.state.progress_pct = pct;
                self.state.label = label;
            }
            Event::Done { cycles } => {
                self.state.done = true;
                self.state.cycles = cycles;
            }
        }
    }
}

pub struct ScrapeJob;

impl ScrapeJob {
    /// Spawn a job over `urls`.
    pub fn start<F, S>(urls: Vec<String>, options: ScrapeOptions, fetcher: F, sink: S) -> JobHandle
    where
        F: ReviewFetcher + Send + 'static,
        S: ReviewSink + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();
        let worker = Worker {
            targets: urls.iter().map(|u| parse_product_url(u)).collect(),
            options,
            stop: Arc::clone(&stop),
            events: tx,
        };
        let handle = thread::spawn(move || worker.run(fetcher, sink));
        JobHandle {
            stop,
            events: rx,
            state: JobProgress::default(),
            worker: Some(handle),
        }
    }
}

struct Worker {
    targets: Vec<ProductTarget>,
    options: ScrapeOptions,
    stop: Arc<AtomicBool>,
    events: Sender<Event>,
}

impl Worker {
    fn stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    fn log(&self, line: String) {
        tracing::info!("{}", line);
        // The handle may already be gone; the job keeps going regardless
        let _ = self.events.send(Event::Log(line));
    }

    fn progress(&self, pct: u8, label: String) {
        let _ = self.events.send(Event::Progress { pct, label });
    }

    /// Sleep for `total`, waking early when stopped.
    fn pause(&self, total: Duration) {
        let deadline = Instant::now() + total;
        while !self.stopped() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep((deadline - now).min(Duration::from_millis(100)));
        }
    }

    fn run<F: ReviewFetcher, S: ReviewSink>(self, fetcher: F, mut sink: S) {
        if let Err(e) = sink.ensure_schema() {
            self.log(format!("database error: {}", e));
            let _ = self.events.send(Event::Done { cycles: 0 });
            return;
        }

        let total_steps = (self.targets.len() * STAR_TIERS.len()).max(1);
        let mut cycle = 0u32;
        while !self.stopped() {
            cycle += 1;
            let mut step = 0usize;
            let mut cycle_new = 0usize;
            if self.options.loop_mode {
                self.log(format!("cycle #{} started", cycle));
            }

            for target in &self.targets {
                if self.stopped() {
                    break;
                }
                self.log(format!("{} on amazon.{} (cycle #{})", target.asin, target.domain, cycle));
                let mut target_new = 0usize;
                for (stars, tier) in STAR_TIERS {
                    if self.stopped() {
                        break;
                    }
                    step += 1;
                    let pct = (step * 100 / total_steps) as u8;
                    self.progress(pct, format!("cycle #{} · {} · {}★", cycle, target.asin, stars));
                    match fetcher.fetch(&target.url, tier, self.options.max_per_star) {
                        Ok(reviews) if reviews.is_empty() => {
                            self.log(format!("  {}★: no reviews found", stars));
                        }
                        Ok(reviews) => match sink.save(target, &reviews) {
                            Ok(n) => {
                                target_new += n;
                                cycle_new += n;
                                self.log(format!("  {}★: received {}, new {}", stars, reviews.len(), n));
                            }
                            Err(e) => self.log(format!("  {}★: save failed: {}", stars, e)),
                        },
                        Err(e) => self.log(format!("  {}★: {}", stars, e)),
                    }
                    self.pause(self.options.step_delay);
                }
                let stored = sink.count(target).unwrap_or(0);
                self.log(format!(
                    "{}/{}: +{} new, {} stored",
                    target.asin, target.domain, target_new, stored
                ));
            }

            if self.options.loop_mode && !self.stopped() {
                self.log(format!("cycle #{} finished, +{} new", cycle, cycle_new));
                self.progress(100, format!("cycle #{} done, pausing", cycle));
                self.pause(self.options.cycle_pause);
            } else {
                break;
            }
        }

        self.log(format!("stopped after {} cycle(s)", cycle));
        self.progress(100, "stopped".to_string());
        let _ = self.events.send(Event::Done { cycles: cycle });
    }
}
