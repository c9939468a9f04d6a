//! Time-bounded memo of normalized frames.
//!
//! Loaded frames are kept for a freshness window (60 seconds by default) and
//! keyed by domain plus the optional date filter they were loaded with.
//! Entries can also be dropped explicitly, one key, one domain, or all.

use std::cell::RefCell;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::config::{Domain, DEFAULT_CACHE_TTL};
use crate::error::Result;
use crate::models::DateRange;
use crate::schema::Frame;

/// Cache key: domain and the date range a frame was loaded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub domain: Domain,
    pub range: Option<DateRange>,
}

impl CacheKey {
    pub fn new(domain: Domain, range: Option<DateRange>) -> Self {
        Self { domain, range }
    }
}

struct Entry {
    frame: Frame,
    stored_at: Instant,
}

/// Read-through cache of frames. Two cold lookups of the same key may both
/// load; the later insert wins.
pub struct FrameCache {
    ttl: Duration,
    entries: RefCell<HashMap<CacheKey, Entry>>,
}

impl Default for FrameCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl FrameCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RefCell::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// A fresh copy of the cached frame, if one is within the window.
    pub fn get(&self, key: &CacheKey) -> Option<Frame> {
        let mut entries = self.entries.borrow_mut();
        match entries.get(key) {
            Some(e) if e.stored_at.elapsed() < self.ttl => {
                tracing::debug!(domain = ?key.domain, "frame cache hit");
                Some(e.frame.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: CacheKey, frame: Frame) {
        self.entries.borrow_mut().insert(
            key,
            Entry {
                frame,
                stored_at: Instant::now(),
            },
        );
    }

    /// Return the cached frame for `key`, or load, store and return it.
    /// Failed loads are not cached.
    pub fn get_or_load<F>(&self, key: CacheKey, load: F) -> Result<Frame>
    where
        F: FnOnce() -> Result<Frame>,
    {
        if let Some(frame) = self.get(&key) {
            return Ok(frame);
        }
        let frame = load()?;
        self.insert(key, frame.clone());
        Ok(frame)
    }

    pub fn invalidate(&self, key: &CacheKey) {
        self.entries.borrow_mut().remove(key);
    }

    /// Drop every entry of `domain`, whatever its date range.
    pub fn invalidate_domain(&self, domain: Domain) {
        self.entries.borrow_mut().retain(|k, _| k.domain != domain);
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
