//! Time-boxed cache in front of a data source
//!
//! Renders inside the TTL window share one loaded value. After expiry the
//! next caller refreshes synchronously while concurrent callers wait on the
//! same lock, so only one fetch is in flight. A failed fetch degrades to the
//! output's default (an empty table) and is not stored.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument};

use crate::fetch_error::FetchError;

/// Source of truth for time, injectable for tests
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Anything that can load a fresh value, e.g. a spreadsheet fetch
pub trait DataSource<T>: Send + Sync {
    /// Short description for logs
    fn name(&self) -> String;

    fn fetch(&self) -> BoxFuture<'_, Result<T, FetchError>>;
}

struct CachedEntry<T> {
    value: Arc<T>,
    fetched_at: Instant,
    loaded_at: DateTime<Utc>,
}

pub struct TtlCache<T> {
    source: Arc<dyn DataSource<T>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entry: Mutex<Option<CachedEntry<T>>>,
}

impl<T> TtlCache<T>
where
    T: Default + Send + Sync + 'static,
{
    pub fn new(source: Arc<dyn DataSource<T>>, ttl: Duration) -> Self {
        Self::with_clock(source, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(
        source: Arc<dyn DataSource<T>>,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            clock,
            ttl,
            entry: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached value if still fresh, otherwise fetch a new one
    #[instrument(skip(self), fields(source = %self.source.name()))]
    pub async fn get_or_refresh(&self) -> Arc<T> {
        let mut entry = self.entry.lock().await;
        let now = self.clock.now();

        if let Some(cached) = entry.as_ref() {
            if now.saturating_duration_since(cached.fetched_at) < self.ttl {
                debug!("Serving cached value loaded at {}", cached.loaded_at);
                return Arc::clone(&cached.value);
            }
            debug!("Cached value expired, refreshing");
        }

        match self.source.fetch().await {
            Ok(value) => {
                let value = Arc::new(value);
                let loaded_at = Utc::now();
                info!("Refreshed cache from {}", self.source.name());
                *entry = Some(CachedEntry {
                    value: Arc::clone(&value),
                    fetched_at: now,
                    loaded_at,
                });
                value
            }
            Err(e) => {
                error!("Failed to load data from {}: {}", self.source.name(), e);
                Arc::new(T::default())
            }
        }
    }

    /// Drop the cached value so the next access refetches
    pub async fn invalidate(&self) {
        debug!("Invalidating cache for {}", self.source.name());
        *self.entry.lock().await = None;
    }

    /// Wall-clock time of the last successful load, if any
    pub async fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.entry.lock().await.as_ref().map(|e| e.loaded_at)
    }
}
