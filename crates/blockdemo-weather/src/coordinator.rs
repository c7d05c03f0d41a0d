//! Request coordination for one weather panel.
//!
//! At most one fetch sequence (cache check + lookup) runs per
//! [`WeatherFetcher`]; a request issued while another is in flight is
//! dropped. Results are reported to a [`FetchObserver`] as they happen.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::cache::WeatherCache;
use crate::lookup::WeatherLookup;
use crate::types::{WeatherError, WeatherRecord};

/// Client-side freshness window.
pub const DEFAULT_CLIENT_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    Cache,
    Network,
}

/// Receives the progress of a fetch sequence.
///
/// `finished` is called exactly once for every sequence that started,
/// after the in-flight flag has been released. This includes sequences whose
/// future was dropped before completing.
pub trait FetchObserver: Send + Sync {
    /// A network lookup is about to start (never called for cache hits).
    fn loading_started(&self, city_code: &str);

    fn loaded(&self, record: &WeatherRecord, source: FetchSource);

    fn failed(&self, error: &WeatherError);

    fn finished(&self);
}

#[derive(Debug)]
pub enum LoadOutcome {
    /// Another fetch was already in flight; nothing happened.
    Skipped,
    Cached(Arc<WeatherRecord>),
    Fetched(Arc<WeatherRecord>),
    Failed(WeatherError),
}

impl LoadOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    pub fn record(&self) -> Option<&WeatherRecord> {
        match self {
            Self::Cached(record) | Self::Fetched(record) => Some(record),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&WeatherError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Releases the in-flight flag and notifies the observer when dropped,
/// whatever path the sequence took (including cancellation).
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
    observer: &'a dyn FetchObserver,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool, observer: &'a dyn FetchObserver) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag, observer })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
        self.observer.finished();
    }
}

pub struct WeatherFetcher<L> {
    lookup: L,
    cache: Mutex<WeatherCache>,
    in_flight: AtomicBool,
    ttl: Duration,
}

impl<L: WeatherLookup> WeatherFetcher<L> {
    pub fn new(lookup: L, ttl: Duration) -> Self {
        Self {
            lookup,
            cache: Mutex::new(WeatherCache::new()),
            in_flight: AtomicBool::new(false),
            ttl,
        }
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Cached record for `city_code`, fresh or not.
    pub fn cached(&self, city_code: &str) -> Option<Arc<WeatherRecord>> {
        self.cache
            .lock()
            .get(city_code)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Drop one city's entry, or everything when `city_code` is `None`.
    pub fn clear_cache(&self, city_code: Option<&str>) {
        let mut cache = self.cache.lock();
        match city_code {
            Some(code) => {
                cache.delete(code);
            }
            None => cache.clear(),
        }
        tracing::debug!(city_code = city_code.unwrap_or("all"), "Weather cache cleared");
    }

    /// Run one fetch sequence for `city_code`.
    ///
    /// Returns [`LoadOutcome::Skipped`] without touching the observer if a
    /// sequence is already running on this fetcher.
    pub async fn load_weather(
        &self,
        city_code: &str,
        force_refresh: bool,
        observer: &dyn FetchObserver,
    ) -> LoadOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight, observer) else {
            tracing::debug!("Weather request already in progress");
            return LoadOutcome::Skipped;
        };

        self.run_sequence(city_code, force_refresh, observer).await
    }

    async fn run_sequence(
        &self,
        city_code: &str,
        force_refresh: bool,
        observer: &dyn FetchObserver,
    ) -> LoadOutcome {
        if !force_refresh {
            if let Some(record) = self.fresh_record(city_code) {
                tracing::debug!(city_code, "Using cached weather data");
                observer.loaded(&record, FetchSource::Cache);
                return LoadOutcome::Cached(record);
            }
        }

        observer.loading_started(city_code);
        tracing::debug!(city_code, refresh = force_refresh, "Calling weather API");

        let result = self
            .lookup
            .lookup(city_code, force_refresh)
            .await
            .and_then(|response| response.into_record());

        match result {
            Ok(record) => {
                tracing::debug!(city_code, "Weather API response received");
                let record = Arc::new(record);
                self.cache
                    .lock()
                    .put(city_code, Arc::clone(&record), Instant::now());
                observer.loaded(&record, FetchSource::Network);
                LoadOutcome::Fetched(record)
            }
            Err(err) => {
                tracing::error!(city_code, kind = ?err.kind(), "Failed to load weather data: {}", err);
                observer.failed(&err);
                LoadOutcome::Failed(err)
            }
        }
    }

    fn fresh_record(&self, city_code: &str) -> Option<Arc<WeatherRecord>> {
        let now = Instant::now();
        let cache = self.cache.lock();
        let fresh = cache
            .get(city_code)
            .filter(|entry| entry.is_fresh(self.ttl, now))
            .map(|entry| Arc::clone(entry.value()));
        fresh
    }
}
