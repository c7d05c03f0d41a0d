//! Weather lookup for the blockdemo panel
//!
//! Live conditions come from the AMap weather API. Two cache layers sit in
//! front of it: one inside the provider, one in the request coordinator.

pub mod cache;
pub mod coordinator;
pub mod lookup;
pub mod provider;
pub mod types;

pub use cache::{CacheEntry, TtlCache, WeatherCache};
pub use coordinator::{FetchObserver, FetchSource, LoadOutcome, WeatherFetcher, DEFAULT_CLIENT_TTL};
pub use lookup::WeatherLookup;
pub use provider::{AmapProvider, ProviderSettings};
pub use types::*;
