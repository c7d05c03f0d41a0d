pub mod config;
pub mod error;

pub use config::{
    is_valid_city_code, Config, ConfigValidationError, TimeLocale, ValidationResult,
    WeatherConfig,
};
pub use error::{AppError, ConfigError, NetworkError, WeatherError};

use anyhow::Result;

fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
}

/// Install the global `tracing` subscriber.
///
/// The filter comes from `RUST_LOG`, defaulting to `info`.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(env_filter()).init();

    tracing::info!("blockdemo core initialized");
    Ok(())
}

/// Install the subscriber unless the embedding host already did.
///
/// Returns `false` when a global subscriber was already set.
pub fn try_init() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .try_init()
        .is_ok()
}
