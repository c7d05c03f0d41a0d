//! Display strings for the weather panel.

use std::collections::HashMap;

pub const LOADING: &str = "loading";
pub const LOADING_WEATHER: &str = "loading_weather";
pub const WEATHER_LOADED_SUCCESSFULLY: &str = "weather_loaded_successfully";
pub const WEATHER_ERROR_GENERIC: &str = "weather_error_generic";
pub const WEATHER_API_KEY_MISSING: &str = "weather_api_key_missing";
pub const GET_WEATHER: &str = "get_weather";
pub const REFRESH_WEATHER: &str = "refresh_weather";

const DEFAULTS: &[(&str, &str)] = &[
    (LOADING, "Loading..."),
    (LOADING_WEATHER, "Loading weather data..."),
    (WEATHER_LOADED_SUCCESSFULLY, "Weather data loaded successfully"),
    (WEATHER_ERROR_GENERIC, "Failed to load weather data"),
    (
        WEATHER_API_KEY_MISSING,
        "Weather API key is not configured. Ask your administrator to set it.",
    ),
    (GET_WEATHER, "Get weather"),
    (REFRESH_WEATHER, "Refresh"),
];

/// Key/value string table with English defaults.
///
/// Unknown keys resolve to the key itself.
#[derive(Debug, Clone)]
pub struct Strings {
    table: HashMap<String, String>,
}

impl Default for Strings {
    fn default() -> Self {
        Self {
            table: DEFAULTS
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        }
    }
}

impl Strings {
    /// A table with no entries; every lookup returns its key.
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    pub fn get<'a>(&'a self, key: &'a str) -> &'a str {
        self.table.get(key).map_or(key, String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.table.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
