use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable that overrides `weather.api_key`.
pub const API_KEY_ENV: &str = "BLOCKDEMO_WEATHER_API_KEY";

/// One problem found by [`Config::validate`], tied to a dotted field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors block start-up; warnings are only logged.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

fn issue(field: impl Into<String>, message: impl Into<String>) -> ConfigValidationError {
    ConfigValidationError {
        field: field.into(),
        message: message.into(),
    }
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(issue(field, message));
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(issue(field, message));
    }

    /// All errors on one line, `; `-separated.
    pub fn error_summary(&self) -> String {
        let parts: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        parts.join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding `config.toml`
    pub config_dir: PathBuf,

    #[serde(default)]
    pub weather: WeatherConfig,
}

/// How report times are rendered in the weather panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimeLocale {
    #[default]
    ZhCn,
    EnUs,
    Iso,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// amap.com web service key; `BLOCKDEMO_WEATHER_API_KEY` wins when set
    pub api_key: Option<String>,

    /// Base URL of the weather web service
    pub api_base_url: String,

    /// City code used when an action doesn't name one
    pub default_city_code: String,

    /// Server-side (provider) cache lifetime in minutes
    pub server_cache_minutes: u32,

    /// Client-side (module) cache lifetime in seconds
    pub client_cache_secs: u64,

    pub request_timeout_secs: u64,

    pub connect_timeout_secs: u64,

    /// Fetch weather for the default city as soon as the module starts
    pub auto_load: bool,

    pub time_locale: TimeLocale,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: "https://restapi.amap.com".to_string(),
            default_city_code: "110101".to_string(),
            server_cache_minutes: 30,
            client_cache_secs: 300,
            request_timeout_secs: 15,
            connect_timeout_secs: 10,
            auto_load: false,
            time_locale: TimeLocale::ZhCn,
        }
    }
}

impl WeatherConfig {
    /// Check if an API key is configured (not blank)
    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }

    /// Replace the configured key with the environment override, if any.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                tracing::info!("Using weather API key from {}", API_KEY_ENV);
                self.api_key = Some(key);
            }
        }
    }
}

/// Six ASCII digits, e.g. `110101`.
pub fn is_valid_city_code(code: &str) -> bool {
    code.len() == 6 && code.bytes().all(|b| b.is_ascii_digit())
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("blockdemo");

        Self {
            config_dir,
            weather: WeatherConfig::default(),
        }
    }
}

impl Config {
    /// Read `<config_dir>/blockdemo/config.toml`.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Read `path`, writing a default file there first if none exists.
    ///
    /// Environment overrides are applied after parsing.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            toml::from_str::<Config>(&raw).with_context(|| format!("parsing {}", path.display()))?
        } else {
            tracing::info!(path = %path.display(), "Writing default configuration");
            let config = Self::default();
            config.save_to(path)?;
            config
        };

        config.weather.apply_env_overrides();
        Ok(config)
    }

    /// [`load`](Self::load) followed by [`validate`](Self::validate).
    ///
    /// Fails when validation reports errors; warnings are logged and returned.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let report = config.validate();
        if !report.is_valid() {
            anyhow::bail!("invalid configuration: {}", report.error_summary());
        }
        for warning in &report.warnings {
            tracing::warn!("Config warning: {}", warning);
        }
        Ok((config, report))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();
        let weather = &self.weather;

        self.validate_url(&weather.api_base_url, "weather.api_base_url", &mut result);

        if !is_valid_city_code(&weather.default_city_code) {
            result.add_error(
                "weather.default_city_code",
                format!(
                    "City code must be six digits, got: {}",
                    weather.default_city_code
                ),
            );
        }

        if weather.client_cache_secs == 0 {
            result.add_warning(
                "weather.client_cache_secs",
                "Client-side weather cache disabled (0 seconds)",
            );
        }

        if weather.server_cache_minutes > 1440 {
            result.add_warning(
                "weather.server_cache_minutes",
                "Server-side weather cache is longer than 24 hours",
            );
        }

        if weather.request_timeout_secs == 0 {
            result.add_error(
                "weather.request_timeout_secs",
                "Request timeout must be greater than 0",
            );
        }

        if !weather.has_api_key() {
            result.add_warning(
                "weather.api_key",
                "Weather API key not configured - the weather panel will be disabled",
            );
        }

        result
    }

    fn validate_url(&self, raw: &str, field: &str, result: &mut ValidationResult) {
        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(e) => {
                result.add_error(field, format!("not a valid URL ({e})"));
                return;
            }
        };

        if !matches!(url.scheme(), "http" | "https") {
            result.add_error(
                field,
                format!("scheme must be http or https, got `{}`", url.scheme()),
            );
        }
        if url.host().is_none() {
            result.add_error(field, "URL has no host");
        }
        if url.port() == Some(0) {
            result.add_error(field, "port 0 is not usable");
        }
    }

    /// Write as pretty TOML, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        let body = toml::to_string_pretty(self).context("serializing configuration")?;
        std::fs::write(path, body).with_context(|| format!("writing {}", path.display()))
    }

    fn config_path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("no platform config directory")?;
        Ok(base.join("blockdemo").join("config.toml"))
    }
}
