//! Weather module: one panel instance wired to a lookup and a view.
//!
//! A [`WeatherModule`] is created with [`WeatherModule::init`] and handed back
//! to the caller; every action goes through that handle and
//! [`WeatherModule::destroy`] tears it down.

use std::time::Duration;

use blockdemo_core::{TimeLocale, WeatherConfig};
use blockdemo_weather::{
    LoadOutcome, ProviderSettings, WeatherFetcher, WeatherLookup, DEFAULT_CLIENT_TTL,
};
use parking_lot::Mutex;

use crate::models::{Strings, WeatherPresenter, WeatherView};

/// Settings for one module instance.
#[derive(Debug, Clone)]
pub struct ModuleConfig {
    pub default_city_code: String,
    /// Opaque id of the hosting block, used only for logging
    pub block_instance_id: Option<String>,
    pub has_api_key: bool,
    pub auto_load: bool,
    pub client_cache_ttl: Duration,
    pub time_locale: TimeLocale,
    pub strings: Strings,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            default_city_code: "110101".to_string(),
            block_instance_id: None,
            has_api_key: false,
            auto_load: false,
            client_cache_ttl: DEFAULT_CLIENT_TTL,
            time_locale: TimeLocale::default(),
            strings: Strings::default(),
        }
    }
}

impl ModuleConfig {
    pub fn from_weather_config(config: &WeatherConfig) -> Self {
        Self {
            default_city_code: config.default_city_code.clone(),
            has_api_key: config.has_api_key(),
            auto_load: config.auto_load,
            client_cache_ttl: Duration::from_secs(config.client_cache_secs),
            time_locale: config.time_locale,
            ..Self::default()
        }
    }
}

/// Provider settings for the server-side tier.
pub fn provider_settings(config: &WeatherConfig) -> ProviderSettings {
    ProviderSettings {
        api_key: config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string),
        base_url: config.api_base_url.clone(),
        cache_ttl: Duration::from_secs(u64::from(config.server_cache_minutes) * 60),
        request_timeout: Duration::from_secs(config.request_timeout_secs),
        connect_timeout: Duration::from_secs(config.connect_timeout_secs),
    }
}

pub struct WeatherModule<L, V> {
    config: ModuleConfig,
    fetcher: WeatherFetcher<L>,
    presenter: WeatherPresenter<V>,
    selected_city: Mutex<Option<String>>,
    enabled: bool,
}

impl<L: WeatherLookup, V: WeatherView> WeatherModule<L, V> {
    /// Build a module instance and run its start-up sequence.
    ///
    /// Without an API key the panel shows a persistent warning and every
    /// action on the returned handle is a no-op.
    pub async fn init(config: ModuleConfig, lookup: L, view: V) -> Self {
        let instance = config
            .block_instance_id
            .clone()
            .unwrap_or_else(|| "-".to_string());
        tracing::debug!(
            instance = %instance,
            default_city = %config.default_city_code,
            auto_load = config.auto_load,
            "Initializing weather module"
        );

        let presenter = WeatherPresenter::new(view, config.strings.clone(), config.time_locale);
        let fetcher = WeatherFetcher::new(lookup, config.client_cache_ttl);
        let module = Self {
            enabled: config.has_api_key,
            config,
            fetcher,
            presenter,
            selected_city: Mutex::new(None),
        };

        if !module.enabled {
            tracing::warn!(instance = %instance, "Weather API key not configured");
            module.presenter.show_api_key_missing();
            return module;
        }

        module.presenter.attach_controls();
        tracing::debug!(instance = %instance, "Weather controls attached");

        if module.config.auto_load {
            module.get_weather(None).await;
        }

        tracing::debug!(instance = %instance, "Weather module initialized");
        module
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_loading(&self) -> bool {
        self.fetcher.is_loading()
    }

    pub fn presenter(&self) -> &WeatherPresenter<V> {
        &self.presenter
    }

    pub fn fetcher(&self) -> &WeatherFetcher<L> {
        &self.fetcher
    }

    /// Last selected city, or the configured default.
    pub fn selected_city(&self) -> String {
        self.selected_city
            .lock()
            .clone()
            .unwrap_or_else(|| self.config.default_city_code.clone())
    }

    /// Show weather for `city_code`, from cache when fresh.
    ///
    /// Returns `None` when the module is disabled.
    pub async fn get_weather(&self, city_code: Option<&str>) -> Option<LoadOutcome> {
        tracing::debug!(city_code, "Get weather requested");
        self.load(city_code, false).await
    }

    /// Like [`get_weather`](Self::get_weather) but always goes to the network.
    pub async fn refresh_weather(&self, city_code: Option<&str>) -> Option<LoadOutcome> {
        tracing::debug!(city_code, "Refresh weather requested");
        self.load(city_code, true).await
    }

    /// Load `city_code` and remember it as the selection.
    ///
    /// A request dropped because another fetch is in flight leaves the
    /// previous selection in place.
    pub async fn city_selected(&self, city_code: &str) -> Option<LoadOutcome> {
        tracing::debug!(city_code, "City selection changed");
        let outcome = self.load(Some(city_code), false).await?;
        if !outcome.is_skipped() {
            *self.selected_city.lock() = Some(city_code.to_string());
        }
        Some(outcome)
    }

    pub fn clear_cache(&self, city_code: Option<&str>) {
        if self.enabled {
            self.fetcher.clear_cache(city_code);
        }
    }

    /// Tear the instance down, dropping every cached record.
    pub fn destroy(self) -> V {
        self.fetcher.clear_cache(None);
        tracing::debug!(
            instance = self.config.block_instance_id.as_deref().unwrap_or("-"),
            "Weather module destroyed"
        );
        self.presenter.into_view()
    }

    async fn load(&self, city_code: Option<&str>, refresh: bool) -> Option<LoadOutcome> {
        if !self.enabled {
            tracing::debug!("Weather module disabled, ignoring request");
            return None;
        }
        let city = city_code.map_or_else(|| self.selected_city(), str::to_string);
        Some(self.fetcher.load_weather(&city, refresh, &self.presenter).await)
    }
}
