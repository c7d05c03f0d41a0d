//! amap.com live-weather provider with its own server-side cache.

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Client, StatusCode};
use serde_json::{Map, Value};
use std::time::Duration;
use tokio::time::Instant;
use tracing::instrument;

use crate::cache::TtlCache;
use crate::lookup::WeatherLookup;
use crate::types::{is_valid_city_code, WeatherError, WeatherRecord, WeatherResponse};

pub const DEFAULT_BASE_URL: &str = "https://restapi.amap.com";
const WEATHER_PATH: &str = "/v3/weather/weatherInfo";
const USER_AGENT: &str = concat!("blockdemo/", env!("CARGO_PKG_VERSION"));
const REQUIRED_FIELDS: [&str; 5] = ["province", "city", "weather", "temperature", "reporttime"];

#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Lifetime of the provider's own cache (independent of any client cache)
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_ttl: Duration::from_secs(30 * 60),
            request_timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug)]
pub struct AmapProvider {
    client: Client,
    settings: ProviderSettings,
    cache: Mutex<TtlCache<WeatherResponse>>,
}

impl AmapProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .connect_timeout(settings.connect_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| WeatherError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            settings,
            cache: Mutex::new(TtlCache::new()),
        })
    }

    /// Number of responses held in the provider cache.
    pub fn cached_len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }

    fn cache_key(city_code: &str) -> String {
        format!("weather_{}", city_code)
    }

    fn cached_response(&self, key: &str) -> Option<WeatherResponse> {
        let now = Instant::now();
        let cache = self.cache.lock();
        let fresh = cache
            .get(key)
            .filter(|entry| entry.is_fresh(self.settings.cache_ttl, now))
            .map(|entry| entry.value().clone());
        fresh
    }

    fn api_key(&self) -> Option<&str> {
        self.settings
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
    }

    #[instrument(skip(self, api_key), level = "debug")]
    async fn fetch_live(&self, city_code: &str, api_key: &str) -> Result<Value, WeatherError> {
        let url = format!(
            "{}{}",
            self.settings.base_url.trim_end_matches('/'),
            WEATHER_PATH
        );

        let response = self
            .client
            .get(&url)
            .query(&[("city", city_code), ("key", api_key), ("extensions", "base")])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        tracing::debug!("API response HTTP code: {}", status);
        if status != StatusCode::OK {
            return Err(WeatherError::Http(status.as_u16()));
        }

        let body = response.text().await.map_err(transport_error)?;
        serde_json::from_str(&body).map_err(|e| WeatherError::Decode(e.to_string()))
    }
}

#[async_trait]
impl WeatherLookup for AmapProvider {
    #[instrument(skip(self), level = "info")]
    async fn lookup(&self, city_code: &str, refresh: bool) -> Result<WeatherResponse, WeatherError> {
        let Some(api_key) = self.api_key() else {
            tracing::warn!("Weather API key is missing");
            return Err(WeatherError::ApiKeyMissing);
        };

        if !is_valid_city_code(city_code) {
            tracing::warn!("Invalid city code: {}", city_code);
            return Err(WeatherError::InvalidCityCode(city_code.to_string()));
        }

        let cache_key = Self::cache_key(city_code);
        if !refresh {
            if let Some(cached) = self.cached_response(&cache_key) {
                tracing::debug!("Returning cached weather data");
                return Ok(cached);
            }
        }

        tracing::debug!("Fetching fresh weather data from API");
        let now = chrono::Utc::now().timestamp();
        let result = self
            .fetch_live(city_code, api_key)
            .await
            .and_then(|body| parse_live_weather(&body, now));

        match result {
            Ok(record) => {
                let response = WeatherResponse::ok(record);
                self.cache
                    .lock()
                    .put(cache_key, response.clone(), Instant::now());
                tracing::debug!("Weather data processed and cached successfully");
                Ok(response)
            }
            Err(e) => {
                tracing::warn!("Weather API error: {}", e);
                Ok(WeatherResponse::failure(&e))
            }
        }
    }
}

fn transport_error(e: reqwest::Error) -> WeatherError {
    if e.is_timeout() {
        WeatherError::Transport("request timed out".to_string())
    } else {
        WeatherError::Transport(e.to_string())
    }
}

/// Turn a raw `weatherInfo` body into a record.
///
/// `now` becomes the record's `last_updated` (epoch seconds).
pub fn parse_live_weather(body: &Value, now: i64) -> Result<WeatherRecord, WeatherError> {
    if body.get("status").and_then(Value::as_str) != Some("1") {
        let info = body
            .get("info")
            .and_then(Value::as_str)
            .unwrap_or("Unknown API error");
        return Err(WeatherError::Upstream(info.to_string()));
    }

    let live = body
        .get("lives")
        .and_then(Value::as_array)
        .and_then(|lives| lives.first())
        .and_then(Value::as_object)
        .ok_or(WeatherError::NoData)?;

    for field in REQUIRED_FIELDS {
        if live.get(field).map_or(true, Value::is_null) {
            return Err(WeatherError::MissingField(field.to_string()));
        }
    }

    Ok(WeatherRecord {
        province: text(live, "province"),
        city: text(live, "city"),
        adcode: text(live, "adcode"),
        weather: text(live, "weather"),
        temperature: integer(live, "temperature"),
        temperature_float: float(live, "temperature_float"),
        wind_direction: text(live, "winddirection"),
        wind_power: text(live, "windpower"),
        humidity: integer(live, "humidity"),
        humidity_float: float(live, "humidity_float"),
        report_time: text(live, "reporttime"),
        last_updated: now,
    })
}

// amap sends `[]` for unknown text fields, so anything that isn't a
// string or number reads as empty.
fn text(live: &Map<String, Value>, key: &str) -> String {
    match live.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn float(live: &Map<String, Value>, key: &str) -> Option<f64> {
    match live.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn integer(live: &Map<String, Value>, key: &str) -> Option<i64> {
    match live.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|v| v.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v.trunc() as i64))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn live_body() -> Value {
        serde_json::json!({
            "status": "1",
            "count": "1",
            "info": "OK",
            "infocode": "10000",
            "lives": [{
                "province": "北京",
                "city": "东城区",
                "adcode": "110101",
                "weather": "晴",
                "temperature": "25",
                "winddirection": "西北",
                "windpower": "≤3",
                "humidity": "40",
                "reporttime": "2025-01-01 12:00:00",
                "temperature_float": "25.0",
                "humidity_float": "40.0"
            }]
        })
    }

    fn provider_for(server: &MockServer, cache_ttl: Duration) -> AmapProvider {
        AmapProvider::new(ProviderSettings {
            api_key: Some("test_key".to_string()),
            base_url: server.uri(),
            cache_ttl,
            ..ProviderSettings::default()
        })
        .unwrap()
    }

    #[test]
    fn test_parse_live_weather() {
        let record = parse_live_weather(&live_body(), 1_735_700_000).unwrap();
        assert_eq!(record.province, "北京");
        assert_eq!(record.city, "东城区");
        assert_eq!(record.adcode, "110101");
        assert_eq!(record.temperature, Some(25));
        assert_eq!(record.temperature_float, Some(25.0));
        assert_eq!(record.humidity, Some(40));
        assert_eq!(record.wind(), Some(("西北", "≤3")));
        assert_eq!(record.last_updated, 1_735_700_000);
    }

    #[test]
    fn test_parse_non_numeric_values_become_none() {
        let mut body = live_body();
        body["lives"][0]["temperature"] = Value::String("N/A".into());
        body["lives"][0]["humidity"] = serde_json::json!([]);
        body["lives"][0]["winddirection"] = serde_json::json!([]);

        let record = parse_live_weather(&body, 0).unwrap();
        assert_eq!(record.temperature, None);
        assert_eq!(record.humidity, None);
        assert!(record.wind().is_none());
    }

    #[test]
    fn test_parse_upstream_error() {
        let body = serde_json::json!({"status": "0", "info": "INVALID_USER_KEY"});
        let err = parse_live_weather(&body, 0).unwrap_err();
        assert!(matches!(err, WeatherError::Upstream(ref info) if info == "INVALID_USER_KEY"));

        let err = parse_live_weather(&serde_json::json!({}), 0).unwrap_err();
        assert_eq!(err.to_string(), "Weather API error: Unknown API error");
    }

    #[test]
    fn test_parse_empty_lives() {
        let body = serde_json::json!({"status": "1", "lives": []});
        assert!(matches!(parse_live_weather(&body, 0), Err(WeatherError::NoData)));
    }

    #[test]
    fn test_parse_missing_required_field() {
        let mut body = live_body();
        body["lives"][0].as_object_mut().unwrap().remove("temperature");
        let err = parse_live_weather(&body, 0).unwrap_err();
        assert!(matches!(err, WeatherError::MissingField(ref f) if f == "temperature"));
    }

    #[tokio::test]
    async fn test_lookup_success_is_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/weather/weatherInfo"))
            .and(query_param("city", "110101"))
            .and(query_param("key", "test_key"))
            .and(query_param("extensions", "base"))
            .respond_with(ResponseTemplate::new(200).set_body_json(live_body()))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server, Duration::from_secs(1800));
        let first = provider.lookup("110101", false).await.unwrap();
        let second = provider.lookup("110101", false).await.unwrap();

        assert!(first.success);
        assert_eq!(first, second);
        assert_eq!(provider.cached_len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_refresh_bypasses_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/weather/weatherInfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(live_body()))
            .expect(2)
            .mount(&server)
            .await;

        let provider = provider_for(&server, Duration::from_secs(1800));
        provider.lookup("110101", false).await.unwrap();
        provider.lookup("110101", true).await.unwrap();
    }

    #[tokio::test]
    async fn test_lookup_expired_cache_refetches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/weather/weatherInfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(live_body()))
            .expect(2)
            .mount(&server)
            .await;

        let provider = provider_for(&server, Duration::ZERO);
        provider.lookup("110101", false).await.unwrap();
        provider.lookup("110101", false).await.unwrap();
    }

    #[tokio::test]
    async fn test_lookup_http_error_is_structured_and_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/weather/weatherInfo"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        let provider = provider_for(&server, Duration::from_secs(1800));
        let response = provider.lookup("110101", false).await.unwrap();

        assert!(!response.success);
        assert!(response.data.is_none());
        let detail = response.error.unwrap();
        assert_eq!(detail.message, "HTTP 500");
        assert_eq!(detail.kind, "http_error");
        assert_eq!(detail.code, 500);
        assert_eq!(provider.cached_len(), 0);

        provider.lookup("110101", false).await.unwrap();
    }

    #[tokio::test]
    async fn test_lookup_bad_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/weather/weatherInfo"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let provider = provider_for(&server, Duration::from_secs(1800));
        let response = provider.lookup("110101", false).await.unwrap();
        assert_eq!(response.error.unwrap().kind, "json_decode_error");
    }

    #[tokio::test]
    async fn test_lookup_requires_api_key() {
        let provider = AmapProvider::new(ProviderSettings {
            api_key: Some("  ".to_string()),
            ..ProviderSettings::default()
        })
        .unwrap();

        let err = provider.lookup("110101", false).await.unwrap_err();
        assert!(matches!(err, WeatherError::ApiKeyMissing));
    }

    #[tokio::test]
    async fn test_lookup_rejects_bad_city_code() {
        let server = MockServer::start().await;
        let provider = provider_for(&server, Duration::from_secs(1800));

        let err = provider.lookup("11010a", false).await.unwrap_err();
        assert!(matches!(err, WeatherError::InvalidCityCode(ref c) if c == "11010a"));
    }

    #[tokio::test]
    async fn test_clear_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/weather/weatherInfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(live_body()))
            .expect(2)
            .mount(&server)
            .await;

        let provider = provider_for(&server, Duration::from_secs(1800));
        provider.lookup("110101", false).await.unwrap();
        provider.clear_cache();
        assert_eq!(provider.cached_len(), 0);
        provider.lookup("110101", false).await.unwrap();
    }
}
