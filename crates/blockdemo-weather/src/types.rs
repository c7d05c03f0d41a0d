use serde::{Deserialize, Serialize};

/// Current conditions for one city at one point in time.
///
/// Required fields are plain strings; everything the upstream service may
/// omit is optional or defaults to empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub province: String,
    pub city: String,
    /// Administrative division code
    #[serde(default)]
    pub adcode: String,
    pub weather: String,
    pub temperature: Option<i64>,
    #[serde(default)]
    pub temperature_float: Option<f64>,
    #[serde(default, rename = "winddirection")]
    pub wind_direction: String,
    #[serde(default, rename = "windpower")]
    pub wind_power: String,
    #[serde(default)]
    pub humidity: Option<i64>,
    #[serde(default)]
    pub humidity_float: Option<f64>,
    #[serde(rename = "reporttime")]
    pub report_time: String,
    /// Epoch seconds when the provider produced this record
    #[serde(default)]
    pub last_updated: i64,
}

impl WeatherRecord {
    /// Check that every required field carries a value.
    pub fn validate(&self) -> Result<(), WeatherError> {
        let required = [
            ("province", &self.province),
            ("city", &self.city),
            ("weather", &self.weather),
            ("reporttime", &self.report_time),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(WeatherError::MissingField(name.to_string()));
            }
        }
        Ok(())
    }

    /// Wind direction and power, only when both are known.
    pub fn wind(&self) -> Option<(&str, &str)> {
        if self.wind_direction.is_empty() || self.wind_power.is_empty() {
            None
        } else {
            Some((&self.wind_direction, &self.wind_power))
        }
    }
}

/// Error detail carried by a structured failure response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    #[serde(default)]
    pub item: Option<String>,
    #[serde(default)]
    pub warningcode: String,
    #[serde(default)]
    pub message: String,
}

/// Envelope returned by the weather lookup service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<WeatherRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ServiceError>,
    #[serde(default)]
    pub warnings: Vec<Warning>,
}

impl WeatherResponse {
    pub fn ok(record: WeatherRecord) -> Self {
        Self {
            success: true,
            data: Some(record),
            error: None,
            warnings: Vec::new(),
        }
    }

    /// Structured failure describing `err`.
    pub fn failure(err: &WeatherError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ServiceError {
                code: err.code(),
                message: err.to_string(),
                kind: err.error_code().to_string(),
            }),
            warnings: Vec::new(),
        }
    }

    /// Collapse either response shape into a validated record or one error.
    pub fn into_record(self) -> Result<WeatherRecord, WeatherError> {
        if !self.success {
            return Err(match self.error {
                Some(detail) => WeatherError::Service {
                    code: detail.code,
                    message: detail.message,
                    kind: detail.kind,
                },
                None => WeatherError::InvalidPayload("request reported failure".to_string()),
            });
        }

        let record = self
            .data
            .ok_or_else(|| WeatherError::InvalidPayload("missing data".to_string()))?;
        record.validate()?;
        Ok(record)
    }
}

/// Coarse classification used for display and mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Validation,
    Transport,
    DataShape,
}

/// Weather lookup errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Weather API key is not configured")]
    ApiKeyMissing,
    #[error("Invalid city code: {0}")]
    InvalidCityCode(String),
    #[error("HTTP {0}")]
    Http(u16),
    #[error("Network error: {0}")]
    Transport(String),
    #[error("Invalid JSON response: {0}")]
    Decode(String),
    #[error("Weather API error: {0}")]
    Upstream(String),
    #[error("No weather data in API response")]
    NoData,
    #[error("Missing required weather field: {0}")]
    MissingField(String),
    #[error("Invalid weather data received: {0}")]
    InvalidPayload(String),
    #[error("{message}")]
    Service {
        code: i64,
        message: String,
        kind: String,
    },
}

impl WeatherError {
    /// Stable identifier, also used as the `type` of a structured failure.
    pub fn error_code(&self) -> &str {
        match self {
            Self::ApiKeyMissing => "weather_api_key_missing",
            Self::InvalidCityCode(_) => "invalid_city_code",
            Self::Http(_) => "http_error",
            Self::Transport(_) => "curl_error",
            Self::Decode(_) => "json_decode_error",
            Self::Upstream(_) => "api_response_error",
            Self::NoData => "no_weather_data",
            Self::MissingField(_) => "missing_weather_field",
            Self::InvalidPayload(_) => "invalid_weather_data",
            Self::Service { kind, .. } => kind.as_str(),
        }
    }

    /// Numeric code; the HTTP status where one exists.
    pub fn code(&self) -> i64 {
        match self {
            Self::Http(status) => i64::from(*status),
            Self::Service { code, .. } => *code,
            _ => 0,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self.error_code() {
            "weather_api_key_missing" => ErrorKind::Configuration,
            "invalid_city_code" => ErrorKind::Validation,
            "http_error" | "curl_error" | "json_decode_error" => ErrorKind::Transport,
            _ => ErrorKind::DataShape,
        }
    }
}

pub use blockdemo_core::is_valid_city_code;
