use std::sync::Arc;

use blockdemo_core::{AppError, NetworkError, WeatherError as CoreWeatherError};
use blockdemo_weather::{ErrorKind, LoadOutcome, WeatherError, WeatherRecord};

/// Conversion into the application-wide error type.
pub trait IntoAppError {
    fn into_app_error(self) -> AppError;
}

impl IntoAppError for WeatherError {
    fn into_app_error(self) -> AppError {
        match self {
            WeatherError::ApiKeyMissing => AppError::Weather(CoreWeatherError::MissingApiKey),
            WeatherError::InvalidCityCode(code) => {
                AppError::Weather(CoreWeatherError::InvalidCityCode(code))
            }
            WeatherError::Http(status) => AppError::Network(NetworkError::ServerError {
                status,
                message: format!("HTTP {status}"),
            }),
            WeatherError::Transport(msg) if msg.contains("timed out") => {
                AppError::Network(NetworkError::Timeout)
            }
            WeatherError::Transport(msg) => AppError::Network(NetworkError::ConnectionFailed(msg)),
            WeatherError::Decode(msg) => AppError::Network(NetworkError::InvalidResponse(msg)),
            WeatherError::Upstream(msg) => AppError::Weather(CoreWeatherError::ApiError(msg)),
            err @ (WeatherError::NoData
            | WeatherError::MissingField(_)
            | WeatherError::InvalidPayload(_)) => {
                AppError::Weather(CoreWeatherError::BadData(err.to_string()))
            }
            WeatherError::Service { code, message, kind } => service_error(code, message, &kind),
        }
    }
}

/// Structured failures only carry their `type`; map by that first, then by kind.
fn service_error(code: i64, message: String, kind: &str) -> AppError {
    if kind == "http_error" {
        return AppError::Network(NetworkError::ServerError {
            status: u16::try_from(code).unwrap_or(0),
            message,
        });
    }

    let err = WeatherError::Service {
        code,
        message,
        kind: kind.to_string(),
    };
    match err.kind() {
        ErrorKind::Configuration => AppError::Weather(CoreWeatherError::MissingApiKey),
        ErrorKind::Validation => AppError::Weather(CoreWeatherError::InvalidCityCode(err.to_string())),
        ErrorKind::Transport => AppError::Network(NetworkError::ConnectionFailed(err.to_string())),
        ErrorKind::DataShape => AppError::Weather(CoreWeatherError::ApiError(err.to_string())),
    }
}

/// Record from a completed load; `Skipped` counts as a failure here.
pub fn outcome_to_result(outcome: LoadOutcome) -> Result<Arc<WeatherRecord>, AppError> {
    match outcome {
        LoadOutcome::Cached(record) | LoadOutcome::Fetched(record) => Ok(record),
        LoadOutcome::Failed(err) => Err(err.into_app_error()),
        LoadOutcome::Skipped => Err(AppError::Other(anyhow::anyhow!(
            "weather request already in progress"
        ))),
    }
}
