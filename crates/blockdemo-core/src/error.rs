//! Application-wide error types.
//!
//! Every variant carries a `user_message()` for display; the `Display`
//! impl keeps the technical detail for logs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("network: {0}")]
    Network(#[from] NetworkError),

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("weather: {0}")]
    Weather(#[from] WeatherError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Short message safe to show to an end user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Network(e) => e.user_message(),
            Self::Config(e) => e.user_message(),
            Self::Weather(e) => e.user_message(),
            Self::Io(_) => "Could not read or write a local file.",
            Self::Other(_) => "Something went wrong. Try again.",
        }
    }
}

/// Failures talking to a remote service.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("could not connect: {0}")]
    ConnectionFailed(String),

    #[error("timed out")]
    Timeout,

    #[error("HTTP {status}: {message}")]
    ServerError { status: u16, message: String },

    #[error("unreadable response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::ConnectionFailed(_) => {
                "Could not reach the weather service. Check your network connection."
            }
            Self::Timeout => "The weather service took too long to answer. Try again.",
            Self::ServerError { status, .. } if *status >= 500 => {
                "The weather service is having problems. Try again later."
            }
            Self::ServerError { .. } => "The weather request was rejected.",
            Self::InvalidResponse(_) => "The weather service sent a response that could not be read.",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Invalid(_) => "The configuration file is invalid. Check config.toml.",
        }
    }
}

/// Weather failures as the application reports them.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("invalid city code `{0}`")]
    InvalidCityCode(String),

    #[error("{0}")]
    ApiError(String),

    #[error("API key not configured")]
    MissingApiKey,

    #[error("incomplete data: {0}")]
    BadData(String),
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidCityCode(_) => "City code must be six digits.",
            Self::ApiError(_) => "The weather service reported an error. Try again later.",
            Self::MissingApiKey => "Weather API key is not configured. Check settings.",
            Self::BadData(_) => "The weather service returned incomplete data.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_has_a_message() {
        let errors = [
            AppError::Network(NetworkError::Timeout),
            AppError::Network(NetworkError::ConnectionFailed("refused".into())),
            AppError::Config(ConfigError::Invalid("weather.api_base_url: no host".into())),
            AppError::Weather(WeatherError::MissingApiKey),
            AppError::Weather(WeatherError::BadData("city".into())),
            AppError::Io(std::io::Error::other("disk")),
            AppError::Other(anyhow::anyhow!("boom")),
        ];

        for err in errors {
            assert!(!err.user_message().is_empty(), "empty message for {err:?}");
        }
    }

    #[test]
    fn weather_error_converts_into_app_error() {
        let app_err: AppError = WeatherError::MissingApiKey.into();
        assert!(matches!(app_err, AppError::Weather(WeatherError::MissingApiKey)));
        assert_eq!(
            app_err.user_message(),
            "Weather API key is not configured. Check settings."
        );
    }

    #[test]
    fn server_error_message_depends_on_status() {
        let upstream = NetworkError::ServerError {
            status: 502,
            message: "bad gateway".into(),
        };
        let client = NetworkError::ServerError {
            status: 404,
            message: "missing".into(),
        };
        assert!(upstream.user_message().contains("later"));
        assert_eq!(client.user_message(), "The weather request was rejected.");
        assert_eq!(upstream.to_string(), "HTTP 502: bad gateway");
    }

    #[test]
    fn display_keeps_detail() {
        let err = AppError::Config(ConfigError::Invalid("weather.api_base_url: bad URL".into()));
        assert_eq!(err.to_string(), "config: weather.api_base_url: bad URL");
    }
}
