use std::sync::Arc;

use async_trait::async_trait;

use crate::types::{WeatherError, WeatherResponse};

/// Something that can answer "what is the weather for city code X".
///
/// Implementations may report failure either as `Err` or as an `Ok`
/// response with `success == false`; callers must handle both.
#[async_trait]
pub trait WeatherLookup: Send + Sync {
    async fn lookup(&self, city_code: &str, refresh: bool) -> Result<WeatherResponse, WeatherError>;
}

#[async_trait]
impl<T: WeatherLookup + ?Sized> WeatherLookup for Arc<T> {
    async fn lookup(&self, city_code: &str, refresh: bool) -> Result<WeatherResponse, WeatherError> {
        (**self).lookup(city_code, refresh).await
    }
}
