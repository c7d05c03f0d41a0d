pub mod weather_service;

pub use weather_service::{provider_settings, ModuleConfig, WeatherModule};
