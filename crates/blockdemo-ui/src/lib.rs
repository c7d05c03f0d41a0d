//! Presentation layer for the weather panel: state driver, formatting,
//! views and the module handle.

pub mod console;
pub mod error_mapping;
pub mod models;
pub mod services;

pub use console::ConsoleView;
pub use error_mapping::{outcome_to_result, IntoAppError};
pub use models::{Strings, WeatherPanel, WeatherPresenter, WeatherView};
pub use services::{provider_settings, ModuleConfig, WeatherModule};
