pub mod strings;
pub mod weather_model;

pub use strings::Strings;
pub use weather_model::{
    format_humidity, format_report_time, format_temperature, format_wind, Control, ControlAction,
    Notification, NotificationLevel, PanelState, WeatherPanel, WeatherPresenter, WeatherView,
};
