//! Presentation state for one weather panel.
//!
//! [`WeatherPresenter`] turns fetch progress into view updates: it shows and
//! hides the loading indicator, disables and restores the action controls,
//! and renders either the formatted record or an error.

use blockdemo_core::TimeLocale;
use blockdemo_weather::{ErrorKind, FetchObserver, FetchSource, WeatherError, WeatherRecord};
use chrono::{DateTime, NaiveDateTime};
use parking_lot::Mutex;

use super::strings::{self, Strings};

const PLACEHOLDER: &str = "--";
const REPORT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelState {
    #[default]
    Idle,
    Loading,
    Settled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    GetWeather,
    RefreshWeather,
}

/// A button-like control that is locked while a fetch is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub action: ControlAction,
    pub label: String,
    pub disabled: bool,
    saved_label: Option<String>,
}

impl Control {
    pub fn new(action: ControlAction, label: impl Into<String>) -> Self {
        Self {
            action,
            label: label.into(),
            disabled: false,
            saved_label: None,
        }
    }

    fn lock(&mut self, loading_label: &str) {
        let previous = std::mem::replace(&mut self.label, loading_label.to_string());
        // A second lock must not overwrite the label we restore to.
        self.saved_label.get_or_insert(previous);
        self.disabled = true;
    }

    fn restore(&mut self) {
        if let Some(label) = self.saved_label.take() {
            self.label = label;
            self.disabled = false;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// Transient message shown alongside the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// A record formatted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherPanel {
    pub location: String,
    pub condition: String,
    pub temperature: String,
    pub humidity: String,
    /// Only present when both wind direction and power are known
    pub wind: Option<String>,
    pub report_time: String,
}

impl WeatherPanel {
    pub fn from_record(record: &WeatherRecord, locale: TimeLocale) -> Self {
        Self {
            location: format!("{} {}", record.province, record.city),
            condition: record.weather.clone(),
            temperature: format_temperature(record.temperature),
            humidity: format_humidity(record.humidity),
            wind: format_wind(record, locale),
            report_time: format_report_time(&record.report_time, locale),
        }
    }
}

pub fn format_temperature(value: Option<i64>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), |t| format!("{t}°C"))
}

pub fn format_humidity(value: Option<i64>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), |h| format!("{h}%"))
}

pub fn format_wind(record: &WeatherRecord, locale: TimeLocale) -> Option<String> {
    let (direction, power) = record.wind()?;
    Some(match locale {
        TimeLocale::ZhCn => format!("{direction} {power}级"),
        TimeLocale::EnUs | TimeLocale::Iso => format!("{direction} {power}"),
    })
}

/// Render a report timestamp for `locale`.
///
/// Accepts `YYYY-MM-DD HH:MM:SS` or RFC 3339; anything else is returned
/// unchanged.
pub fn format_report_time(raw: &str, locale: TimeLocale) -> String {
    let trimmed = raw.trim();
    let parsed = NaiveDateTime::parse_from_str(trimmed, REPORT_TIME_FORMAT)
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|dt| dt.naive_local())
        });

    let Some(time) = parsed else {
        tracing::debug!(raw, "Unparseable report time, showing as-is");
        return raw.to_string();
    };

    let pattern = match locale {
        TimeLocale::ZhCn => "%Y/%-m/%-d %H:%M:%S",
        TimeLocale::EnUs => "%-m/%-d/%Y, %-I:%M:%S %p",
        TimeLocale::Iso => REPORT_TIME_FORMAT,
    };
    time.format(pattern).to_string()
}

/// Rendering surface driven by [`WeatherPresenter`].
pub trait WeatherView: Send {
    fn set_loading(&mut self, visible: bool, message: &str);

    fn update_controls(&mut self, controls: &[Control]);

    fn render_weather(&mut self, panel: &WeatherPanel);

    fn render_error(&mut self, message: &str);

    /// Persistent warning shown in place of the panel.
    fn render_warning(&mut self, message: &str);

    fn notify(&mut self, notification: &Notification);
}

struct PresenterState<V> {
    view: V,
    state: PanelState,
    loader_visible: bool,
    controls: Vec<Control>,
}

pub struct WeatherPresenter<V> {
    inner: Mutex<PresenterState<V>>,
    strings: Strings,
    locale: TimeLocale,
}

impl<V: WeatherView> WeatherPresenter<V> {
    pub fn new(view: V, strings: Strings, locale: TimeLocale) -> Self {
        let controls = vec![
            Control::new(ControlAction::GetWeather, strings.get(strings::GET_WEATHER)),
            Control::new(ControlAction::RefreshWeather, strings.get(strings::REFRESH_WEATHER)),
        ];
        Self {
            inner: Mutex::new(PresenterState {
                view,
                state: PanelState::Idle,
                loader_visible: false,
                controls,
            }),
            strings,
            locale,
        }
    }

    pub fn state(&self) -> PanelState {
        self.inner.lock().state
    }

    pub fn controls(&self) -> Vec<Control> {
        self.inner.lock().controls.clone()
    }

    pub fn strings(&self) -> &Strings {
        &self.strings
    }

    /// Publish the initial controls to the view.
    pub fn attach_controls(&self) {
        let mut inner = self.inner.lock();
        let PresenterState { view, controls, .. } = &mut *inner;
        view.update_controls(controls);
    }

    pub fn show_api_key_missing(&self) {
        let message = self.strings.get(strings::WEATHER_API_KEY_MISSING);
        self.inner.lock().view.render_warning(message);
    }

    pub fn into_view(self) -> V {
        self.inner.into_inner().view
    }
}

impl<V: WeatherView> FetchObserver for WeatherPresenter<V> {
    fn loading_started(&self, city_code: &str) {
        tracing::trace!(city_code, "Showing loading state");
        let loading_label = self.strings.get(strings::LOADING);
        let mut inner = self.inner.lock();
        let PresenterState {
            view,
            state,
            loader_visible,
            controls,
        } = &mut *inner;

        *state = PanelState::Loading;
        *loader_visible = true;
        view.set_loading(true, self.strings.get(strings::LOADING_WEATHER));
        for control in controls.iter_mut() {
            control.lock(loading_label);
        }
        view.update_controls(controls);
    }

    fn loaded(&self, record: &WeatherRecord, source: FetchSource) {
        let panel = WeatherPanel::from_record(record, self.locale);
        let mut inner = self.inner.lock();
        inner.state = PanelState::Settled;
        inner.view.render_weather(&panel);

        if source == FetchSource::Network {
            let message = self.strings.get(strings::WEATHER_LOADED_SUCCESSFULLY);
            if !message.is_empty() {
                inner.view.notify(&Notification {
                    level: NotificationLevel::Success,
                    message: message.to_string(),
                });
            }
        }
    }

    fn failed(&self, error: &WeatherError) {
        if error.kind() == ErrorKind::Configuration {
            tracing::warn!("Weather lookup reported a missing API key");
            self.show_api_key_missing();
            self.inner.lock().state = PanelState::Settled;
            return;
        }

        let mut message = error.to_string();
        if message.trim().is_empty() {
            message = self.strings.get(strings::WEATHER_ERROR_GENERIC).to_string();
        }

        let mut inner = self.inner.lock();
        inner.state = PanelState::Settled;
        inner.view.notify(&Notification {
            level: NotificationLevel::Error,
            message: message.clone(),
        });
        inner.view.render_error(&message);
    }

    fn finished(&self) {
        let mut inner = self.inner.lock();
        let PresenterState {
            view,
            state,
            loader_visible,
            controls,
        } = &mut *inner;

        if std::mem::take(loader_visible) {
            view.set_loading(false, "");
        }
        let was_locked = controls.iter().any(|c| c.disabled);
        for control in controls.iter_mut() {
            control.restore();
        }
        if was_locked {
            view.update_controls(controls);
        }
        *state = PanelState::Idle;
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    fn record() -> WeatherRecord {
        WeatherRecord {
            province: "北京".into(),
            city: "北京市".into(),
            adcode: "110101".into(),
            weather: "晴".into(),
            temperature: Some(25),
            temperature_float: None,
            wind_direction: String::new(),
            wind_power: String::new(),
            humidity: Some(40),
            humidity_float: None,
            report_time: "2025-01-01 12:00:00".into(),
            last_updated: 0,
        }
    }

    #[derive(Default)]
    struct RecordingView {
        loading: Vec<bool>,
        controls: Vec<Vec<Control>>,
        panels: Vec<WeatherPanel>,
        errors: Vec<String>,
        warnings: Vec<String>,
        notifications: Vec<Notification>,
    }

    impl WeatherView for RecordingView {
        fn set_loading(&mut self, visible: bool, _message: &str) {
            self.loading.push(visible);
        }

        fn update_controls(&mut self, controls: &[Control]) {
            self.controls.push(controls.to_vec());
        }

        fn render_weather(&mut self, panel: &WeatherPanel) {
            self.panels.push(panel.clone());
        }

        fn render_error(&mut self, message: &str) {
            self.errors.push(message.to_string());
        }

        fn render_warning(&mut self, message: &str) {
            self.warnings.push(message.to_string());
        }

        fn notify(&mut self, notification: &Notification) {
            self.notifications.push(notification.clone());
        }
    }

    fn presenter() -> WeatherPresenter<RecordingView> {
        WeatherPresenter::new(RecordingView::default(), Strings::default(), TimeLocale::ZhCn)
    }

    #[test]
    fn temperature_and_humidity_placeholders() {
        assert_eq!(format_temperature(Some(25)), "25°C");
        assert_eq!(format_temperature(Some(-3)), "-3°C");
        assert_eq!(format_temperature(None), "--");
        assert_eq!(format_humidity(Some(18)), "18%");
        assert_eq!(format_humidity(None), "--");
    }

    #[test]
    fn wind_line_needs_both_fields() {
        let mut rec = record();
        assert!(format_wind(&rec, TimeLocale::ZhCn).is_none());

        rec.wind_direction = "西北".into();
        assert!(format_wind(&rec, TimeLocale::ZhCn).is_none());

        rec.wind_power = "≤3".into();
        assert_eq!(format_wind(&rec, TimeLocale::ZhCn).as_deref(), Some("西北 ≤3级"));
        assert_eq!(format_wind(&rec, TimeLocale::EnUs).as_deref(), Some("西北 ≤3"));
    }

    #[test]
    fn report_time_per_locale() {
        let raw = "2025-01-01 12:00:00";
        assert_eq!(format_report_time(raw, TimeLocale::ZhCn), "2025/1/1 12:00:00");
        assert_eq!(format_report_time(raw, TimeLocale::EnUs), "1/1/2025, 12:00:00 PM");
        assert_eq!(format_report_time(raw, TimeLocale::Iso), raw);
        assert_eq!(
            format_report_time("2025-03-09T08:05:00+08:00", TimeLocale::Iso),
            "2025-03-09 08:05:00"
        );
    }

    #[test]
    fn unparseable_report_time_is_shown_raw() {
        assert_eq!(format_report_time("yesterday", TimeLocale::ZhCn), "yesterday");
        assert_eq!(format_report_time("", TimeLocale::EnUs), "");
    }

    #[test]
    fn panel_from_record() {
        let panel = WeatherPanel::from_record(&record(), TimeLocale::ZhCn);
        assert_eq!(panel.location, "北京 北京市");
        assert_eq!(panel.condition, "晴");
        assert_eq!(panel.temperature, "25°C");
        assert_eq!(panel.humidity, "40%");
        assert!(panel.wind.is_none());
        assert_eq!(panel.report_time, "2025/1/1 12:00:00");
    }

    #[test]
    fn network_load_locks_and_restores_controls() {
        let presenter = presenter();
        let original = presenter.controls();

        presenter.loading_started("110101");
        assert_eq!(presenter.state(), PanelState::Loading);
        let locked = presenter.controls();
        assert!(locked.iter().all(|c| c.disabled && c.label == "Loading..."));

        presenter.loaded(&record(), FetchSource::Network);
        assert_eq!(presenter.state(), PanelState::Settled);

        presenter.finished();
        assert_eq!(presenter.state(), PanelState::Idle);
        assert_eq!(presenter.controls(), original);

        let view = presenter.into_view();
        assert_eq!(view.loading, vec![true, false]);
        assert_eq!(view.panels.len(), 1);
        assert_eq!(
            view.notifications,
            vec![Notification {
                level: NotificationLevel::Success,
                message: "Weather data loaded successfully".into(),
            }]
        );
    }

    #[test]
    fn cache_hit_renders_without_loader_or_notification() {
        let presenter = presenter();
        presenter.loaded(&record(), FetchSource::Cache);
        presenter.finished();

        let view = presenter.into_view();
        assert!(view.loading.is_empty());
        assert!(view.controls.is_empty());
        assert!(view.notifications.is_empty());
        assert_eq!(view.panels[0].temperature, "25°C");
    }

    #[test]
    fn failure_renders_error_and_restores_controls() {
        let presenter = presenter();
        let original = presenter.controls();

        presenter.loading_started("110101");
        presenter.failed(&WeatherError::Http(500));
        presenter.finished();

        assert_eq!(presenter.controls(), original);
        let view = presenter.into_view();
        assert_eq!(view.errors, vec!["HTTP 500"]);
        assert_eq!(view.notifications[0].level, NotificationLevel::Error);
        assert_eq!(view.loading, vec![true, false]);
    }

    #[test]
    fn missing_key_from_lookup_is_a_warning() {
        let presenter = presenter();
        presenter.loading_started("110101");
        presenter.failed(&WeatherError::Service {
            code: 0,
            message: "Weather API key is not configured".into(),
            kind: "weather_api_key_missing".into(),
        });
        presenter.finished();

        let view = presenter.into_view();
        assert_eq!(
            view.warnings,
            vec!["Weather API key is not configured. Ask your administrator to set it."]
        );
        assert!(view.errors.is_empty());
        assert!(view.notifications.is_empty());
        assert_eq!(view.loading, vec![true, false]);
    }

    #[test]
    fn empty_error_message_uses_generic_string() {
        let presenter = presenter();
        presenter.failed(&WeatherError::Service {
            code: 0,
            message: String::new(),
            kind: "api_response_error".into(),
        });

        let view = presenter.into_view();
        assert_eq!(view.errors, vec!["Failed to load weather data"]);
    }

    #[test]
    fn api_key_warning_uses_string_table() {
        let strings = Strings::default().with(strings::WEATHER_API_KEY_MISSING, "请先配置天气API密钥");
        let presenter = WeatherPresenter::new(RecordingView::default(), strings, TimeLocale::ZhCn);
        presenter.show_api_key_missing();
        assert_eq!(presenter.into_view().warnings, vec!["请先配置天气API密钥"]);
    }
}
