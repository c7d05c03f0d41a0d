//! Plain-text [`WeatherView`] for terminals and logs.

use std::fmt;
use std::io::{self, Stdout, Write};

use crate::models::{Control, Notification, NotificationLevel, WeatherPanel, WeatherView};

pub struct ConsoleView<W> {
    out: W,
}

impl ConsoleView<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsoleView<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, args: fmt::Arguments<'_>) {
        if let Err(e) = self.out.write_fmt(args).and_then(|()| self.out.write_all(b"\n")) {
            tracing::warn!("Failed to write weather output: {}", e);
        }
    }
}

impl<W: Write + Send> WeatherView for ConsoleView<W> {
    fn set_loading(&mut self, visible: bool, message: &str) {
        if visible {
            self.line(format_args!("{message}"));
        }
    }

    fn update_controls(&mut self, controls: &[Control]) {
        for control in controls {
            tracing::trace!(
                action = ?control.action,
                label = %control.label,
                disabled = control.disabled,
                "Control updated"
            );
        }
    }

    fn render_weather(&mut self, panel: &WeatherPanel) {
        self.line(format_args!("{}", panel.location));
        self.line(format_args!("  Weather:     {}", panel.condition));
        self.line(format_args!("  Temperature: {}", panel.temperature));
        self.line(format_args!("  Humidity:    {}", panel.humidity));
        if let Some(wind) = &panel.wind {
            self.line(format_args!("  Wind:        {wind}"));
        }
        self.line(format_args!("  Updated:     {}", panel.report_time));
    }

    fn render_error(&mut self, message: &str) {
        self.line(format_args!("Error: {message}"));
    }

    fn render_warning(&mut self, message: &str) {
        self.line(format_args!("Warning: {message}"));
    }

    fn notify(&mut self, notification: &Notification) {
        let tag = match notification.level {
            NotificationLevel::Success => "ok",
            NotificationLevel::Error => "error",
        };
        self.line(format_args!("[{tag}] {}", notification.message));
    }
}
