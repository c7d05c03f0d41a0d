use std::process::ExitCode;

use blockdemo_core::{AppError, Config, ConfigError, WeatherError};
use blockdemo_ui::{outcome_to_result, provider_settings, ConsoleView, IntoAppError, ModuleConfig, WeatherModule};
use blockdemo_weather::AmapProvider;
use clap::Parser;

/// Show current weather for a six-digit city code.
#[derive(Debug, Parser)]
#[command(name = "blockdemo", version, about)]
struct Cli {
    /// City code, e.g. 110101; defaults to the configured city
    city_code: Option<String>,

    /// Bypass the client cache and ask the weather service again
    #[arg(long)]
    refresh: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = blockdemo_core::init() {
        eprintln!("Failed to initialize logging: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("blockdemo failed: {}", err);
            eprintln!("{}", err.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let (config, _) = Config::load_validated()
        .map_err(|e| AppError::Config(ConfigError::Invalid(format!("{e:#}"))))?;
    let weather = &config.weather;

    let provider =
        AmapProvider::new(provider_settings(weather)).map_err(IntoAppError::into_app_error)?;
    let module = WeatherModule::init(
        ModuleConfig::from_weather_config(weather),
        provider,
        ConsoleView::stdout(),
    )
    .await;

    tracing::info!(city = %module.selected_city(), refresh = cli.refresh, "blockdemo started");

    let city_code = cli.city_code.as_deref();
    let outcome = if cli.refresh {
        module.refresh_weather(city_code).await
    } else {
        module.get_weather(city_code).await
    };
    module.destroy();

    match outcome {
        Some(outcome) => outcome_to_result(outcome).map(|_| ()),
        None => Err(AppError::Weather(WeatherError::MissingApiKey)),
    }
}
