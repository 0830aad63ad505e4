use std::{error::Error as _, process::ExitCode};

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use city_weather_core::{
    Config, ErrorKind, HistoryStore, JsonFileHistory, WeatherError, WeatherRecord,
    WeatherService, config::API_KEY_VARS, normalize::MISSING_MEASUREMENT,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Current weather and forecast for a city")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key (prompts when not given).
    Configure {
        #[arg(long)]
        api_key: Option<String>,

        /// Override the provider base URL.
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Show current weather and forecast for a city.
    Show {
        /// City name, e.g. "Boston" or "Paris, FR".
        city: String,

        /// Print the records as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// List previously searched cities.
    History,

    /// Remove a city from the search history.
    Forget {
        /// Entry id as printed by `weather history`.
        id: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        match self.command {
            Command::Configure { api_key, base_url } => configure(api_key, base_url),
            Command::Show { city, json } => show(&city, json).await,
            Command::History => history(&Config::load()?).await,
            Command::Forget { id } => forget(&Config::load()?, &id).await,
        }
    }
}

/// History commands only touch the local file, so no API key is required.
async fn history(cfg: &Config) -> anyhow::Result<ExitCode> {
    let entries = JsonFileHistory::from_config(cfg)?.list().await?;

    if entries.is_empty() {
        println!("No searches yet.");
    }
    for entry in entries {
        println!("{}  {}", entry.id, entry.name);
    }
    Ok(ExitCode::SUCCESS)
}

async fn forget(cfg: &Config, id: &str) -> anyhow::Result<ExitCode> {
    if JsonFileHistory::from_config(cfg)?.remove_city(id).await? {
        println!("Removed {id} from history.");
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("No history entry with id {id}.");
        Ok(ExitCode::FAILURE)
    }
}

fn configure(api_key: Option<String>, base_url: Option<String>) -> anyhow::Result<ExitCode> {
    let mut cfg = Config::load()?;

    let api_key = match api_key {
        Some(key) => key,
        None => inquire::Password::new("OpenWeather API key:")
            .without_confirmation()
            .prompt()
            .context("Failed to read API key")?,
    };
    anyhow::ensure!(!api_key.trim().is_empty(), "API key must not be empty");

    cfg.set_api_key(api_key.trim().to_string());
    if base_url.is_some() {
        cfg.base_url = base_url;
    }
    cfg.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    if API_KEY_VARS.iter().any(|var| std::env::var_os(var).is_some()) {
        println!("Note: an API key in the environment takes precedence over the saved one.");
    }
    Ok(ExitCode::SUCCESS)
}

async fn show(city: &str, json: bool) -> anyhow::Result<ExitCode> {
    let service = WeatherService::from_config(&Config::load()?)?;
    tracing::debug!(city, json, "looking up weather");

    let records = match service.search(city).await {
        Ok(records) => records,
        Err(err) => return Ok(report(&err)),
    };

    print_records(&records, json)?;
    service.flush_history().await;
    Ok(ExitCode::SUCCESS)
}

fn print_records(records: &[WeatherRecord], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }

    let Some((current, forecast)) = records.split_first() else {
        return Ok(());
    };

    println!("{} - {}", current.city, display_time(&current.date));
    println!("  {} ({})", current.description, current.icon);
    println!(
        "  Temp {}  Feels like {}",
        celsius(current.temp),
        celsius(current.feels_like)
    );
    println!(
        "  Humidity {}  Wind {}  UV {}",
        percent(current.humidity),
        speed(current.wind_speed),
        current.uv_index
    );
    println!(
        "  Sunrise {}  Sunset {}",
        display_time(&current.sunrise),
        display_time(&current.sunset)
    );

    if !forecast.is_empty() {
        println!();
        println!("Forecast:");
        for record in forecast {
            print_forecast_row(record);
        }
    }

    Ok(())
}

/// Print a user-facing message for a failed lookup.
fn report(err: &WeatherError) -> ExitCode {
    match err.kind() {
        ErrorKind::NotFound => {
            eprintln!("{err}");
            eprintln!("Check the spelling of the city name and try again.");
        }
        ErrorKind::Upstream | ErrorKind::MalformedResponse => {
            eprintln!("Weather provider error: {err}");
            let mut source = err.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
        }
    }
    ExitCode::from(exit_status(err.kind()))
}

/// 2 for a city the user can correct, 1 for provider trouble.
fn exit_status(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::NotFound => 2,
        ErrorKind::Upstream | ErrorKind::MalformedResponse => 1,
    }
}

fn print_forecast_row(record: &WeatherRecord) {
    println!(
        "  {:<17} {:>8}  {:>5}  {:>9}  {}",
        display_time(&record.date),
        celsius(record.temp),
        percent(record.humidity),
        speed(record.wind_speed),
        record.description
    );
}

/// ISO timestamps are shown as `YYYY-MM-DD HH:MM UTC`; markers pass through.
fn display_time(value: &str) -> String {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc).format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|_| value.to_string())
}

fn celsius(value: f64) -> String {
    measured(value, |v| format!("{v:.1}°C"))
}

fn percent(value: f64) -> String {
    measured(value, |v| format!("{v:.0}%"))
}

fn speed(value: f64) -> String {
    measured(value, |v| format!("{v:.1} m/s"))
}

fn measured(value: f64, fmt: impl Fn(f64) -> String) -> String {
    if value == MISSING_MEASUREMENT {
        "n/a".to_string()
    } else {
        fmt(value)
    }
}
