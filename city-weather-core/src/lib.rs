//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client behind the coordinate-lookup and forecast traits
//! - Normalization of raw forecast periods into complete `WeatherRecord`s
//! - The lookup pipeline and a JSON-file search history
//!
//! It is used by `city-weather-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod history;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod provider;
pub mod service;

pub use config::Config;
pub use error::{ErrorKind, MalformedResponseError, UpstreamError, WeatherError};
pub use history::{HistoryStore, JsonFileHistory};
pub use model::{Coordinates, RawForecastPeriod, SearchHistoryEntry, WeatherRecord};
pub use normalize::normalize;
pub use pipeline::ForecastPipeline;
pub use provider::{CoordinateResolver, ForecastFetcher, openweather::OpenWeatherClient};
pub use service::WeatherService;
