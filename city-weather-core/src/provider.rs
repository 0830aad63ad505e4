use crate::{
    Config,
    error::WeatherError,
    model::{Coordinates, RawForecastPeriod},
    pipeline::ForecastPipeline,
    provider::openweather::OpenWeatherClient,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// Turns a free-text city name into coordinates.
#[async_trait]
pub trait CoordinateResolver: Send + Sync + Debug {
    async fn resolve(&self, city_name: &str) -> Result<Coordinates, WeatherError>;
}

/// Retrieves the ordered forecast periods for a position.
#[async_trait]
pub trait ForecastFetcher: Send + Sync + Debug {
    async fn fetch(&self, coordinates: Coordinates) -> Result<Vec<RawForecastPeriod>, WeatherError>;
}

/// Construct an OpenWeather client from config.
pub fn client_from_config(config: &Config) -> anyhow::Result<OpenWeatherClient> {
    let api_key = config.api_key()?;

    let client = OpenWeatherClient::new(api_key.to_owned(), config.base_url(), config.timeout())?;

    Ok(client)
}

/// Construct a pipeline where one OpenWeather client serves both stages.
pub fn pipeline_from_config(config: &Config) -> anyhow::Result<ForecastPipeline> {
    let client = Arc::new(client_from_config(config)?);
    Ok(ForecastPipeline::new(client.clone(), client))
}
