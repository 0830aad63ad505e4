//! City name to normalized records: resolve, fetch, normalize.

use std::sync::Arc;

use crate::{
    error::WeatherError,
    model::WeatherRecord,
    normalize::normalize,
    provider::{CoordinateResolver, ForecastFetcher},
};

/// Runs the lookup stages in order for one city at a time.
///
/// Holds only shared, immutable collaborators; the city travels as an argument,
/// so a single pipeline can be shared across concurrent requests.
#[derive(Debug, Clone)]
pub struct ForecastPipeline {
    resolver: Arc<dyn CoordinateResolver>,
    fetcher: Arc<dyn ForecastFetcher>,
}

impl ForecastPipeline {
    pub fn new(resolver: Arc<dyn CoordinateResolver>, fetcher: Arc<dyn ForecastFetcher>) -> Self {
        Self { resolver, fetcher }
    }

    /// Current weather first, then the forecast periods in provider order.
    ///
    /// The first failing stage's error is returned as is; there are no partial results.
    #[tracing::instrument(skip(self), err)]
    pub async fn get_weather_for_city(
        &self,
        city_name: &str,
    ) -> Result<Vec<WeatherRecord>, WeatherError> {
        let coordinates = self.resolver.resolve(city_name).await?;
        let periods = self.fetcher.fetch(coordinates).await?;

        let records = periods
            .iter()
            .map(|period| normalize(period, city_name))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(records = records.len(), "normalized forecast");
        Ok(records)
    }
}
