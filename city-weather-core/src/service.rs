use std::sync::Arc;
use tokio::{sync::Mutex, task::JoinSet};

use crate::{
    Config,
    error::WeatherError,
    history::{HistoryStore, JsonFileHistory},
    model::WeatherRecord,
    pipeline::ForecastPipeline,
    provider::pipeline_from_config,
};

/// Weather lookups that remember successful searches.
#[derive(Debug, Clone)]
pub struct WeatherService {
    pipeline: ForecastPipeline,
    history: Arc<dyn HistoryStore>,
    // History writes still running after `search` returned. Shared by clones.
    pending: Arc<Mutex<JoinSet<()>>>,
}

impl WeatherService {
    pub fn new(pipeline: ForecastPipeline, history: Arc<dyn HistoryStore>) -> Self {
        Self {
            pipeline,
            history,
            pending: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    /// OpenWeather pipeline plus the JSON history file named by `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let pipeline = pipeline_from_config(config)?;
        let history = JsonFileHistory::from_config(config)?;
        Ok(Self::new(pipeline, Arc::new(history)))
    }

    /// Look up `city_name` and record it in the history in the background.
    ///
    /// Returns as soon as the records are ready; the history write runs on a
    /// spawned task. A failed write is logged and never changes the weather
    /// result. Nothing is recorded when the lookup fails. Call
    /// [`flush_history`](Self::flush_history) before exiting to let pending
    /// writes land.
    pub async fn search(&self, city_name: &str) -> Result<Vec<WeatherRecord>, WeatherError> {
        let records = self.pipeline.get_weather_for_city(city_name).await?;

        let history = Arc::clone(&self.history);
        let city = city_name.to_string();
        let mut pending = self.pending.lock().await;
        while pending.try_join_next().is_some() {}
        pending.spawn(async move {
            if let Err(err) = history.add_city(&city).await {
                tracing::warn!(city = %city, error = ?err, "failed to record search history");
            }
        });

        Ok(records)
    }

    /// Wait for every history write started by [`search`](Self::search).
    pub async fn flush_history(&self) {
        let mut pending = self.pending.lock().await;
        while let Some(res) = pending.join_next().await {
            if let Err(err) = res {
                tracing::warn!(error = %err, "history write task did not finish");
            }
        }
    }
}
