use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::{
    error::{MalformedResponseError, UpstreamError, WeatherError},
    model::{Coordinates, RawForecastPeriod, RawSun},
};

use super::{CoordinateResolver, ForecastFetcher};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const LOOKUP_ENDPOINT: &str = "weather";
const FORECAST_ENDPOINT: &str = "forecast";

/// HTTP client for the OpenWeather `weather` and `forecast` endpoints.
///
/// Holds no per-request state, so one instance can serve concurrent lookups.
#[derive(Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(
        api_key: String,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(UpstreamError::Client)?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            api_key,
            base_url,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a GET and return the status together with the full body text.
    async fn get(
        &self,
        endpoint: &'static str,
        query: &[(&str, &str)],
    ) -> Result<(StatusCode, String), UpstreamError> {
        let url = format!("{}/{endpoint}", self.base_url);
        tracing::debug!(%url, ?query, "requesting OpenWeather");

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|source| UpstreamError::Transport { endpoint, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| UpstreamError::Transport { endpoint, source })?;

        Ok((status, body))
    }
}

impl std::fmt::Debug for OpenWeatherClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwLookupResponse {
    coord: Option<OwCoord>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwErrorBody {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Option<serde_json::Value>,
    /// Today's sunrise and sunset; forecast items only carry `sys.pod`.
    #[serde(default)]
    city: Option<RawSun>,
}

#[async_trait]
impl CoordinateResolver for OpenWeatherClient {
    async fn resolve(&self, city_name: &str) -> Result<Coordinates, WeatherError> {
        let city = city_name.trim();
        if city.is_empty() {
            return Err(WeatherError::not_found(city_name, "city name is empty"));
        }

        let (status, body) = self.get(LOOKUP_ENDPOINT, &[("q", city)]).await?;

        if !status.is_success() {
            if city_unknown(status) {
                let message = serde_json::from_str::<OwErrorBody>(&body)
                    .ok()
                    .and_then(|b| b.message)
                    .unwrap_or_else(|| status.to_string());
                return Err(WeatherError::not_found(city, message));
            }

            return Err(UpstreamError::Status {
                endpoint: LOOKUP_ENDPOINT,
                status,
                body: truncate_body(&body),
            }
            .into());
        }

        let parsed: OwLookupResponse =
            serde_json::from_str(&body).map_err(|source| UpstreamError::InvalidJson {
                endpoint: LOOKUP_ENDPOINT,
                source,
            })?;

        let coord = parsed.coord.ok_or_else(|| {
            WeatherError::not_found(
                city,
                parsed
                    .message
                    .unwrap_or_else(|| "response has no coordinates".to_string()),
            )
        })?;

        tracing::info!(city, lat = coord.lat, lon = coord.lon, "resolved coordinates");

        Ok(Coordinates {
            lat: coord.lat,
            lon: coord.lon,
        })
    }
}

#[async_trait]
impl ForecastFetcher for OpenWeatherClient {
    async fn fetch(&self, coordinates: Coordinates) -> Result<Vec<RawForecastPeriod>, WeatherError> {
        let lat = coordinates.lat.to_string();
        let lon = coordinates.lon.to_string();

        let (status, body) = self
            .get(
                FORECAST_ENDPOINT,
                &[("lat", lat.as_str()), ("lon", lon.as_str()), ("units", "metric")],
            )
            .await?;

        if !status.is_success() {
            return Err(UpstreamError::Status {
                endpoint: FORECAST_ENDPOINT,
                status,
                body: truncate_body(&body),
            }
            .into());
        }

        let parsed: OwForecastResponse =
            serde_json::from_str(&body).map_err(|source| UpstreamError::InvalidJson {
                endpoint: FORECAST_ENDPOINT,
                source,
            })?;

        let mut periods = parse_periods(parsed.list)?;
        apply_city_sun(&mut periods, parsed.city);
        tracing::info!(
            lat = coordinates.lat,
            lon = coordinates.lon,
            periods = periods.len(),
            "fetched forecast"
        );

        Ok(periods)
    }
}

/// The lookup endpoint answers 404 (or 400 for an unusable query) for unknown
/// cities. Auth and quota rejections are not the user's city.
fn city_unknown(status: StatusCode) -> bool {
    status.is_client_error()
        && !matches!(
            status,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
        )
}

fn parse_periods(
    list: Option<serde_json::Value>,
) -> Result<Vec<RawForecastPeriod>, MalformedResponseError> {
    let items = match list {
        None | Some(serde_json::Value::Null) => return Err(MalformedResponseError::MissingList),
        Some(serde_json::Value::Array(items)) => items,
        Some(_) => return Err(MalformedResponseError::ListNotArray),
    };

    if items.is_empty() {
        return Err(MalformedResponseError::EmptyList);
    }

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item)
                .map_err(|source| MalformedResponseError::InvalidPeriod { index, source })
        })
        .collect()
}

/// Give the current period the city's sunrise and sunset unless it has its own.
/// Later periods are other days, so they keep whatever they carry.
fn apply_city_sun(periods: &mut [RawForecastPeriod], city: Option<RawSun>) {
    let (Some(city), Some(current)) = (city, periods.first_mut()) else {
        return;
    };
    let sys = current.sys.as_ref();

    if sys.and_then(|s| s.sunrise).is_none() && current.sunrise.is_none() {
        current.sunrise = city.sunrise;
    }
    if sys.and_then(|s| s.sunset).is_none() && current.sunset.is_none() {
        current.sunset = city.sunset;
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
