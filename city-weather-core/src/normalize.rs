//! Maps one raw provider period onto a complete [`WeatherRecord`].
//!
//! Missing measurements become [`MISSING_MEASUREMENT`] rather than `0`, since
//! zero is a real humidity or wind reading. UV is the exception: the provider
//! leaves it out on most endpoints, so absence reads as `0`.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::{
    error::MalformedResponseError,
    model::{RawForecastPeriod, RawTemperature, WeatherRecord},
};

/// Stands in for temperature, feels-like, humidity and wind speed when absent.
pub const MISSING_MEASUREMENT: f64 = -999.0;

/// UV index used when the provider reports none.
pub const DEFAULT_UV_INDEX: f64 = 0.0;

pub const NO_DESCRIPTION: &str = "No description available";

/// OpenWeather "clear sky, day" icon.
pub const DEFAULT_ICON: &str = "01d";

/// Sunrise/sunset value when the provider has no time for it.
pub const UNAVAILABLE: &str = "N/A";

/// Normalize a single period. Fails only when `dt` cannot be represented as a date.
pub fn normalize(
    period: &RawForecastPeriod,
    city_label: &str,
) -> Result<WeatherRecord, MalformedResponseError> {
    let date = format_timestamp(period.dt)
        .ok_or(MalformedResponseError::InvalidTimestamp(period.dt))?;

    let condition = period.weather.as_ref().and_then(|w| w.first());
    let main = period.main.as_ref();
    let sys = period.sys.as_ref();

    let temp = main
        .and_then(|m| m.temp)
        .or_else(|| period.temp.as_ref().and_then(RawTemperature::value));
    let feels_like = main
        .and_then(|m| m.feels_like)
        .or_else(|| period.feels_like.as_ref().and_then(RawTemperature::value));
    let humidity = main.and_then(|m| m.humidity).or(period.humidity);
    let wind_speed = period
        .wind
        .as_ref()
        .and_then(|w| w.speed)
        .or(period.wind_speed);

    let sunrise = sys.and_then(|s| s.sunrise).or(period.sunrise);
    let sunset = sys.and_then(|s| s.sunset).or(period.sunset);

    Ok(WeatherRecord {
        city: city_label.to_string(),
        date,
        description: text_or(condition.and_then(|c| c.description.as_deref()), NO_DESCRIPTION),
        temp: measurement(temp),
        feels_like: measurement(feels_like),
        humidity: measurement(humidity),
        wind_speed: measurement(wind_speed),
        uv_index: period.uvi.filter(|v| v.is_finite()).unwrap_or(DEFAULT_UV_INDEX),
        sunrise: sun_time(sunrise),
        sunset: sun_time(sunset),
        icon: text_or(condition.and_then(|c| c.icon.as_deref()), DEFAULT_ICON),
    })
}

/// Epoch seconds as `YYYY-MM-DDTHH:MM:SS.sssZ`.
pub fn format_timestamp(ts: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn measurement(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(MISSING_MEASUREMENT)
}

fn sun_time(ts: Option<i64>) -> String {
    ts.and_then(format_timestamp)
        .unwrap_or_else(|| UNAVAILABLE.to_string())
}

fn text_or(value: Option<&str>, fallback: &str) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn period(value: serde_json::Value) -> RawForecastPeriod {
        serde_json::from_value(value).expect("test period should parse")
    }

    fn complete_period() -> RawForecastPeriod {
        period(json!({
            "dt": 1_709_294_400,
            "main": { "temp": 7.5, "feels_like": 5.1, "humidity": 63 },
            "weather": [{ "description": "scattered clouds", "icon": "03d" }],
            "wind": { "speed": 4.2 },
            "sys": { "sunrise": 1_709_292_000, "sunset": 1_709_333_000 },
            "uvi": 1.7
        }))
    }

    #[test]
    fn complete_period_maps_every_field() {
        let record = normalize(&complete_period(), "Boston").expect("normalize");

        assert_eq!(record.city, "Boston");
        assert_eq!(record.date, "2024-03-01T12:00:00.000Z");
        assert_eq!(record.description, "scattered clouds");
        assert_eq!(record.icon, "03d");
        assert_eq!(record.temp, 7.5);
        assert_eq!(record.feels_like, 5.1);
        assert_eq!(record.humidity, 63.0);
        assert_eq!(record.wind_speed, 4.2);
        assert_eq!(record.uv_index, 1.7);
        assert_eq!(record.sunrise, "2024-03-01T11:20:00.000Z");
        assert_eq!(record.sunset, "2024-03-01T22:43:20.000Z");
    }

    #[test]
    fn bare_period_gets_every_fallback() {
        let record = normalize(&period(json!({ "dt": 0 })), "").expect("normalize");

        assert_eq!(record.date, "1970-01-01T00:00:00.000Z");
        assert_eq!(record.description, NO_DESCRIPTION);
        assert_eq!(record.icon, DEFAULT_ICON);
        assert_eq!(record.temp, MISSING_MEASUREMENT);
        assert_eq!(record.feels_like, MISSING_MEASUREMENT);
        assert_eq!(record.humidity, MISSING_MEASUREMENT);
        assert_eq!(record.wind_speed, MISSING_MEASUREMENT);
        assert_eq!(record.uv_index, DEFAULT_UV_INDEX);
        assert_eq!(record.sunrise, UNAVAILABLE);
        assert_eq!(record.sunset, UNAVAILABLE);
    }

    #[test]
    fn missing_humidity_is_sentinel_not_zero() {
        let raw = period(json!({
            "dt": 1_709_294_400,
            "main": { "temp": 3.0, "feels_like": 1.0 }
        }));

        let record = normalize(&raw, "Oslo").expect("normalize");
        assert_eq!(record.humidity, MISSING_MEASUREMENT);
        assert_ne!(record.humidity, 0.0);
    }

    #[test]
    fn real_zero_readings_are_kept() {
        let raw = period(json!({
            "dt": 1_709_294_400,
            "main": { "temp": 0, "feels_like": 0, "humidity": 0 },
            "wind": { "speed": 0 }
        }));

        let record = normalize(&raw, "Oslo").expect("normalize");
        assert_eq!(record.temp, 0.0);
        assert_eq!(record.feels_like, 0.0);
        assert_eq!(record.humidity, 0.0);
        assert_eq!(record.wind_speed, 0.0);
    }

    #[test]
    fn missing_uvi_is_exactly_zero() {
        let mut raw = complete_period();
        raw.uvi = None;

        let record = normalize(&raw, "Boston").expect("normalize");
        assert_eq!(record.uv_index, 0.0);
    }

    #[test]
    fn daily_shape_is_read_from_flat_fields() {
        let raw = period(json!({
            "dt": 1_709_294_400,
            "temp": { "day": 12.0, "min": 4.0 },
            "feels_like": { "day": 10.5 },
            "humidity": 48,
            "wind_speed": 2.2,
            "uvi": 3.1,
            "sunrise": 1_709_292_000,
            "sunset": 1_709_333_000,
            "weather": [{ "description": "light rain", "icon": "10d" }]
        }));

        let record = normalize(&raw, "Lisbon").expect("normalize");
        assert_eq!(record.temp, 12.0);
        assert_eq!(record.feels_like, 10.5);
        assert_eq!(record.humidity, 48.0);
        assert_eq!(record.wind_speed, 2.2);
        assert_eq!(record.uv_index, 3.1);
        assert_eq!(record.sunrise, "2024-03-01T11:20:00.000Z");
    }

    #[test]
    fn daily_temperature_without_day_part_is_missing() {
        let raw = period(json!({ "dt": 1_709_294_400, "temp": { "min": 4.0 } }));

        let record = normalize(&raw, "Lisbon").expect("normalize");
        assert_eq!(record.temp, MISSING_MEASUREMENT);
    }

    #[test]
    fn blank_description_and_icon_fall_back() {
        let raw = period(json!({
            "dt": 1_709_294_400,
            "weather": [{ "description": "  ", "icon": "" }]
        }));

        let record = normalize(&raw, "Boston").expect("normalize");
        assert_eq!(record.description, NO_DESCRIPTION);
        assert_eq!(record.icon, DEFAULT_ICON);
    }

    #[test]
    fn empty_weather_array_falls_back() {
        let raw = period(json!({ "dt": 1_709_294_400, "weather": [] }));

        let record = normalize(&raw, "Boston").expect("normalize");
        assert_eq!(record.description, NO_DESCRIPTION);
    }

    #[test]
    fn normalizing_twice_is_identical() {
        let raw = complete_period();

        let first = normalize(&raw, "Boston").expect("normalize");
        let second = normalize(&raw, "Boston").expect("normalize");
        assert_eq!(first, second);
    }

    #[test]
    fn unrepresentable_timestamp_is_malformed() {
        let raw = period(json!({ "dt": i64::MAX }));

        let err = normalize(&raw, "Boston").unwrap_err();
        assert!(matches!(err, MalformedResponseError::InvalidTimestamp(ts) if ts == i64::MAX));
    }

    #[test]
    fn unrepresentable_sunrise_is_unavailable() {
        let mut raw = complete_period();
        raw.sys = None;
        raw.sunrise = Some(i64::MAX);

        let record = normalize(&raw, "Boston").expect("normalize");
        assert_eq!(record.sunrise, UNAVAILABLE);
    }
}
