use serde::{Deserialize, Serialize};

/// Geographic position resolved from a city name.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// One normalized weather reading. Every field is populated; see
/// [`crate::normalize`] for the values used when the provider omits one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherRecord {
    pub city: String,
    pub date: String,
    pub description: String,
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub uv_index: f64,
    pub sunrise: String,
    pub sunset: String,
    pub icon: String,
}

/// A city previously searched for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    pub id: String,
    pub name: String,
}

/// One provider time slice, as delivered.
///
/// Accepts both the 3-hour forecast item shape (`main`, `wind`, `sys`) and the
/// flat daily shape (`temp`, `humidity`, `wind_speed`, `uvi`, ...). Only `dt`
/// is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawForecastPeriod {
    /// Epoch seconds.
    pub dt: i64,
    #[serde(default)]
    pub main: Option<RawMain>,
    #[serde(default)]
    pub weather: Option<Vec<RawCondition>>,
    #[serde(default)]
    pub wind: Option<RawWind>,
    #[serde(default)]
    pub sys: Option<RawSun>,
    #[serde(default)]
    pub temp: Option<RawTemperature>,
    #[serde(default)]
    pub feels_like: Option<RawTemperature>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub wind_speed: Option<f64>,
    #[serde(default)]
    pub uvi: Option<f64>,
    #[serde(default)]
    pub sunrise: Option<i64>,
    #[serde(default)]
    pub sunset: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMain {
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub humidity: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCondition {
    pub description: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawWind {
    pub speed: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSun {
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
}

/// Daily items report temperature per part of day; everything else is a scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTemperature {
    Scalar(f64),
    PartOfDay { day: Option<f64> },
}

impl RawTemperature {
    pub fn value(&self) -> Option<f64> {
        match self {
            RawTemperature::Scalar(v) => Some(*v),
            RawTemperature::PartOfDay { day } => *day,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn forecast_item_shape_deserializes() {
        let raw: RawForecastPeriod = serde_json::from_value(json!({
            "dt": 1_700_000_000,
            "main": { "temp": 4.2, "feels_like": 1.0, "humidity": 81, "pressure": 1012 },
            "weather": [{ "id": 500, "description": "light rain", "icon": "10n" }],
            "wind": { "speed": 3.6, "deg": 200 },
            "dt_txt": "2023-11-14 22:13:20"
        }))
        .expect("forecast item should parse");

        assert_eq!(raw.dt, 1_700_000_000);
        assert_eq!(raw.main.as_ref().and_then(|m| m.humidity), Some(81.0));
        assert_eq!(raw.wind.as_ref().and_then(|w| w.speed), Some(3.6));
        assert!(raw.uvi.is_none());
    }

    #[test]
    fn daily_shape_with_part_of_day_temperature() {
        let raw: RawForecastPeriod = serde_json::from_value(json!({
            "dt": 1_700_000_000,
            "temp": { "day": 12.5, "night": 6.0 },
            "feels_like": { "day": 11.0 },
            "humidity": 40,
            "wind_speed": 0,
            "uvi": 2.3,
            "sunrise": 1_699_980_000,
            "sunset": 1_700_016_000
        }))
        .expect("daily item should parse");

        assert_eq!(raw.temp.as_ref().and_then(RawTemperature::value), Some(12.5));
        assert_eq!(raw.feels_like.as_ref().and_then(RawTemperature::value), Some(11.0));
        assert_eq!(raw.wind_speed, Some(0.0));
    }

    #[test]
    fn nulls_are_treated_as_absent() {
        let raw: RawForecastPeriod = serde_json::from_value(json!({
            "dt": 1,
            "main": null,
            "weather": null,
            "humidity": null
        }))
        .expect("nulls should parse");

        assert!(raw.main.is_none());
        assert!(raw.weather.is_none());
        assert!(raw.humidity.is_none());
    }

    #[test]
    fn period_without_timestamp_is_rejected() {
        let res = serde_json::from_value::<RawForecastPeriod>(json!({ "main": { "temp": 1.0 } }));
        assert!(res.is_err());
    }

    #[test]
    fn weather_record_serializes_camel_case() {
        let record = WeatherRecord {
            city: "Boston".into(),
            date: "2024-03-01T12:00:00.000Z".into(),
            description: "clear sky".into(),
            temp: 5.0,
            feels_like: 2.0,
            humidity: 50.0,
            wind_speed: 1.5,
            uv_index: 0.0,
            sunrise: "N/A".into(),
            sunset: "N/A".into(),
            icon: "01d".into(),
        };

        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(value["feelsLike"], 2.0);
        assert_eq!(value["windSpeed"], 1.5);
        assert_eq!(value["uvIndex"], 0.0);
        assert!(value.get("feels_like").is_none());
    }
}
