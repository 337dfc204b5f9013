//! Normalization of upstream payloads into [`WeatherRecord`].
//!
//! Two upstream shapes are understood:
//! - OpenWeather current weather (`name`, `main`, `wind`, `sys`, ...)
//! - WeatherAPI.com current conditions (`location`, `current`)
//!
//! Both are decoded at once and every field is resolved OpenWeather first,
//! WeatherAPI second, zero/empty last. Decoding never fails: a field of the
//! wrong JSON type is treated as missing.

use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::Value;

use crate::model::{Coordinates, IconRef, WeatherRecord};

/// Which upstream schema a payload follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    OpenWeather,
    WeatherApi,
}

/// Both partial decodings of one raw payload.
#[derive(Debug, Default)]
pub struct UpstreamPayload {
    open_weather: Option<OwCurrent>,
    weather_api: Option<WaCurrent>,
}

impl UpstreamPayload {
    pub fn decode(raw: &Value) -> Self {
        let open_weather = serde_json::from_value::<OwCurrent>(raw.clone()).ok();
        let weather_api = serde_json::from_value::<WaCurrent>(raw.clone()).ok();

        Self { open_weather, weather_api }
    }

    /// Presence only classifies the payload; resolution reads every field.
    pub fn shape(&self) -> Option<ShapeKind> {
        if self.open_weather.as_ref().is_some_and(OwCurrent::is_present) {
            Some(ShapeKind::OpenWeather)
        } else if self.weather_api.as_ref().is_some_and(WaCurrent::is_present) {
            Some(ShapeKind::WeatherApi)
        } else {
            None
        }
    }

    pub fn into_record(self) -> WeatherRecord {
        let a = self.open_weather.unwrap_or_default();
        let b = self.weather_api.unwrap_or_default();

        let a_main = a.main.unwrap_or_default();
        let a_wind = a.wind.unwrap_or_default();
        let a_sys = a.sys.unwrap_or_default();
        let a_coord = a.coord.unwrap_or_default();
        let a_condition = a.weather.and_then(|w| w.into_iter().next()).unwrap_or_default();

        let b_location = b.location.unwrap_or_default();
        let b_current = b.current.unwrap_or_default();
        let b_condition = b_current.condition.unwrap_or_default();

        // OpenWeather is requested in metric units: m/s and metres.
        let wind_speed_kph = a_wind.speed.map(|mps| mps * 3.6).or(b_current.wind_kph);
        let visibility_km = a.visibility.map(|m| m / 1000.0).or(b_current.vis_km);

        let icon = a_condition.icon.or(b_condition.icon).unwrap_or_default();

        let (sunrise, sunset) = match (a_sys.sunrise, a_sys.sunset) {
            (Some(rise), Some(set)) => (Some(rise), Some(set)),
            _ => (None, None),
        };

        WeatherRecord {
            city_name: a.name.or(b_location.name).unwrap_or_default(),
            country_code: a_sys.country.or(b_location.country).unwrap_or_default(),
            temperature_c: a_main.temp.or(b_current.temp_c).unwrap_or_default(),
            feels_like_c: a_main.feels_like.or(b_current.feelslike_c).unwrap_or_default(),
            humidity_pct: percent(a_main.humidity.or(b_current.humidity)),
            pressure_hpa: a_main.pressure.or(b_current.pressure_mb).unwrap_or_default(),
            wind_speed_kph: wind_speed_kph.unwrap_or_default(),
            wind_direction_deg: a_wind
                .deg
                .or(b_current.wind_degree)
                .filter(|d| d.is_finite())
                .map(|d| d.rem_euclid(360.0))
                .unwrap_or_default(),
            visibility_km: visibility_km.unwrap_or_default(),
            cloudiness_pct: percent(a.clouds.and_then(|c| c.all).or(b_current.cloud)),
            condition_text: a_condition.description.or(b_condition.text).unwrap_or_default(),
            condition_icon: IconRef::parse(&icon),
            coordinates: Coordinates {
                lat: a_coord.lat.or(b_location.lat).unwrap_or_default(),
                lon: a_coord.lon.or(b_location.lon).unwrap_or_default(),
            },
            sunrise,
            sunset,
        }
    }
}

/// Map any upstream payload to the canonical record.
pub fn normalize(raw: &Value) -> WeatherRecord {
    UpstreamPayload::decode(raw).into_record()
}

fn percent(value: Option<f64>) -> u8 {
    value.filter(|v| v.is_finite()).map(|v| v.round().clamp(0.0, 100.0) as u8).unwrap_or(0)
}

/// Deserialize a field, mapping type mismatches to `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

#[derive(Debug, Default, Deserialize)]
struct OwCurrent {
    #[serde(default, deserialize_with = "lenient")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    main: Option<OwMain>,
    #[serde(default, deserialize_with = "lenient")]
    wind: Option<OwWind>,
    #[serde(default, deserialize_with = "lenient")]
    visibility: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    clouds: Option<OwClouds>,
    #[serde(default, deserialize_with = "lenient")]
    weather: Option<Vec<OwWeather>>,
    #[serde(default, deserialize_with = "lenient")]
    coord: Option<OwCoord>,
    #[serde(default, deserialize_with = "lenient")]
    sys: Option<OwSys>,
}

impl OwCurrent {
    fn is_present(&self) -> bool {
        self.name.is_some()
            || self.main.is_some()
            || self.sys.is_some()
            || self.weather.is_some()
            || self.coord.is_some()
            || self.wind.is_some()
            || self.visibility.is_some()
            || self.clouds.is_some()
    }
}

#[derive(Debug, Default, Deserialize)]
struct OwMain {
    #[serde(default, deserialize_with = "lenient")]
    temp: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    feels_like: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    humidity: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pressure: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct OwWind {
    #[serde(default, deserialize_with = "lenient")]
    speed: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    deg: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct OwClouds {
    #[serde(default, deserialize_with = "lenient")]
    all: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct OwWeather {
    #[serde(default, deserialize_with = "lenient")]
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    icon: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OwCoord {
    #[serde(default, deserialize_with = "lenient")]
    lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    lon: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    #[serde(default, deserialize_with = "lenient")]
    country: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    sunrise: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    sunset: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct WaCurrent {
    #[serde(default, deserialize_with = "lenient")]
    location: Option<WaLocation>,
    #[serde(default, deserialize_with = "lenient")]
    current: Option<WaConditions>,
}

impl WaCurrent {
    fn is_present(&self) -> bool {
        self.location.is_some() || self.current.is_some()
    }
}

#[derive(Debug, Default, Deserialize)]
struct WaLocation {
    #[serde(default, deserialize_with = "lenient")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    country: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    lon: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct WaConditions {
    #[serde(default, deserialize_with = "lenient")]
    temp_c: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    feelslike_c: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    humidity: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pressure_mb: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    wind_kph: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    wind_degree: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    vis_km: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    cloud: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    condition: Option<WaCondition>,
}

#[derive(Debug, Default, Deserialize)]
struct WaCondition {
    #[serde(default, deserialize_with = "lenient")]
    text: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    icon: Option<String>,
}
