use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GatewayError, HistoryError};

/// What to look up: a city name or a coordinate pair, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherQuery {
    City(String),
    Coordinates { lat: f64, lon: f64 },
}

impl WeatherQuery {
    /// Build a query from loosely supplied parts. A non-blank city wins over
    /// coordinates; otherwise both coordinates must be present.
    pub fn from_parts(
        city: Option<&str>,
        lat: Option<f64>,
        lon: Option<f64>,
    ) -> Result<Self, GatewayError> {
        if let Some(city) = city.map(str::trim).filter(|c| !c.is_empty()) {
            return Ok(Self::City(city.to_string()));
        }

        match (lat, lon) {
            (Some(lat), Some(lon)) => Ok(Self::Coordinates { lat, lon }),
            _ => Err(GatewayError::invalid_request(
                "City or coordinates (lat, lon) parameters are required",
            )),
        }
    }

    /// The `"{lat},{lon}"` or verbatim city form used as a single `q` value.
    pub fn as_q_param(&self) -> String {
        match self {
            Self::City(city) => city.clone(),
            Self::Coordinates { lat, lon } => format!("{lat},{lon}"),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::City(_) => "city",
            Self::Coordinates { .. } => "coordinates",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Provider icon identifier as found in the upstream payload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum IconRef {
    #[default]
    None,
    /// Fully qualified URL (protocol-relative paths get an `https:` prefix).
    Url(String),
    /// Short provider code, resolved through an icon template.
    Code(String),
}

impl IconRef {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            Self::None
        } else if raw.starts_with("//") {
            Self::Url(format!("https:{raw}"))
        } else {
            Self::Code(raw.to_string())
        }
    }

    /// Resolve to a URL. `template` must contain a `{code}` placeholder.
    pub fn resolve(&self, template: &str) -> Option<String> {
        match self {
            Self::None => None,
            Self::Url(url) => Some(url.clone()),
            Self::Code(code) => Some(template.replace("{code}", code)),
        }
    }
}

/// Eight-point compass rose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompassPoint {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl CompassPoint {
    const ALL: [CompassPoint; 8] = [
        CompassPoint::North,
        CompassPoint::NorthEast,
        CompassPoint::East,
        CompassPoint::SouthEast,
        CompassPoint::South,
        CompassPoint::SouthWest,
        CompassPoint::West,
        CompassPoint::NorthWest,
    ];

    /// `index = round(degrees / 45) mod 8`, with the input wrapped into `[0,360)`.
    pub fn from_degrees(degrees: f64) -> Self {
        if !degrees.is_finite() {
            return CompassPoint::North;
        }
        let sector = (degrees.rem_euclid(360.0) / 45.0).round() as usize;
        Self::ALL[sector % 8]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompassPoint::North => "N",
            CompassPoint::NorthEast => "NE",
            CompassPoint::East => "E",
            CompassPoint::SouthEast => "SE",
            CompassPoint::South => "S",
            CompassPoint::SouthWest => "SW",
            CompassPoint::West => "W",
            CompassPoint::NorthWest => "NW",
        }
    }
}

impl std::fmt::Display for CompassPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical current-conditions record, independent of the upstream shape.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub city_name: String,
    pub country_code: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: f64,
    pub wind_speed_kph: f64,
    pub wind_direction_deg: f64,
    pub visibility_km: f64,
    pub cloudiness_pct: u8,
    pub condition_text: String,
    pub condition_icon: IconRef,
    pub coordinates: Coordinates,
    /// Unix seconds; only set when the upstream supplies both sun times.
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
}

impl WeatherRecord {
    pub fn wind_compass(&self) -> CompassPoint {
        CompassPoint::from_degrees(self.wind_direction_deg)
    }
}

/// One line of the recency log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    pub city: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
}

impl SearchHistoryEntry {
    pub fn new(search: NewSearch, timestamp: DateTime<Utc>) -> Self {
        Self {
            city: search.city,
            country: search.country,
            temperature: search.temperature,
            timestamp,
        }
    }
}

/// Caller-supplied part of a history entry; the timestamp is always assigned
/// on insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSearch {
    pub city: String,
    pub country: String,
    pub temperature: Option<f64>,
}

impl NewSearch {
    pub fn new<C: Into<String>>(city: C) -> Result<Self, HistoryError> {
        let city = city.into();
        if city.trim().is_empty() {
            return Err(HistoryError::CityRequired);
        }
        Ok(Self { city, country: String::new(), temperature: None })
    }

    pub fn with_country<C: Into<String>>(mut self, country: C) -> Self {
        self.country = country.into();
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f64>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Parse a `{city, country?, temperature?}` body. Only `city` is
    /// validated; optional fields of the wrong type fall back to defaults.
    pub fn from_json(body: &Value) -> Result<Self, HistoryError> {
        let city = body.get("city").and_then(Value::as_str).ok_or(HistoryError::CityRequired)?;
        let country = body.get("country").and_then(Value::as_str).unwrap_or_default();
        let temperature = body.get("temperature").and_then(Value::as_f64);

        Ok(Self::new(city)?.with_country(country).with_temperature(temperature))
    }

    /// Entry describing a successful lookup. `None` when the record carries
    /// no city name to log.
    pub fn from_record(record: &WeatherRecord) -> Option<Self> {
        Self::new(record.city_name.clone())
            .ok()
            .map(|s| s.with_country(record.country_code.clone()))
            .map(|s| s.with_temperature(Some(record.temperature_c)))
    }
}

/// ISO-8601 with millisecond precision and a `Z` suffix.
mod iso_millis {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(0.0, CompassPoint::North)]
    #[case(22.4, CompassPoint::North)]
    #[case(22.5, CompassPoint::NorthEast)]
    #[case(90.0, CompassPoint::East)]
    #[case(135.0, CompassPoint::SouthEast)]
    #[case(180.0, CompassPoint::South)]
    #[case(225.0, CompassPoint::SouthWest)]
    #[case(270.0, CompassPoint::West)]
    #[case(315.0, CompassPoint::NorthWest)]
    #[case(337.5, CompassPoint::North)]
    #[case(359.0, CompassPoint::North)]
    #[case(360.0, CompassPoint::North)]
    #[case(-90.0, CompassPoint::West)]
    #[case(f64::NAN, CompassPoint::North)]
    fn compass_from_degrees(#[case] degrees: f64, #[case] expected: CompassPoint) {
        assert_eq!(CompassPoint::from_degrees(degrees), expected);
    }

    #[rstest]
    #[case("", IconRef::None)]
    #[case("10d", IconRef::Code("10d".into()))]
    #[case(
        "//cdn.weatherapi.com/weather/64x64/day/116.png",
        IconRef::Url("https://cdn.weatherapi.com/weather/64x64/day/116.png".into())
    )]
    fn icon_ref_parse(#[case] raw: &str, #[case] expected: IconRef) {
        assert_eq!(IconRef::parse(raw), expected);
    }

    #[test]
    fn icon_code_uses_template() {
        let icon = IconRef::parse("04n");
        assert_eq!(
            icon.resolve("https://openweathermap.org/img/wn/{code}@2x.png").as_deref(),
            Some("https://openweathermap.org/img/wn/04n@2x.png")
        );
        assert_eq!(IconRef::None.resolve("{code}"), None);
    }

    #[test]
    fn query_prefers_city_over_coordinates() {
        let q = WeatherQuery::from_parts(Some("Paris"), Some(1.0), Some(2.0)).unwrap();
        assert_eq!(q, WeatherQuery::City("Paris".into()));
    }

    #[test]
    fn query_falls_back_to_coordinates_on_blank_city() {
        let q = WeatherQuery::from_parts(Some("  "), Some(48.85), Some(2.35)).unwrap();
        assert_eq!(q.as_q_param(), "48.85,2.35");
        assert_eq!(q.kind(), "coordinates");
    }

    #[test]
    fn query_requires_both_coordinates() {
        let err = WeatherQuery::from_parts(None, Some(1.0), None).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidRequest(_)));
    }

    #[test]
    fn new_search_applies_defaults_for_malformed_optionals() {
        let s = NewSearch::from_json(&json!({"city": "Oslo", "country": 42, "temperature": "warm"}))
            .unwrap();
        assert_eq!(s.city, "Oslo");
        assert_eq!(s.country, "");
        assert_eq!(s.temperature, None);
    }

    #[test]
    fn new_search_requires_city() {
        assert!(matches!(
            NewSearch::from_json(&json!({"country": "NO"})),
            Err(HistoryError::CityRequired)
        ));
        assert!(matches!(NewSearch::new(""), Err(HistoryError::CityRequired)));
    }

    #[test]
    fn entry_serializes_iso_millis_timestamp() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let entry = SearchHistoryEntry::new(NewSearch::new("Rome").unwrap(), ts);
        let value = serde_json::to_value(&entry).unwrap();

        assert_eq!(value["timestamp"], "2024-05-01T12:30:00.000Z");
        assert_eq!(value["temperature"], Value::Null);
        assert_eq!(value["country"], "");
    }

    #[test]
    fn record_without_city_produces_no_search() {
        assert!(NewSearch::from_record(&WeatherRecord::default()).is_none());
    }
}
