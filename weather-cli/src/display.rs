//! Human-friendly rendering of weather records and search history.

use std::fmt::{Display, Write};

use chrono::{DateTime, TimeZone, Utc};
use weather_core::{SearchHistoryEntry, WeatherRecord};

pub fn render_card<Tz>(record: &WeatherRecord, icon_template: &str, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut out = String::new();

    let title = match (record.city_name.as_str(), record.country_code.as_str()) {
        ("", _) => "Unknown".to_string(),
        (city, "") => city.to_string(),
        (city, country) => format!("{city}, {country}"),
    };
    let _ = writeln!(out, "{title}");
    if !record.condition_text.is_empty() {
        let _ = writeln!(out, "  {}", record.condition_text);
    }

    let mut row = |label: &str, value: String| {
        let _ = writeln!(out, "  {label:<13} {value}");
    };

    row(
        "Temperature",
        format!(
            "{} (feels like {})",
            format_temperature(record.temperature_c),
            format_temperature(record.feels_like_c)
        ),
    );
    row("Humidity", format!("{}%", record.humidity_pct));
    row("Pressure", format!("{} hPa", record.pressure_hpa));
    row("Wind", format!("{:.1} km/h {}", record.wind_speed_kph, record.wind_compass()));
    row("Visibility", format!("{:.1} km", record.visibility_km));
    row("Cloudiness", format!("{}%", record.cloudiness_pct));
    row(
        "Coordinates",
        format!("{:.4}, {:.4}", record.coordinates.lat, record.coordinates.lon),
    );
    if let (Some(rise), Some(set)) = (record.sunrise, record.sunset) {
        row("Sunrise", format_clock(rise, tz));
        row("Sunset", format_clock(set, tz));
    }
    if let Some(url) = record.condition_icon.resolve(icon_template) {
        row("Icon", url);
    }

    out
}

pub fn render_history(entries: &[SearchHistoryEntry], now: DateTime<Utc>) -> String {
    if entries.is_empty() {
        return "No searches yet.\n".to_string();
    }

    let mut out = String::new();
    for entry in entries {
        let place = if entry.country.is_empty() {
            entry.city.clone()
        } else {
            format!("{}, {}", entry.city, entry.country)
        };
        let temperature =
            entry.temperature.map(format_temperature).unwrap_or_else(|| "--".to_string());
        let _ = writeln!(
            out,
            "{place:<30} {temperature:>6}  {}",
            relative_age(entry.timestamp, now)
        );
    }
    out
}

fn format_temperature(celsius: f64) -> String {
    format!("{}°C", celsius.round() as i64)
}

fn format_clock<Tz>(unix: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    DateTime::from_timestamp(unix, 0)
        .map(|dt| dt.with_timezone(tz).format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

/// "Just now" under an hour, then whole hours, then whole days.
pub fn relative_age(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let hours = (now - timestamp).num_hours();
    if hours < 1 {
        "Just now".to_string()
    } else if hours < 24 {
        format!("{hours}h ago")
    } else {
        format!("{}d ago", hours / 24)
    }
}
