//! View models derived from weather data.
//!
//! Everything here is a pure function of its inputs; the front end only
//! lays out what these return.

use chrono::Timelike;
use serde::Serialize;

use crate::dashboard::DashboardState;

use weathernow_weather::{
    DayForecast, Glyph, HistoricalPoint, HourlyWeather, MetricGlyph, WeatherCondition,
    WeatherSnapshot,
};

/// Rows shown in the hourly strip
pub const HOURLY_ROWS: usize = 12;

/// Page background, chosen from the current condition and local hour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    NoData,
    Night,
    Sunny,
    /// Partly cloudy, and the fallback for conditions without their own theme
    Fair,
    Cloudy,
    Rainy,
    Snowy,
    Stormy,
}

impl Theme {
    /// Gradient stops, top-left to bottom-right
    pub fn gradient(&self) -> [&'static str; 3] {
        match self {
            Theme::NoData => ["#1e3a8a", "#1e40af", "#312e81"],
            Theme::Night => ["#312e81", "#581c87", "#1e3a8a"],
            Theme::Sunny => ["#facc15", "#f97316", "#ef4444"],
            Theme::Fair => ["#60a5fa", "#3b82f6", "#2563eb"],
            Theme::Cloudy => ["#4b5563", "#374151", "#1f2937"],
            Theme::Rainy => ["#374151", "#1e40af", "#1e3a8a"],
            Theme::Snowy => ["#bfdbfe", "#93c5fd", "#60a5fa"],
            Theme::Stormy => ["#1f2937", "#111827", "#000000"],
        }
    }
}

pub fn is_night(hour: u32) -> bool {
    hour < 6 || hour > 18
}

/// `condition` is `None` until weather has loaded. Night wins over any condition.
pub fn background_theme(condition: Option<WeatherCondition>, hour: u32) -> Theme {
    let Some(condition) = condition else {
        return Theme::NoData;
    };
    if is_night(hour) {
        return Theme::Night;
    }
    match condition {
        WeatherCondition::Sunny => Theme::Sunny,
        WeatherCondition::PartlyCloudy => Theme::Fair,
        WeatherCondition::Cloudy => Theme::Cloudy,
        WeatherCondition::Rainy => Theme::Rainy,
        WeatherCondition::Snowy => Theme::Snowy,
        WeatherCondition::Stormy => Theme::Stormy,
        WeatherCondition::Foggy | WeatherCondition::ClearNight => Theme::Fair,
    }
}

/// Theme for the shown weather at the current local hour
pub fn current_theme(weather: Option<&WeatherSnapshot>) -> Theme {
    background_theme(weather.map(|w| w.current.condition), chrono::Local::now().hour())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyRow {
    /// `Now` for the first row, `HH:MM` after
    pub label: String,
    pub is_current: bool,
    pub glyph: Glyph,
    pub temp: i64,
    pub precipitation: i64,
}

pub fn hourly_rows(hourly: &[HourlyWeather]) -> Vec<HourlyRow> {
    hourly
        .iter()
        .take(HOURLY_ROWS)
        .enumerate()
        .map(|(i, hour)| HourlyRow {
            label: if i == 0 {
                "Now".to_string()
            } else {
                hour.time.format("%H:%M").to_string()
            },
            is_current: i == 0,
            glyph: Glyph::for_icon(&hour.icon),
            temp: round(hour.temp),
            precipitation: round(hour.precipitation),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRow {
    pub day: String,
    pub description: String,
    pub is_today: bool,
    pub glyph: Glyph,
    pub high: i64,
    pub low: i64,
    /// e.g. `20%`
    pub precipitation: String,
    /// e.g. `8 km/h`
    pub wind: String,
}

pub fn forecast_rows(forecast: &[DayForecast]) -> Vec<ForecastRow> {
    forecast
        .iter()
        .enumerate()
        .map(|(i, day)| ForecastRow {
            day: day.day.clone(),
            description: day.description.clone(),
            is_today: i == 0,
            glyph: Glyph::for_icon(&day.icon),
            high: round(day.high),
            low: round(day.low),
            precipitation: format!("{}%", day.precipitation),
            wind: format!("{} km/h", day.wind_speed),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricTile {
    pub label: &'static str,
    pub value: String,
    pub glyph: MetricGlyph,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentCard {
    pub location: String,
    pub description: String,
    pub temp: i64,
    pub glyph: Glyph,
    pub metrics: Vec<MetricTile>,
}

pub fn current_card(snapshot: &WeatherSnapshot) -> CurrentCard {
    let current = &snapshot.current;
    let tile = |label, value: String, glyph| MetricTile { label, value, glyph };

    CurrentCard {
        location: snapshot.location.display_name(),
        description: current.description.clone(),
        temp: round(current.temp),
        glyph: Glyph::for_icon(&current.icon),
        metrics: vec![
            tile("Feels like", format!("{}°", round(current.feels_like)), MetricGlyph::Thermometer),
            tile("Humidity", format!("{}%", current.humidity), MetricGlyph::Droplets),
            tile("Wind", format!("{} km/h", current.wind_speed), MetricGlyph::Wind),
            tile("Pressure", format!("{} hPa", current.pressure), MetricGlyph::Gauge),
            tile("Visibility", format!("{} km", current.visibility), MetricGlyph::Eye),
            tile("UV Index", current.uv_index.to_string(), MetricGlyph::Thermometer),
        ],
    }
}

/// Series selectable in the history chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartMetric {
    #[default]
    Temp,
    Humidity,
    Pressure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricConfig {
    pub name: &'static str,
    pub color: &'static str,
    pub unit: &'static str,
}

impl ChartMetric {
    pub const ALL: [ChartMetric; 3] = [ChartMetric::Temp, ChartMetric::Humidity, ChartMetric::Pressure];

    /// Toggle button text
    pub fn label(&self) -> &'static str {
        match self {
            ChartMetric::Temp => "Temperature",
            ChartMetric::Humidity => "Humidity",
            ChartMetric::Pressure => "Pressure",
        }
    }

    pub fn config(&self) -> MetricConfig {
        match self {
            ChartMetric::Temp => MetricConfig {
                name: "Temperature (°C)",
                color: "#F59E0B",
                unit: "°C",
            },
            ChartMetric::Humidity => MetricConfig {
                name: "Humidity (%)",
                color: "#3B82F6",
                unit: "%",
            },
            ChartMetric::Pressure => MetricConfig {
                name: "Pressure (hPa)",
                color: "#8B5CF6",
                unit: "hPa",
            },
        }
    }

    pub fn value(&self, point: &HistoricalPoint) -> f64 {
        match self {
            ChartMetric::Temp => point.temp,
            ChartMetric::Humidity => point.humidity,
            ChartMetric::Pressure => point.pressure,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    /// Axis tick, e.g. `Jan 21`
    pub label: String,
    pub value: f64,
    /// e.g. `Temperature (°C): 21.5°C`
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub metric: ChartMetric,
    pub config: MetricConfig,
    pub points: Vec<ChartPoint>,
    /// Y axis bounds: data range padded by 5 on both ends
    pub domain: Option<(f64, f64)>,
}

pub fn chart_series(points: &[HistoricalPoint], metric: ChartMetric) -> ChartSeries {
    let config = metric.config();

    let domain = points.iter().map(|p| metric.value(p)).fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
    });

    ChartSeries {
        metric,
        config,
        points: points
            .iter()
            .map(|p| {
                let value = metric.value(p);
                ChartPoint {
                    label: p.date.format("%b %-d").to_string(),
                    value,
                    tooltip: format!("{}: {:.1}{}", config.name, value, config.unit),
                }
            })
            .collect(),
        domain: domain.map(|(lo, hi)| (lo - 5.0, hi + 5.0)),
    }
}

/// Everything the page shows for one dashboard state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub theme: Theme,
    pub location: Option<String>,
    pub loading: bool,
    pub error: Option<&'static str>,
    pub can_retry: bool,
    pub geo_error: Option<&'static str>,
    pub current: Option<CurrentCard>,
    pub hourly: Vec<HourlyRow>,
    pub forecast: Vec<ForecastRow>,
    pub chart: ChartSeries,
}

pub fn dashboard_view(state: &DashboardState, metric: ChartMetric, hour: u32) -> DashboardView {
    let weather = state.weather.as_ref();

    DashboardView {
        theme: background_theme(weather.map(|w| w.current.condition), hour),
        location: state.current_location.as_ref().map(|l| l.name.clone()),
        loading: state.loading,
        error: state.error.as_ref().map(|e| e.user_message()),
        can_retry: state.error.as_ref().is_some_and(|e| e.is_retriable()),
        geo_error: state.geo_error.as_ref().map(|e| e.user_message()),
        current: weather.map(current_card),
        hourly: weather.map(|w| hourly_rows(&w.hourly)).unwrap_or_default(),
        forecast: weather.map(|w| forecast_rows(&w.forecast)).unwrap_or_default(),
        chart: chart_series(&state.history, metric),
    }
}

fn round(value: f64) -> i64 {
    value.round() as i64
}
