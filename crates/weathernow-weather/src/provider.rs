//! Weather data sources.
//!
//! `MockWeatherProvider` stands in for a real provider client: it serves a
//! fixed New York template relocated to the requested coordinates, plus a
//! generated hourly and historical series.

use std::f64::consts::PI;
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Timelike, Utc};

use crate::types::{
    CurrentConditions, DayForecast, HistoricalPoint, HourlyWeather, Place, WeatherCondition,
    WeatherError, WeatherSnapshot,
};

pub const FORECAST_DAYS: usize = 7;
pub const HOURLY_ENTRIES: u32 = 24;

/// Supplies current conditions, forecasts and history for a coordinate pair
pub trait WeatherSource: Send + Sync + 'static {
    /// Current conditions with a 7-day forecast (today first) and a 24-entry
    /// hourly series (current hour first)
    fn current_weather(
        &self,
        lat: f64,
        lon: f64,
    ) -> impl Future<Output = Result<WeatherSnapshot, WeatherError>> + Send;

    /// One entry per day, oldest first, `days + 1` entries ending today
    fn historical(
        &self,
        lat: f64,
        lon: f64,
        days: u32,
    ) -> impl Future<Output = Result<Vec<HistoricalPoint>, WeatherError>> + Send;
}

/// Simulated provider delays
#[derive(Debug, Clone, Copy, Default)]
pub struct MockLatency {
    pub current: Duration,
    pub historical: Duration,
}

impl MockLatency {
    /// Delays comparable to a real provider round trip
    pub fn realistic() -> Self {
        Self {
            current: Duration::from_millis(1000),
            historical: Duration::from_millis(800),
        }
    }
}

/// Locally generated weather data
#[derive(Debug, Clone, Default)]
pub struct MockWeatherProvider {
    api_key: Option<String>,
    latency: MockLatency,
}

struct DayTemplate {
    high: f64,
    low: f64,
    condition: WeatherCondition,
    description: &'static str,
    icon: &'static str,
    humidity: f64,
    wind_speed: f64,
    precipitation: f64,
}

const WEEK: [DayTemplate; FORECAST_DAYS] = [
    DayTemplate {
        high: 24.0,
        low: 18.0,
        condition: WeatherCondition::PartlyCloudy,
        description: "Partly cloudy",
        icon: "02d",
        humidity: 65.0,
        wind_speed: 12.0,
        precipitation: 10.0,
    },
    DayTemplate {
        high: 26.0,
        low: 19.0,
        condition: WeatherCondition::Sunny,
        description: "Sunny",
        icon: "01d",
        humidity: 58.0,
        wind_speed: 8.0,
        precipitation: 0.0,
    },
    DayTemplate {
        high: 21.0,
        low: 15.0,
        condition: WeatherCondition::Rainy,
        description: "Light rain",
        icon: "10d",
        humidity: 80.0,
        wind_speed: 15.0,
        precipitation: 75.0,
    },
    DayTemplate {
        high: 19.0,
        low: 13.0,
        condition: WeatherCondition::Cloudy,
        description: "Overcast",
        icon: "04d",
        humidity: 72.0,
        wind_speed: 10.0,
        precipitation: 20.0,
    },
    DayTemplate {
        high: 23.0,
        low: 17.0,
        condition: WeatherCondition::PartlyCloudy,
        description: "Partly cloudy",
        icon: "03d",
        humidity: 62.0,
        wind_speed: 9.0,
        precipitation: 5.0,
    },
    DayTemplate {
        high: 25.0,
        low: 20.0,
        condition: WeatherCondition::Sunny,
        description: "Sunny",
        icon: "01d",
        humidity: 55.0,
        wind_speed: 7.0,
        precipitation: 0.0,
    },
    DayTemplate {
        high: 27.0,
        low: 21.0,
        condition: WeatherCondition::Sunny,
        description: "Sunny",
        icon: "01d",
        humidity: 52.0,
        wind_speed: 6.0,
        precipitation: 0.0,
    },
];

impl MockWeatherProvider {
    pub fn new(api_key: Option<String>) -> Self {
        if api_key.is_none() {
            tracing::debug!("No weather API key configured; serving mock data");
        }
        Self {
            api_key,
            latency: MockLatency::default(),
        }
    }

    pub fn with_latency(mut self, latency: MockLatency) -> Self {
        self.latency = latency;
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Build the snapshot for `today` at time `now`. Deterministic for a given input.
    pub fn snapshot(
        &self,
        lat: f64,
        lon: f64,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> WeatherSnapshot {
        let forecast = WEEK
            .iter()
            .enumerate()
            .map(|(offset, t)| {
                let date = today + Days::new(offset as u64);
                DayForecast {
                    date,
                    day: day_label(offset, date),
                    high: t.high,
                    low: t.low,
                    condition: t.condition,
                    description: t.description.to_string(),
                    icon: t.icon.to_string(),
                    humidity: t.humidity,
                    wind_speed: t.wind_speed,
                    precipitation: t.precipitation,
                }
            })
            .collect();

        WeatherSnapshot {
            location: Place::new("New York", "US", lat, lon),
            current: CurrentConditions {
                temp: 22.0,
                feels_like: 25.0,
                humidity: 65.0,
                pressure: 1013.0,
                wind_speed: 12.0,
                wind_direction: 180.0,
                visibility: 10.0,
                uv_index: 6.0,
                condition: WeatherCondition::PartlyCloudy,
                description: "Partly cloudy".to_string(),
                icon: "02d".to_string(),
                timestamp: now,
            },
            forecast,
            hourly: hourly_series(now.hour()),
            alerts: Vec::new(),
        }
    }

    /// Build `days + 1` daily points ending at `today`, oldest first
    pub fn history(&self, days: u32, today: NaiveDate) -> Vec<HistoricalPoint> {
        (0..=days)
            .rev()
            .map(|ago| {
                let i = f64::from(ago);
                HistoricalPoint {
                    date: today - Days::new(u64::from(ago)),
                    temp: 15.0 + (i / 30.0 * PI * 2.0).sin() * 10.0 + jitter(i, 1.0) * 8.0,
                    humidity: 50.0 + jitter(i, 2.0) * 40.0,
                    pressure: 1000.0 + jitter(i, 3.0) * 40.0,
                    wind_speed: jitter(i, 4.0) * 20.0,
                }
            })
            .collect()
    }
}

fn check_coordinates(lat: f64, lon: f64) -> Result<(), WeatherError> {
    if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        Err(WeatherError::InvalidCoordinates { lat, lon })
    }
}

impl WeatherSource for MockWeatherProvider {
    async fn current_weather(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot, WeatherError> {
        check_coordinates(lat, lon)?;
        if !self.latency.current.is_zero() {
            tokio::time::sleep(self.latency.current).await;
        }

        let now = Utc::now();
        tracing::debug!("Serving mock weather for {:.4}, {:.4}", lat, lon);
        Ok(self.snapshot(lat, lon, now.date_naive(), now))
    }

    async fn historical(
        &self,
        lat: f64,
        lon: f64,
        days: u32,
    ) -> Result<Vec<HistoricalPoint>, WeatherError> {
        check_coordinates(lat, lon)?;
        if !self.latency.historical.is_zero() {
            tokio::time::sleep(self.latency.historical).await;
        }

        Ok(self.history(days, Utc::now().date_naive()))
    }
}

fn day_label(offset: usize, date: NaiveDate) -> String {
    match offset {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => date.format("%A").to_string(),
    }
}

/// 24 entries starting at `start_hour`; hours before 06:00 and after 18:00 are night
fn hourly_series(start_hour: u32) -> Vec<HourlyWeather> {
    (0..HOURLY_ENTRIES)
        .map(|offset| {
            let hour = (start_hour + offset) % 24;
            let i = f64::from(hour);
            let night = hour < 6 || hour > 18;
            HourlyWeather {
                time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or_default(),
                temp: 20.0 + (i / 24.0 * PI * 2.0).sin() * 8.0 + jitter(i, 5.0) * 4.0,
                condition: if night {
                    WeatherCondition::ClearNight
                } else {
                    WeatherCondition::Sunny
                },
                icon: if night { "01n" } else { "01d" }.to_string(),
                precipitation: jitter(i, 6.0) * 20.0,
                wind_speed: 5.0 + jitter(i, 7.0) * 10.0,
            }
        })
        .collect()
}

/// Stable pseudo-random value in `[0, 1)` for a sample index and channel
fn jitter(index: f64, channel: f64) -> f64 {
    let x = ((index + 1.0) * 12.9898 + channel * 78.233).sin() * 43758.5453;
    x - x.floor()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Weekday};

    fn fixed_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 21).unwrap()
    }

    fn at_hour(hour: u32) -> DateTime<Utc> {
        fixed_day().and_hms_opt(hour, 0, 0).unwrap().and_utc()
    }

    #[test]
    fn test_snapshot_uses_requested_coordinates() {
        let provider = MockWeatherProvider::default();
        let snap = provider.snapshot(51.5074, -0.1278, fixed_day(), at_hour(0));
        assert_eq!(snap.location.lat, 51.5074);
        assert_eq!(snap.location.lon, -0.1278);
        assert_eq!(snap.location.name, "New York");
    }

    #[test]
    fn test_forecast_has_seven_ordered_days() {
        let provider = MockWeatherProvider::default();
        let snap = provider.snapshot(40.7, -74.0, fixed_day(), at_hour(0));

        assert_eq!(snap.forecast.len(), FORECAST_DAYS);
        assert_eq!(snap.forecast[0].date, fixed_day());
        assert_eq!(snap.forecast[0].day, "Today");
        assert_eq!(snap.forecast[1].day, "Tomorrow");
        // 2025-01-23 is a Thursday
        assert_eq!(snap.forecast[2].date.weekday(), Weekday::Thu);
        assert_eq!(snap.forecast[2].day, "Thursday");
        for pair in snap.forecast.windows(2) {
            assert_eq!(pair[1].date, pair[0].date + Days::new(1));
        }
    }

    #[test]
    fn test_hourly_has_24_entries_with_night_hours() {
        let provider = MockWeatherProvider::default();
        let snap = provider.snapshot(40.7, -74.0, fixed_day(), at_hour(0));

        assert_eq!(snap.hourly.len(), 24);
        assert_eq!(snap.hourly[0].time, NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        assert_eq!(snap.hourly[23].time, NaiveTime::from_hms_opt(23, 0, 0).unwrap());
        assert_eq!(snap.hourly[5].condition, WeatherCondition::ClearNight);
        assert_eq!(snap.hourly[5].icon, "01n");
        assert_eq!(snap.hourly[6].condition, WeatherCondition::Sunny);
        assert_eq!(snap.hourly[18].icon, "01d");
        assert_eq!(snap.hourly[19].condition, WeatherCondition::ClearNight);
    }

    #[test]
    fn test_hourly_starts_at_current_hour_and_wraps() {
        let provider = MockWeatherProvider::default();
        let snap = provider.snapshot(40.7, -74.0, fixed_day(), at_hour(15));

        assert_eq!(snap.hourly.len(), 24);
        assert_eq!(snap.hourly[0].time, NaiveTime::from_hms_opt(15, 0, 0).unwrap());
        assert_eq!(snap.hourly[8].time, NaiveTime::from_hms_opt(23, 0, 0).unwrap());
        assert_eq!(snap.hourly[9].time, NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        assert_eq!(snap.hourly[23].time, NaiveTime::from_hms_opt(14, 0, 0).unwrap());
        assert_eq!(snap.current.timestamp, at_hour(15));
    }

    #[test]
    fn test_history_length_and_order() {
        let provider = MockWeatherProvider::default();
        let history = provider.history(30, fixed_day());

        assert_eq!(history.len(), 31);
        assert_eq!(history.first().unwrap().date, fixed_day() - Days::new(30));
        assert_eq!(history.last().unwrap().date, fixed_day());
        for pair in history.windows(2) {
            assert!(pair[0].date < pair[1].date);
        }
    }

    #[test]
    fn test_history_values_in_range() {
        let provider = MockWeatherProvider::default();
        for point in provider.history(60, fixed_day()) {
            assert!((50.0..90.0).contains(&point.humidity));
            assert!((1000.0..1040.0).contains(&point.pressure));
            assert!((0.0..20.0).contains(&point.wind_speed));
        }
    }

    #[test]
    fn test_history_zero_days_is_today_only() {
        let provider = MockWeatherProvider::default();
        let history = provider.history(0, fixed_day());
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].date, fixed_day());
    }

    #[test]
    fn test_jitter_is_deterministic_and_bounded() {
        for i in 0..100 {
            let v = jitter(f64::from(i), 1.0);
            assert!((0.0..1.0).contains(&v));
            assert_eq!(v, jitter(f64::from(i), 1.0));
        }
    }

    #[tokio::test]
    async fn test_current_weather_rejects_bad_coordinates() {
        let provider = MockWeatherProvider::default();
        let err = provider.current_weather(91.0, 0.0).await.unwrap_err();
        assert!(matches!(err, WeatherError::InvalidCoordinates { .. }));
    }

    #[tokio::test]
    async fn test_historical_fetch() {
        let provider = MockWeatherProvider::new(None);
        let history = provider.historical(40.7, -74.0, 7).await.unwrap();
        assert_eq!(history.len(), 8);
        assert_eq!(history.last().unwrap().date, Utc::now().date_naive());
    }

    #[tokio::test(start_paused = true)]
    async fn test_realistic_latency() {
        let provider = MockWeatherProvider::default().with_latency(MockLatency::realistic());
        let started = tokio::time::Instant::now();
        provider.current_weather(40.7, -74.0).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(1000));
    }
}
