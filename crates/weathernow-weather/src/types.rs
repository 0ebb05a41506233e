use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Weather condition categories used for glyphs and background themes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WeatherCondition {
    #[default]
    Sunny,
    PartlyCloudy,
    Cloudy,
    Rainy,
    Snowy,
    Stormy,
    Foggy,
    ClearNight,
}

impl WeatherCondition {
    pub const ALL: [WeatherCondition; 8] = [
        Self::Sunny,
        Self::PartlyCloudy,
        Self::Cloudy,
        Self::Rainy,
        Self::Snowy,
        Self::Stormy,
        Self::Foggy,
        Self::ClearNight,
    ];

    /// The wire tag, e.g. `partly-cloudy`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sunny => "sunny",
            Self::PartlyCloudy => "partly-cloudy",
            Self::Cloudy => "cloudy",
            Self::Rainy => "rainy",
            Self::Snowy => "snowy",
            Self::Stormy => "stormy",
            Self::Foggy => "foggy",
            Self::ClearNight => "clear-night",
        }
    }

    /// Parse a condition tag. Returns `None` for anything outside the enumeration.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == tag)
    }

    /// Convert an OpenWeatherMap icon code (`01d`, `10n`, ...) to a condition.
    /// See: https://openweathermap.org/weather-conditions
    pub fn from_icon_code(code: &str) -> Option<Self> {
        let group = code.get(..2)?;
        let night = match code.get(2..)? {
            "d" => false,
            "n" => true,
            _ => return None,
        };
        let condition = match group {
            "01" if night => Self::ClearNight,
            "01" => Self::Sunny,
            "02" => Self::PartlyCloudy,
            "03" | "04" => Self::Cloudy,
            "09" | "10" => Self::Rainy,
            "11" => Self::Stormy,
            "13" => Self::Snowy,
            "50" => Self::Foggy,
            _ => return None,
        };
        Some(condition)
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Sunny => "Sunny",
            Self::PartlyCloudy => "Partly cloudy",
            Self::Cloudy => "Cloudy",
            Self::Rainy => "Rain",
            Self::Snowy => "Snow",
            Self::Stormy => "Thunderstorm",
            Self::Foggy => "Fog",
            Self::ClearNight => "Clear night",
        }
    }
}

impl std::fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved place candidate returned by location search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

impl Place {
    pub fn new(name: impl Into<String>, country: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
            lat,
            lon,
        }
    }

    /// `"name, country"`, the label shown in the search box after selection
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.name, self.country)
    }
}

/// Device position reported by geolocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub city_name: Option<String>,
    pub country_code: Option<String>,
}

impl Location {
    /// "City, CC" when the source reported both parts, the city alone otherwise
    pub fn display_name(&self) -> Option<String> {
        let city = self.city_name.as_deref().filter(|c| !c.is_empty())?;
        match self.country_code.as_deref().filter(|c| !c.is_empty()) {
            Some(cc) => Some(format!("{}, {}", city, cc)),
            None => Some(city.to_string()),
        }
    }
}

/// Current weather conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub visibility: f64,
    pub uv_index: f64,
    pub condition: WeatherCondition,
    pub description: String,
    pub icon: String,
    pub timestamp: DateTime<Utc>,
}

/// Daily forecast entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayForecast {
    pub date: NaiveDate,
    /// `Today`, `Tomorrow`, then weekday names
    pub day: String,
    pub high: f64,
    pub low: f64,
    pub condition: WeatherCondition,
    pub description: String,
    pub icon: String,
    pub humidity: f64,
    pub wind_speed: f64,
    /// Chance of precipitation in percent
    pub precipitation: f64,
}

/// Hourly forecast entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyWeather {
    /// Written as `HH:MM`
    #[serde(with = "hour_minute")]
    pub time: NaiveTime,
    pub temp: f64,
    pub condition: WeatherCondition,
    pub icon: String,
    pub precipitation: f64,
    pub wind_speed: f64,
}

mod hour_minute {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// One day of the historical trend series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub date: NaiveDate,
    pub temp: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Minor,
    Moderate,
    Severe,
    Extreme,
}

/// Provider-issued weather alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherAlert {
    pub id: String,
    pub title: String,
    pub description: String,
    pub severity: AlertSeverity,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Complete weather data bundle for one location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location: Place,
    pub current: CurrentConditions,
    /// One entry per day, today first
    pub forecast: Vec<DayForecast>,
    /// One entry per hour, current hour first
    pub hourly: Vec<HourlyWeather>,
    #[serde(default)]
    pub alerts: Vec<WeatherAlert>,
}

/// Location service errors
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location error: {0}")]
    Other(String),
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Invalid coordinates: {lat}, {lon}")]
    InvalidCoordinates { lat: f64, lon: f64 },
    #[error("Weather service unavailable: {0}")]
    Unavailable(String),
}

/// Location search errors
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("Lookup transport failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Lookup failed: {0}")]
    Other(String),
}
