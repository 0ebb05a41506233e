//! Condition and icon-code to glyph mapping.
//!
//! Glyph names follow the Lucide icon set; the front end resolves the name to
//! an actual drawable.

use serde::Serialize;

use crate::types::WeatherCondition;

/// Display glyph for a weather state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Glyph {
    #[default]
    Sun,
    Moon,
    Cloud,
    CloudDrizzle,
    CloudRain,
    CloudLightning,
    CloudSnow,
    CloudFog,
}

impl Glyph {
    /// Icon-set name, e.g. `cloud-rain`
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sun => "sun",
            Self::Moon => "moon",
            Self::Cloud => "cloud",
            Self::CloudDrizzle => "cloud-drizzle",
            Self::CloudRain => "cloud-rain",
            Self::CloudLightning => "cloud-lightning",
            Self::CloudSnow => "cloud-snow",
            Self::CloudFog => "cloud-fog",
        }
    }

    pub fn for_condition(condition: WeatherCondition) -> Self {
        match condition {
            WeatherCondition::Sunny => Self::Sun,
            WeatherCondition::ClearNight => Self::Moon,
            WeatherCondition::PartlyCloudy | WeatherCondition::Cloudy => Self::Cloud,
            WeatherCondition::Rainy => Self::CloudRain,
            WeatherCondition::Snowy => Self::CloudSnow,
            WeatherCondition::Stormy => Self::CloudLightning,
            WeatherCondition::Foggy => Self::CloudFog,
        }
    }

    /// Resolve a provider icon code or condition tag. Unrecognized codes get
    /// the default glyph.
    pub fn for_icon(code: &str) -> Self {
        if let Some(condition) = WeatherCondition::from_tag(code) {
            return Self::for_condition(condition);
        }

        match code {
            // Shower rain has its own glyph; every other code follows its condition
            "09d" | "09n" => Self::CloudDrizzle,
            _ => WeatherCondition::from_icon_code(code)
                .map(Self::for_condition)
                .unwrap_or_default(),
        }
    }
}

/// Glyphs for the metric tiles on the current-conditions card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetricGlyph {
    Thermometer,
    Droplets,
    Gauge,
    Wind,
    Eye,
}
