//! Centralized error types for the WeatherNow application.
//!
//! This module provides a typed error hierarchy that:
//! - Keeps service failures distinguishable for handling and logging
//! - Provides user-friendly messages suitable for UI display
//! - Records whether the failed action can be retried from the UI

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a UI-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Weather service error: {0}")]
    Weather(#[from] WeatherError),

    #[error("Geolocation error: {0}")]
    Geolocation(#[from] GeolocationError),
}

impl AppError {
    /// Returns a user-friendly message suitable for display in the UI.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Config(e) => e.user_message(),
            AppError::Weather(e) => e.user_message(),
            AppError::Geolocation(e) => e.user_message(),
        }
    }

    /// Whether the UI should offer a "Try Again" action for this error.
    ///
    /// Geolocation failures are informational: the user has to change a
    /// permission or pick a location by hand instead.
    pub fn is_retriable(&self) -> bool {
        matches!(self, AppError::Weather(_))
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
        }
    }
}

/// Weather data errors. History failures only empty the chart and never
/// reach the banner.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Failed to fetch weather: {0}")]
    FetchFailed(String),
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::FetchFailed(_) => "Failed to load weather data. Please try again.",
        }
    }
}

/// Device location errors.
#[derive(Debug, Error)]
pub enum GeolocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location service unavailable")]
    Unavailable,

    #[error("Location request timed out")]
    Timeout,

    #[error("Location lookup failed: {0}")]
    Failed(String),
}

impl GeolocationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            GeolocationError::PermissionDenied => {
                "Location access denied. Please enable location permissions."
            }
            GeolocationError::Unavailable => "Location information is unavailable.",
            GeolocationError::Timeout => "Location request timed out.",
            GeolocationError::Failed(_) => "Unable to determine your location.",
        }
    }
}
