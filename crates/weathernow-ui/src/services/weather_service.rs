//! Weather backend: async weather, history and geolocation requests.
//! All provider work runs on the runtime; results are sent back via mpsc.
//! Once the shutdown token is cancelled, pending requests stop and send nothing.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use weathernow_weather::{
    HistoricalPoint, Location, LocationError, LocationSource, WeatherError, WeatherSnapshot,
    WeatherSource,
};

/// Error shown by the dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardError {
    Fetch(String),
    LocationDenied,
    LocationUnavailable,
    LocationTimeout,
    Location(String),
}

impl DashboardError {
    /// Geolocation failures are informational; only weather fetches offer a retry
    pub fn is_retriable(&self) -> bool {
        matches!(self, DashboardError::Fetch(_))
    }

    /// Short text for the error banner
    pub fn user_message(&self) -> &'static str {
        weathernow_core::AppError::from(self.clone()).user_message()
    }
}

impl std::fmt::Display for DashboardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DashboardError::Fetch(s) => write!(f, "Weather error: {}", s),
            DashboardError::LocationDenied => write!(f, "Location permission denied"),
            DashboardError::LocationUnavailable => write!(f, "Location service unavailable"),
            DashboardError::LocationTimeout => write!(f, "Location request timed out"),
            DashboardError::Location(s) => write!(f, "Location error: {}", s),
        }
    }
}

impl std::error::Error for DashboardError {}

impl From<LocationError> for DashboardError {
    fn from(e: LocationError) -> Self {
        match e {
            LocationError::PermissionDenied => DashboardError::LocationDenied,
            LocationError::ServiceUnavailable => DashboardError::LocationUnavailable,
            LocationError::Timeout => DashboardError::LocationTimeout,
            LocationError::Other(s) => DashboardError::Location(s),
        }
    }
}

/// Coordinates and optional display name of one weather load
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub lat: f64,
    pub lon: f64,
    pub name: Option<String>,
}

/// Messages sent from async operations back to the dashboard owner
#[derive(Debug)]
pub enum WeatherServiceMessage {
    /// Result of fetching current weather
    FetchDone {
        request_id: u64,
        request: FetchRequest,
        result: Result<WeatherSnapshot, WeatherError>,
    },
    /// Result of fetching the historical series
    HistoryDone {
        request_id: u64,
        result: Result<Vec<HistoricalPoint>, WeatherError>,
    },
    /// Result of asking for the device position
    LocateDone {
        request_id: u64,
        result: Result<Location, LocationError>,
    },
}

/// Request current weather asynchronously.
/// Sends `FetchDone` on the channel when complete.
pub fn request_fetch<W: WeatherSource>(
    tx: &UnboundedSender<WeatherServiceMessage>,
    runtime: &Handle,
    shutdown: &CancellationToken,
    source: Arc<W>,
    request_id: u64,
    request: FetchRequest,
) {
    let tx = tx.clone();
    let shutdown = shutdown.clone();
    runtime.spawn(async move {
        let result = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                tracing::debug!("Weather fetch #{} dropped on shutdown", request_id);
                return;
            }
            result = source.current_weather(request.lat, request.lon) => result,
        };
        let _ = tx.send(WeatherServiceMessage::FetchDone {
            request_id,
            request,
            result,
        });
    });
}

/// Request the historical series asynchronously.
/// Sends `HistoryDone` on the channel when complete.
#[allow(clippy::too_many_arguments)]
pub fn request_history<W: WeatherSource>(
    tx: &UnboundedSender<WeatherServiceMessage>,
    runtime: &Handle,
    shutdown: &CancellationToken,
    source: Arc<W>,
    request_id: u64,
    lat: f64,
    lon: f64,
    days: u32,
) {
    let tx = tx.clone();
    let shutdown = shutdown.clone();
    runtime.spawn(async move {
        let result = tokio::select! {
            biased;
            _ = shutdown.cancelled() => return,
            result = source.historical(lat, lon, days) => result,
        };
        let _ = tx.send(WeatherServiceMessage::HistoryDone { request_id, result });
    });
}

/// Request the device position asynchronously.
/// Sends `LocateDone` on the channel when complete.
pub fn request_locate<G: LocationSource>(
    tx: &UnboundedSender<WeatherServiceMessage>,
    runtime: &Handle,
    shutdown: &CancellationToken,
    locator: Arc<G>,
    request_id: u64,
) {
    let tx = tx.clone();
    let shutdown = shutdown.clone();
    runtime.spawn(async move {
        let result = tokio::select! {
            biased;
            _ = shutdown.cancelled() => return,
            result = locator.current_location() => result,
        };
        if let Ok(loc) = &result {
            tracing::info!("Got location: {}, {}", loc.latitude, loc.longitude);
        }
        let _ = tx.send(WeatherServiceMessage::LocateDone { request_id, result });
    });
}
