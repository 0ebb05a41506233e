use crate::services::DashboardError;
use weathernow_core::{AppError, GeolocationError, WeatherError};

impl From<DashboardError> for AppError {
    fn from(e: DashboardError) -> Self {
        match e {
            DashboardError::Fetch(s) => AppError::Weather(WeatherError::FetchFailed(s)),
            DashboardError::LocationDenied => AppError::Geolocation(GeolocationError::PermissionDenied),
            DashboardError::LocationUnavailable => AppError::Geolocation(GeolocationError::Unavailable),
            DashboardError::LocationTimeout => AppError::Geolocation(GeolocationError::Timeout),
            DashboardError::Location(s) => AppError::Geolocation(GeolocationError::Failed(s)),
        }
    }
}
