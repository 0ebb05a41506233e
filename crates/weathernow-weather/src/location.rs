//! Device location via IP geolocation.
//!
//! Desktop builds have no browser geolocation prompt, so the position comes
//! from an IP lookup service returning `ip-api.com` shaped JSON.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::retry::{with_retry, RetryConfig};
use crate::types::{Location, LocationError};

const USER_AGENT: &str = "WeatherNow/0.1.0";

/// Anything that can report the device position
pub trait LocationSource: Send + Sync + 'static {
    fn current_location(&self) -> impl Future<Output = Result<Location, LocationError>> + Send;
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    city: Option<String>,
    #[serde(rename = "countryCode")]
    country_code: Option<String>,
    message: Option<String>,
}

/// IP geolocation client
#[derive(Debug, Clone)]
pub struct Geolocator {
    client: Client,
    endpoint: String,
    retry: RetryConfig,
}

impl Geolocator {
    /// # Errors
    /// `LocationError::Other` if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, LocationError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| LocationError::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            retry: RetryConfig::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn locate(&self) -> Result<Location, LocationError> {
        let response = with_retry(&self.retry, || self.client.get(&self.endpoint).send())
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LocationError::Timeout
                } else if e.is_connect() {
                    LocationError::ServiceUnavailable
                } else {
                    LocationError::Other(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN || status == StatusCode::UNAUTHORIZED {
            return Err(LocationError::PermissionDenied);
        }
        if !status.is_success() {
            tracing::debug!("Geolocation returned status {}", status);
            return Err(LocationError::ServiceUnavailable);
        }

        let body: IpApiResponse = response
            .json()
            .await
            .map_err(|e| LocationError::Other(format!("Invalid geolocation response: {}", e)))?;

        if body.status != "success" {
            let reason = body.message.unwrap_or_else(|| "unknown reason".to_string());
            return Err(LocationError::Other(reason));
        }

        match (body.lat, body.lon) {
            (Some(latitude), Some(longitude)) => Ok(Location {
                latitude,
                longitude,
                city_name: body.city,
                country_code: body.country_code,
            }),
            _ => Err(LocationError::Other(
                "Geolocation response is missing coordinates".to_string(),
            )),
        }
    }
}

impl LocationSource for Geolocator {
    async fn current_location(&self) -> Result<Location, LocationError> {
        let location = self.locate().await?;
        tracing::info!(
            "Located device at {:.4}, {:.4} ({})",
            location.latitude,
            location.longitude,
            location.city_name.as_deref().unwrap_or("unknown city")
        );
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn geolocator_for(server: &MockServer) -> Geolocator {
        Geolocator::new(format!("{}/json", server.uri()), Duration::from_secs(2))
            .unwrap()
            .with_retry(RetryConfig::new(1, 1, 5))
    }

    #[tokio::test]
    async fn test_locate_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "lat": 51.5074,
                "lon": -0.1278,
                "city": "London",
                "countryCode": "GB"
            })))
            .mount(&server)
            .await;

        let location = geolocator_for(&server).await.current_location().await.unwrap();

        assert_eq!(location.latitude, 51.5074);
        assert_eq!(location.longitude, -0.1278);
        assert_eq!(location.display_name().as_deref(), Some("London, GB"));
    }

    #[tokio::test]
    async fn test_locate_failure_status_in_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "fail",
                "message": "private range"
            })))
            .mount(&server)
            .await;

        let err = geolocator_for(&server).await.current_location().await.unwrap_err();

        match err {
            LocationError::Other(msg) => assert!(msg.contains("private range")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_locate_forbidden_is_permission_denied() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = geolocator_for(&server).await.current_location().await.unwrap_err();
        assert!(matches!(err, LocationError::PermissionDenied));
    }

    #[tokio::test]
    async fn test_locate_server_error_is_unavailable_after_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json"))
            .respond_with(ResponseTemplate::new(502))
            .expect(2)
            .mount(&server)
            .await;

        let err = geolocator_for(&server).await.current_location().await.unwrap_err();
        assert!(matches!(err, LocationError::ServiceUnavailable));
    }

    #[tokio::test]
    async fn test_locate_missing_coordinates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "city": "Nowhere"
            })))
            .mount(&server)
            .await;

        let err = geolocator_for(&server).await.current_location().await.unwrap_err();
        assert!(matches!(err, LocationError::Other(_)));
    }
}
