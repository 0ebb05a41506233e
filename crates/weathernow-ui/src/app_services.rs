//! Shared application services.
//!
//! Holds the tokio runtime and the data sources every controller is built
//! from. Created once at startup; controllers get a runtime handle and
//! `Arc`s to the sources.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use weathernow_core::Config;
use weathernow_weather::{CatalogLookup, Geolocator, MockLatency, MockWeatherProvider};

use crate::dashboard::{Dashboard, DashboardSettings};
use crate::search::{LocationSelection, SearchController, SearchSettings};

/// Catalogue search delay when latency simulation is on
const LOOKUP_LATENCY: Duration = Duration::from_millis(500);

pub type AppDashboard = Dashboard<MockWeatherProvider, Geolocator>;
pub type AppSearch = SearchController<CatalogLookup>;

pub struct AppServices {
    /// Tokio runtime for timers and fetches
    runtime: tokio::runtime::Runtime,
    config: Arc<Config>,
    weather: Arc<MockWeatherProvider>,
    lookup: Arc<CatalogLookup>,
    locator: Arc<Geolocator>,
    /// Cancelled on shutdown
    shutdown: CancellationToken,
}

impl AppServices {
    /// # Errors
    /// Fails if the runtime or the geolocation client cannot be created.
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("weathernow-tokio")
            .build()
            .context("Failed to create tokio runtime")?;

        let api_key = config
            .weather
            .has_api_key()
            .then(|| config.weather.api_key.clone());

        let (weather_latency, lookup_latency) = if config.weather.simulate_latency {
            (MockLatency::realistic(), LOOKUP_LATENCY)
        } else {
            (MockLatency::default(), Duration::ZERO)
        };

        let weather = MockWeatherProvider::new(api_key).with_latency(weather_latency);
        let lookup = CatalogLookup::default().with_latency(lookup_latency);
        let locator = Geolocator::new(
            config.geolocation.endpoint.clone(),
            Duration::from_secs(config.geolocation.timeout_secs),
        )?;

        tracing::info!(
            "Services ready (simulated latency: {}, geolocation: {})",
            config.weather.simulate_latency,
            locator.endpoint()
        );

        Ok(Self {
            runtime,
            config,
            weather: Arc::new(weather),
            lookup: Arc::new(lookup),
            locator: Arc::new(locator),
            shutdown: CancellationToken::new(),
        })
    }

    pub fn runtime(&self) -> &tokio::runtime::Runtime {
        &self.runtime
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dashboard(&self) -> AppDashboard {
        Dashboard::new(
            self.runtime.handle().clone(),
            Arc::clone(&self.weather),
            Arc::clone(&self.locator),
            DashboardSettings::from(self.config.as_ref()),
        )
        .with_shutdown(self.shutdown.clone())
    }

    pub fn search(
        &self,
        on_select: impl FnMut(LocationSelection) + Send + 'static,
    ) -> AppSearch {
        SearchController::new(
            self.runtime.handle().clone(),
            Arc::clone(&self.lookup),
            SearchSettings::from(&self.config.search),
            on_select,
        )
        .with_shutdown(self.shutdown.clone())
    }

    /// Cancel every timer and request started by controllers built here
    pub fn shutdown(&self) {
        tracing::info!("Shutting down services");
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn services() -> AppServices {
        AppServices::new(Arc::new(Config::default())).unwrap()
    }

    #[test]
    fn dashboard_uses_configured_default() {
        let services = services();
        let dashboard = services.dashboard();
        assert_eq!(dashboard.settings().default_location.name, "New York, US");
        assert_eq!(dashboard.settings().history_days, 30);
    }

    #[test]
    fn search_uses_configured_debounce() {
        let mut config = Config::default();
        config.search.debounce_ms = 120;
        let services = AppServices::new(Arc::new(config)).unwrap();

        let search = services.search(|_| {});
        assert_eq!(search.settings().debounce, Duration::from_millis(120));
    }

    #[test]
    fn search_selection_reaches_callback() {
        let services = services();
        let selected = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&selected);

        let mut search = services.search(move |sel| *sink.lock().unwrap() = Some(sel));
        search.on_input("Paris");
        let update = services.runtime().block_on(async {
            search.process_next().await;
            search.process_next().await
        });

        assert!(matches!(update, Some(crate::search::SearchUpdate::ResultsApplied { count: 1, .. })));
        assert!(search.select_index(0));
        assert_eq!(selected.lock().unwrap().as_ref().unwrap().label, "Paris, FR");
    }

    #[test]
    fn shutdown_stops_controller_work() {
        let services = services();
        let mut dashboard = services.dashboard();
        let mut search = services.search(|_| {});

        services.shutdown();
        dashboard.load_weather(40.7128, -74.0060, None);
        search.on_input("Paris");

        services.runtime().block_on(async {
            tokio::time::sleep(Duration::from_millis(500)).await;
        });

        assert!(dashboard.pump().is_empty());
        assert!(search.pump().is_empty());
        assert!(dashboard.state().loading);
    }
}
