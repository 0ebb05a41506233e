//! Dashboard state: current weather, history and device location.
//!
//! Loads are spawned through the weather service and applied when their
//! message is processed. Each kind of request has its own id counter; only
//! the most recent request of a kind may change state.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use weathernow_core::{Config, DefaultLocation};
use weathernow_weather::{
    HistoricalPoint, Location, LocationError, LocationSource, WeatherError, WeatherSnapshot,
    WeatherSource,
};

use crate::search::LocationSelection;
use crate::services::{
    request_locate, request_weather_fetch, request_weather_history, DashboardError, FetchRequest,
    WeatherServiceMessage,
};

pub const DEFAULT_HISTORY_DAYS: u32 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSettings {
    pub default_location: DefaultLocation,
    pub history_days: u32,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            default_location: DefaultLocation::default(),
            history_days: DEFAULT_HISTORY_DAYS,
        }
    }
}

impl From<&Config> for DashboardSettings {
    fn from(config: &Config) -> Self {
        Self {
            default_location: config.weather.default_location.clone(),
            history_days: config.weather.history_days,
        }
    }
}

/// Location the shown weather belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentLocation {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub weather: Option<WeatherSnapshot>,
    pub loading: bool,
    /// Fetch failure, shown with a retry action
    pub error: Option<DashboardError>,
    pub geo_loading: bool,
    /// Geolocation failure, informational only
    pub geo_error: Option<DashboardError>,
    pub current_location: Option<CurrentLocation>,
    pub history: Vec<HistoricalPoint>,
    pub history_loading: bool,
}

/// What applying one service message did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardUpdate {
    WeatherLoaded { request_id: u64 },
    WeatherFailed { request_id: u64 },
    HistoryLoaded { count: usize },
    HistoryFailed,
    Located,
    LocateFailed,
    StaleDiscarded { request_id: u64 },
}

pub struct Dashboard<W: WeatherSource, G: LocationSource> {
    runtime: Handle,
    weather: Arc<W>,
    locator: Arc<G>,
    settings: DashboardSettings,
    state: DashboardState,
    fetch_id: u64,
    history_id: u64,
    locate_id: u64,
    last_request: Option<FetchRequest>,
    /// Stops in-flight requests when cancelled
    shutdown: CancellationToken,
    tx: mpsc::UnboundedSender<WeatherServiceMessage>,
    rx: mpsc::UnboundedReceiver<WeatherServiceMessage>,
}

impl<W: WeatherSource, G: LocationSource> Dashboard<W, G> {
    pub fn new(runtime: Handle, weather: Arc<W>, locator: Arc<G>, settings: DashboardSettings) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            runtime,
            weather,
            locator,
            settings,
            state: DashboardState::default(),
            fetch_id: 0,
            history_id: 0,
            locate_id: 0,
            last_request: None,
            shutdown: CancellationToken::new(),
            tx,
            rx,
        }
    }

    /// Tie in-flight requests to an application-wide shutdown token
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn weather(&self) -> Option<&WeatherSnapshot> {
        self.state.weather.as_ref()
    }

    pub fn current_location(&self) -> Option<&CurrentLocation> {
        self.state.current_location.as_ref()
    }

    pub fn history(&self) -> &[HistoricalPoint] {
        &self.state.history
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    /// Start loading weather for a coordinate pair. Returns the request id.
    ///
    /// Without a `name`, the location is labelled from the snapshot.
    pub fn load_weather(&mut self, lat: f64, lon: f64, name: Option<String>) -> u64 {
        self.fetch_id += 1;
        let request = FetchRequest { lat, lon, name };

        tracing::info!("Loading weather #{} for {:.4}, {:.4}", self.fetch_id, lat, lon);

        self.state.loading = true;
        self.state.error = None;
        self.last_request = Some(request.clone());

        request_weather_fetch(
            &self.tx,
            &self.runtime,
            &self.shutdown,
            Arc::clone(&self.weather),
            self.fetch_id,
            request,
        );
        self.fetch_id
    }

    /// Repeat the last load. Returns false if nothing was ever requested.
    pub fn retry(&mut self) -> bool {
        match self.last_request.clone() {
            Some(request) => {
                self.load_weather(request.lat, request.lon, request.name);
                true
            }
            None => false,
        }
    }

    /// First-visit load of the configured default location.
    ///
    /// Does nothing once weather has been requested or while geolocation runs.
    pub fn load_default(&mut self) -> bool {
        if self.last_request.is_some() || self.state.geo_loading {
            return false;
        }
        let DefaultLocation {
            name,
            latitude,
            longitude,
        } = self.settings.default_location.clone();
        self.load_weather(latitude, longitude, Some(name));
        true
    }

    /// Ask for the device position; weather for it loads when it arrives
    pub fn use_current_location(&mut self) {
        self.locate_id += 1;
        self.state.geo_loading = true;
        self.state.geo_error = None;

        request_locate(
            &self.tx,
            &self.runtime,
            &self.shutdown,
            Arc::clone(&self.locator),
            self.locate_id,
        );
    }

    /// Start loading `days` of history for the current location.
    /// Returns false if no location has loaded yet.
    pub fn load_history(&mut self, days: u32) -> bool {
        let Some(location) = &self.state.current_location else {
            return false;
        };
        let (lat, lon) = (location.lat, location.lon);

        self.history_id += 1;
        self.state.history_loading = true;

        request_weather_history(
            &self.tx,
            &self.runtime,
            &self.shutdown,
            Arc::clone(&self.weather),
            self.history_id,
            lat,
            lon,
            days,
        );
        true
    }

    /// Selection callback target for the search box
    pub fn select_location(&mut self, selection: &LocationSelection) -> u64 {
        self.load_weather(selection.lat, selection.lon, Some(selection.label.clone()))
    }

    /// Wait for the next service message and apply it
    pub async fn process_next(&mut self) -> Option<DashboardUpdate> {
        let msg = self.rx.recv().await?;
        Some(self.apply(msg))
    }

    /// Apply every message already queued, without waiting
    pub fn pump(&mut self) -> Vec<DashboardUpdate> {
        let mut updates = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            updates.push(self.apply(msg));
        }
        updates
    }

    fn apply(&mut self, msg: WeatherServiceMessage) -> DashboardUpdate {
        match msg {
            WeatherServiceMessage::FetchDone {
                request_id,
                request,
                result,
            } => self.on_fetch_done(request_id, request, result),
            WeatherServiceMessage::HistoryDone { request_id, result } => {
                self.on_history_done(request_id, result)
            }
            WeatherServiceMessage::LocateDone { request_id, result } => {
                self.on_locate_done(request_id, result)
            }
        }
    }

    fn on_fetch_done(
        &mut self,
        request_id: u64,
        request: FetchRequest,
        result: Result<WeatherSnapshot, WeatherError>,
    ) -> DashboardUpdate {
        if request_id != self.fetch_id {
            tracing::debug!("Discarding weather #{}, superseded by #{}", request_id, self.fetch_id);
            return DashboardUpdate::StaleDiscarded { request_id };
        }
        self.state.loading = false;

        match result {
            Ok(snapshot) => {
                let name = request
                    .name
                    .unwrap_or_else(|| snapshot.location.display_name());
                tracing::info!("Weather loaded for {}", name);

                self.state.current_location = Some(CurrentLocation {
                    lat: request.lat,
                    lon: request.lon,
                    name,
                });
                self.state.weather = Some(snapshot);
                self.load_history(self.settings.history_days);
                DashboardUpdate::WeatherLoaded { request_id }
            }
            Err(e) => {
                tracing::error!("Failed to fetch weather: {}", e);
                self.state.error = Some(DashboardError::Fetch(e.to_string()));
                DashboardUpdate::WeatherFailed { request_id }
            }
        }
    }

    fn on_history_done(
        &mut self,
        request_id: u64,
        result: Result<Vec<HistoricalPoint>, WeatherError>,
    ) -> DashboardUpdate {
        if request_id != self.history_id {
            return DashboardUpdate::StaleDiscarded { request_id };
        }
        self.state.history_loading = false;

        match result {
            Ok(points) => {
                let count = points.len();
                self.state.history = points;
                DashboardUpdate::HistoryLoaded { count }
            }
            Err(e) => {
                tracing::warn!("Error fetching historical data: {}", e);
                self.state.history.clear();
                DashboardUpdate::HistoryFailed
            }
        }
    }

    fn on_locate_done(
        &mut self,
        request_id: u64,
        result: Result<Location, LocationError>,
    ) -> DashboardUpdate {
        if request_id != self.locate_id {
            return DashboardUpdate::StaleDiscarded { request_id };
        }
        self.state.geo_loading = false;

        match result {
            Ok(location) => {
                self.load_weather(location.latitude, location.longitude, location.display_name());
                DashboardUpdate::Located
            }
            Err(e) => {
                tracing::warn!("Geolocation failed: {}", e);
                self.state.geo_error = Some(DashboardError::from(e));
                DashboardUpdate::LocateFailed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use weathernow_weather::{MockLatency, MockWeatherProvider};

    /// Weather source that fails the first `failures` calls
    struct FlakySource {
        inner: MockWeatherProvider,
        failures: AtomicUsize,
        history_fails: bool,
        requests: Mutex<Vec<(f64, f64)>>,
    }

    impl FlakySource {
        fn new(failures: usize) -> Self {
            Self {
                inner: MockWeatherProvider::new(None),
                failures: AtomicUsize::new(failures),
                history_fails: false,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl WeatherSource for FlakySource {
        async fn current_weather(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot, WeatherError> {
            self.requests.lock().unwrap().push((lat, lon));
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(WeatherError::Unavailable("upstream down".into()));
            }
            self.inner.current_weather(lat, lon).await
        }

        async fn historical(
            &self,
            lat: f64,
            lon: f64,
            days: u32,
        ) -> Result<Vec<HistoricalPoint>, WeatherError> {
            if self.history_fails {
                return Err(WeatherError::Unavailable("no archive".into()));
            }
            self.inner.historical(lat, lon, days).await
        }
    }

    struct FixedLocator(Result<Location, fn() -> LocationError>);

    impl LocationSource for FixedLocator {
        async fn current_location(&self) -> Result<Location, LocationError> {
            match &self.0 {
                Ok(loc) => Ok(loc.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    fn paris() -> FixedLocator {
        FixedLocator(Ok(Location {
            latitude: 48.8566,
            longitude: 2.3522,
            city_name: Some("Paris".into()),
            country_code: Some("FR".into()),
        }))
    }

    fn denied() -> FixedLocator {
        FixedLocator(Err(|| LocationError::PermissionDenied))
    }

    fn dashboard<W: WeatherSource, G: LocationSource>(weather: W, locator: G) -> Dashboard<W, G> {
        Dashboard::new(
            Handle::current(),
            Arc::new(weather),
            Arc::new(locator),
            DashboardSettings::default(),
        )
    }

    #[tokio::test]
    async fn load_default_uses_new_york() {
        let mut dash = dashboard(MockWeatherProvider::new(None), paris());

        assert!(dash.load_default());
        assert!(dash.state().loading);

        let update = dash.process_next().await.unwrap();
        assert_eq!(update, DashboardUpdate::WeatherLoaded { request_id: 1 });
        assert!(!dash.state().loading);
        assert_eq!(
            dash.current_location(),
            Some(&CurrentLocation {
                lat: 40.7128,
                lon: -74.0060,
                name: "New York, US".into()
            })
        );

        // Second visit does nothing
        assert!(!dash.load_default());
    }

    #[tokio::test]
    async fn weather_success_loads_history() {
        let mut dash = dashboard(MockWeatherProvider::new(None), paris());
        dash.load_weather(51.5074, -0.1278, None);

        dash.process_next().await.unwrap();
        assert!(dash.state().history_loading);

        let update = dash.process_next().await.unwrap();
        assert_eq!(update, DashboardUpdate::HistoryLoaded { count: 31 });
        assert_eq!(dash.history().len(), 31);
        assert!(dash.history().windows(2).all(|w| w[0].date < w[1].date));
    }

    #[tokio::test]
    async fn name_defaults_to_snapshot_location() {
        let mut dash = dashboard(MockWeatherProvider::new(None), paris());
        dash.load_weather(10.0, 20.0, None);
        dash.process_next().await.unwrap();

        let location = dash.current_location().unwrap();
        assert_eq!(location.name, "New York, US");
        assert_eq!((location.lat, location.lon), (10.0, 20.0));
    }

    #[tokio::test]
    async fn fetch_failure_sets_retriable_error() {
        let mut dash = dashboard(FlakySource::new(1), paris());
        dash.load_weather(35.6762, 139.6503, Some("Tokyo, JP".into()));

        let update = dash.process_next().await.unwrap();
        assert_eq!(update, DashboardUpdate::WeatherFailed { request_id: 1 });

        let error = dash.state().error.clone().unwrap();
        assert!(error.is_retriable());
        assert_eq!(error.user_message(), "Failed to load weather data. Please try again.");
        assert!(dash.weather().is_none());
        assert!(!dash.state().loading);
    }

    #[tokio::test]
    async fn retry_reuses_last_coordinates() {
        let source = FlakySource::new(1);
        let mut dash = dashboard(source, paris());
        dash.load_weather(35.6762, 139.6503, Some("Tokyo, JP".into()));
        dash.process_next().await.unwrap();

        assert!(dash.retry());
        assert!(dash.state().error.is_none());
        let update = dash.process_next().await.unwrap();
        assert_eq!(update, DashboardUpdate::WeatherLoaded { request_id: 2 });

        assert_eq!(
            *dash.weather.requests.lock().unwrap(),
            vec![(35.6762, 139.6503), (35.6762, 139.6503)]
        );
        assert_eq!(dash.current_location().unwrap().name, "Tokyo, JP");
    }

    #[tokio::test]
    async fn retry_without_request_is_noop() {
        let mut dash = dashboard(MockWeatherProvider::new(None), paris());
        assert!(!dash.retry());
        assert!(!dash.state().loading);
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_fetch_is_discarded() {
        let slow = MockWeatherProvider::new(None).with_latency(MockLatency {
            current: Duration::from_millis(1000),
            historical: Duration::from_secs(5),
        });
        let mut dash = dashboard(slow, paris());

        dash.load_weather(40.7128, -74.0060, Some("New York, US".into()));
        dash.load_weather(48.8566, 2.3522, Some("Paris, FR".into()));

        let first = dash.process_next().await.unwrap();
        let second = dash.process_next().await.unwrap();
        let mut updates = vec![first, second];
        updates.sort_by_key(|u| matches!(u, DashboardUpdate::StaleDiscarded { .. }));

        assert_eq!(
            updates,
            vec![
                DashboardUpdate::WeatherLoaded { request_id: 2 },
                DashboardUpdate::StaleDiscarded { request_id: 1 },
            ]
        );
        assert_eq!(dash.current_location().unwrap().name, "Paris, FR");
    }

    #[tokio::test]
    async fn history_failure_leaves_empty_series() {
        let mut source = FlakySource::new(0);
        source.history_fails = true;
        let mut dash = dashboard(source, paris());

        assert!(!dash.load_history(30));

        dash.load_weather(40.7128, -74.0060, None);
        dash.process_next().await.unwrap();
        let update = dash.process_next().await.unwrap();

        assert_eq!(update, DashboardUpdate::HistoryFailed);
        assert!(dash.history().is_empty());
        assert!(dash.state().error.is_none());
    }

    #[tokio::test]
    async fn current_location_loads_weather_with_city_label() {
        let mut dash = dashboard(MockWeatherProvider::new(None), paris());
        dash.use_current_location();
        assert!(dash.state().geo_loading);
        assert!(!dash.load_default());

        assert_eq!(dash.process_next().await.unwrap(), DashboardUpdate::Located);
        assert!(!dash.state().geo_loading);
        assert!(dash.state().loading);

        dash.process_next().await.unwrap();
        let location = dash.current_location().unwrap();
        assert_eq!(location.name, "Paris, FR");
        assert_eq!((location.lat, location.lon), (48.8566, 2.3522));
    }

    #[tokio::test]
    async fn geolocation_failure_is_not_retriable() {
        let mut dash = dashboard(MockWeatherProvider::new(None), denied());
        dash.use_current_location();

        assert_eq!(dash.process_next().await.unwrap(), DashboardUpdate::LocateFailed);
        let geo_error = dash.state().geo_error.clone().unwrap();
        assert_eq!(geo_error, DashboardError::LocationDenied);
        assert!(!geo_error.is_retriable());
        assert!(dash.state().error.is_none());
        assert!(!dash.retry());
    }

    #[tokio::test]
    async fn select_location_uses_label() {
        let mut dash = dashboard(MockWeatherProvider::new(None), paris());
        dash.select_location(&LocationSelection {
            lat: -33.8688,
            lon: 151.2093,
            label: "Sydney, AU".into(),
        });
        dash.process_next().await.unwrap();

        assert_eq!(dash.current_location().unwrap().name, "Sydney, AU");
    }

    #[tokio::test]
    async fn invalid_coordinates_fail_fetch() {
        let mut dash = dashboard(MockWeatherProvider::new(None), paris());
        dash.load_weather(120.0, 0.0, None);

        let update = dash.process_next().await.unwrap();
        assert_eq!(update, DashboardUpdate::WeatherFailed { request_id: 1 });
        assert!(matches!(dash.state().error, Some(DashboardError::Fetch(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_drops_in_flight_fetch() {
        let slow = MockWeatherProvider::new(None).with_latency(MockLatency {
            current: Duration::from_millis(1000),
            historical: Duration::ZERO,
        });
        let shutdown = CancellationToken::new();
        let mut dash = dashboard(slow, paris()).with_shutdown(shutdown.clone());

        dash.load_weather(40.7128, -74.0060, None);
        tokio::time::sleep(Duration::from_millis(500)).await;
        shutdown.cancel();
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(dash.pump().is_empty());
        assert!(dash.weather().is_none());
    }
}
