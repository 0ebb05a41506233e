//! Location search box: debounced lookups with a staleness guard.
//!
//! Keystrokes arm a debounce timer; when it fires, one lookup is spawned on
//! the runtime. Timers and lookups never touch controller state directly.
//! They report back on a channel and the owner applies the messages with
//! `process_next()` or `pump()`.
//!
//! Every issued lookup carries a request id. Clearing, selecting, or
//! shortening the query below the minimum bumps the id, so a completion is
//! applied only while its id is current and its query still matches the
//! text in the box. Superseded lookups are ignored, never aborted; only the
//! shutdown token stops a lookup that has already been issued.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::AbortOnDropHandle;

use weathernow_core::SearchConfig;
use weathernow_weather::{LocationLookup, LookupError, Place};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);
pub const DEFAULT_MIN_QUERY_LEN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    pub debounce: Duration,
    /// Minimum query length in characters
    pub min_query_len: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            min_query_len: DEFAULT_MIN_QUERY_LEN,
        }
    }
}

impl From<&SearchConfig> for SearchSettings {
    fn from(config: &SearchConfig) -> Self {
        Self {
            debounce: Duration::from_millis(config.debounce_ms),
            min_query_len: config.min_query_len,
        }
    }
}

/// Observable state of the search box
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<Place>,
    /// A lookup for the current query is in flight
    pub pending: bool,
    /// The result list is shown
    pub visible: bool,
}

/// Payload handed to the selection callback
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSelection {
    pub lat: f64,
    pub lon: f64,
    /// `"name, country"`
    pub label: String,
}

impl From<&Place> for LocationSelection {
    fn from(place: &Place) -> Self {
        Self {
            lat: place.lat,
            lon: place.lon,
            label: place.display_name(),
        }
    }
}

/// Messages sent from timer and lookup tasks back to the controller
#[derive(Debug)]
pub enum SearchServiceMessage {
    /// The debounce timer armed as `arm_id` ran out
    DebounceElapsed { arm_id: u64, text: String },
    /// A lookup finished
    LookupDone {
        request_id: u64,
        query: String,
        result: Result<Vec<Place>, LookupError>,
    },
}

/// What applying one message did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchUpdate {
    LookupIssued { request_id: u64, query: String },
    ResultsApplied { request_id: u64, count: usize },
    LookupFailed { request_id: u64 },
    StaleDiscarded { request_id: u64 },
    TimerSuperseded,
}

type SelectCallback = Box<dyn FnMut(LocationSelection) + Send>;

pub struct SearchController<L: LocationLookup> {
    runtime: Handle,
    lookup: Arc<L>,
    settings: SearchSettings,
    state: SearchState,
    on_select: SelectCallback,
    timer: Option<AbortOnDropHandle<()>>,
    arm_id: u64,
    request_id: u64,
    shutdown: CancellationToken,
    tx: mpsc::UnboundedSender<SearchServiceMessage>,
    rx: mpsc::UnboundedReceiver<SearchServiceMessage>,
}

impl<L: LocationLookup> SearchController<L> {
    /// `on_select` is called with the chosen place's coordinates and label.
    pub fn new(
        runtime: Handle,
        lookup: Arc<L>,
        settings: SearchSettings,
        on_select: impl FnMut(LocationSelection) + Send + 'static,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            runtime,
            lookup,
            settings,
            state: SearchState::default(),
            on_select: Box::new(on_select),
            timer: None,
            arm_id: 0,
            request_id: 0,
            shutdown: CancellationToken::new(),
            tx,
            rx,
        }
    }

    /// Stop timers and lookups when `shutdown` is cancelled
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn query(&self) -> &str {
        &self.state.query
    }

    pub fn results(&self) -> &[Place] {
        &self.state.results
    }

    pub fn is_pending(&self) -> bool {
        self.state.pending
    }

    pub fn is_visible(&self) -> bool {
        self.state.visible
    }

    pub fn settings(&self) -> SearchSettings {
        self.settings
    }

    /// Record a new keystroke buffer.
    ///
    /// Short queries clear the list immediately. Anything else (re)arms the
    /// debounce timer; the previous timer, if still armed, is cancelled.
    pub fn on_input(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.state.query.clone_from(&text);
        self.cancel_timer();

        if text.chars().count() < self.settings.min_query_len {
            self.invalidate_lookups();
            self.state.results.clear();
            self.state.visible = false;
            return;
        }

        let arm_id = self.arm_id;
        let delay = self.settings.debounce;
        let tx = self.tx.clone();
        let shutdown = self.shutdown.clone();
        let handle = self.runtime.spawn(async move {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let _ = tx.send(SearchServiceMessage::DebounceElapsed { arm_id, text });
                }
            }
        });
        self.timer = Some(AbortOnDropHandle::new(handle));
    }

    /// Choose a result: notify the owner, show the label in the box, hide the list.
    pub fn select_result(&mut self, place: &Place) {
        let selection = LocationSelection::from(place);
        tracing::info!(
            "Location selected: {} ({}, {})",
            selection.label,
            selection.lat,
            selection.lon
        );

        self.cancel_timer();
        self.invalidate_lookups();
        self.state.query.clone_from(&selection.label);
        self.state.visible = false;
        (self.on_select)(selection);
    }

    /// Select the result at `index` in the current list. Returns false if out of range.
    pub fn select_index(&mut self, index: usize) -> bool {
        match self.state.results.get(index).cloned() {
            Some(place) => {
                self.select_result(&place);
                true
            }
            None => false,
        }
    }

    /// Reset the box. An in-flight lookup keeps running but its result is dropped.
    pub fn clear(&mut self) {
        self.cancel_timer();
        self.invalidate_lookups();
        self.state.query.clear();
        self.state.results.clear();
        self.state.visible = false;
    }

    /// Hide the list after an interaction outside the search box
    pub fn dismiss(&mut self) {
        self.state.visible = false;
    }

    /// Re-show the list when the box regains focus
    pub fn focus(&mut self) {
        if !self.state.results.is_empty() {
            self.state.visible = true;
        }
    }

    /// Wait for the next timer or lookup message and apply it
    pub async fn process_next(&mut self) -> Option<SearchUpdate> {
        let msg = self.rx.recv().await?;
        Some(self.apply(msg))
    }

    /// Apply every message already queued, without waiting
    pub fn pump(&mut self) -> Vec<SearchUpdate> {
        let mut updates = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            updates.push(self.apply(msg));
        }
        updates
    }

    fn apply(&mut self, msg: SearchServiceMessage) -> SearchUpdate {
        match msg {
            SearchServiceMessage::DebounceElapsed { arm_id, text } => {
                if arm_id != self.arm_id {
                    return SearchUpdate::TimerSuperseded;
                }
                self.timer = None;
                self.issue_lookup(text)
            }
            SearchServiceMessage::LookupDone {
                request_id,
                query,
                result,
            } => self.complete_lookup(request_id, query, result),
        }
    }

    fn issue_lookup(&mut self, query: String) -> SearchUpdate {
        self.request_id += 1;
        let request_id = self.request_id;
        self.state.pending = true;

        tracing::debug!("Issuing location lookup #{} for '{}'", request_id, query);

        let lookup = Arc::clone(&self.lookup);
        let tx = self.tx.clone();
        let issued = query.clone();
        let shutdown = self.shutdown.clone();
        self.runtime.spawn(async move {
            let result = tokio::select! {
                biased;
                _ = shutdown.cancelled() => return,
                result = lookup.search(&issued) => result,
            };
            let _ = tx.send(SearchServiceMessage::LookupDone {
                request_id,
                query: issued,
                result,
            });
        });

        SearchUpdate::LookupIssued { request_id, query }
    }

    fn complete_lookup(
        &mut self,
        request_id: u64,
        query: String,
        result: Result<Vec<Place>, LookupError>,
    ) -> SearchUpdate {
        if request_id != self.request_id {
            tracing::debug!(
                "Discarding lookup #{} for '{}', superseded by #{}",
                request_id,
                query,
                self.request_id
            );
            return SearchUpdate::StaleDiscarded { request_id };
        }

        self.state.pending = false;

        if query != self.state.query {
            tracing::debug!(
                "Discarding lookup #{} for '{}', query is now '{}'",
                request_id,
                query,
                self.state.query
            );
            return SearchUpdate::StaleDiscarded { request_id };
        }

        match result {
            Ok(places) => {
                let count = places.len();
                self.state.visible = count > 0;
                self.state.results = places;
                SearchUpdate::ResultsApplied { request_id, count }
            }
            Err(e) => {
                tracing::warn!("Location lookup for '{}' failed: {}", query, e);
                self.state.results.clear();
                self.state.visible = false;
                SearchUpdate::LookupFailed { request_id }
            }
        }
    }

    fn cancel_timer(&mut self) {
        self.arm_id += 1;
        // Dropping the handle aborts the timer task
        self.timer = None;
    }

    fn invalidate_lookups(&mut self) {
        self.request_id += 1;
        self.state.pending = false;
    }
}
