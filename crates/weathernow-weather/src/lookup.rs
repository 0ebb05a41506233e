//! Place search by name.

use std::future::Future;
use std::time::Duration;

use crate::types::{LookupError, Place};

/// Resolves free text to an ordered list of place candidates.
///
/// Implementations return an empty list when nothing matches and reserve
/// errors for transport failures.
pub trait LocationLookup: Send + Sync + 'static {
    fn search(&self, query: &str) -> impl Future<Output = Result<Vec<Place>, LookupError>> + Send;
}

/// Search over a fixed in-memory catalogue of cities
#[derive(Debug, Clone)]
pub struct CatalogLookup {
    places: Vec<Place>,
    latency: Duration,
}

impl Default for CatalogLookup {
    fn default() -> Self {
        Self::new(default_catalog())
    }
}

impl CatalogLookup {
    pub fn new(places: Vec<Place>) -> Self {
        Self {
            places,
            latency: Duration::ZERO,
        }
    }

    /// Delay every response, mimicking a remote geocoder
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn places(&self) -> &[Place] {
        &self.places
    }

    /// Case-insensitive substring match on the place name, catalogue order
    pub fn matches(&self, query: &str) -> Vec<Place> {
        let needle = query.to_lowercase();
        self.places
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }
}

impl LocationLookup for CatalogLookup {
    async fn search(&self, query: &str) -> Result<Vec<Place>, LookupError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let results = self.matches(query);
        tracing::debug!("Catalog lookup '{}' matched {} places", query, results.len());
        Ok(results)
    }
}

/// Cities known to the mock geocoder
pub fn default_catalog() -> Vec<Place> {
    vec![
        Place::new("New York", "US", 40.7128, -74.0060),
        Place::new("London", "GB", 51.5074, -0.1278),
        Place::new("Tokyo", "JP", 35.6762, 139.6503),
        Place::new("Paris", "FR", 48.8566, 2.3522),
        Place::new("Sydney", "AU", -33.8688, 151.2093),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_search_is_case_insensitive_substring() {
        let lookup = CatalogLookup::default();
        let results = lookup.search("lon").await.unwrap();
        assert_eq!(results, vec![Place::new("London", "GB", 51.5074, -0.1278)]);

        let results = lookup.search("YORK").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "New York");
    }

    #[tokio::test]
    async fn test_search_no_match_is_empty() {
        let lookup = CatalogLookup::default();
        assert!(lookup.search("Atlantis").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_keeps_catalog_order() {
        let lookup = CatalogLookup::default();
        // "y" appears in New York, Tokyo and Sydney
        let names: Vec<_> = lookup
            .search("y")
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["New York", "Tokyo", "Sydney"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_is_applied() {
        let lookup = CatalogLookup::default().with_latency(Duration::from_millis(500));
        let started = tokio::time::Instant::now();
        lookup.search("Paris").await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(500));
    }
}
