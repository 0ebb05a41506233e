//! Weather data for WeatherNow
//!
//! Data model, condition glyphs, a mock weather provider, place search and
//! IP-based device location.

pub mod icons;
pub mod location;
pub mod lookup;
pub mod provider;
pub mod retry;
pub mod types;

pub use icons::{Glyph, MetricGlyph};
pub use location::{Geolocator, LocationSource};
pub use lookup::{CatalogLookup, LocationLookup};
pub use provider::{MockLatency, MockWeatherProvider, WeatherSource};
pub use types::*;
