pub mod app_services;
pub mod dashboard;
pub mod error_mapping;
pub mod search;
pub mod services;
pub mod view;

pub use app_services::{AppDashboard, AppSearch, AppServices};
pub use dashboard::{CurrentLocation, Dashboard, DashboardSettings, DashboardState, DashboardUpdate};
pub use search::{
    LocationSelection, SearchController, SearchSettings, SearchState, SearchUpdate,
};
pub use services::{DashboardError, WeatherServiceMessage};
