//! Forecast data for twmap
//!
//! Fetches the CWA 36-hour county forecast, keeps the latest snapshot in
//! SQLite, and renders it as a temperature map and a table.

pub mod error_mapping;
pub mod map;
pub mod provider;
pub mod regions;
pub mod store;
pub mod table;
pub mod types;

pub use map::{band, render, MapArtifact, RegionMarker, TemperatureBand};
pub use provider::ForecastProvider;
pub use regions::{coordinate_for, RegionCoordinate, REGION_COORDINATES};
pub use store::ForecastStore;
pub use table::{tabulate, TableRow};
pub use types::*;
