//! Presentation layer for twmap
//!
//! Serves the forecast dashboard: a refresh control, the temperature map,
//! and the table of stored regions.

pub mod dashboard;
pub mod pages;
pub mod routes;

pub use dashboard::{Dashboard, DashboardView, RefreshOutcome};
pub use pages::Notice;
pub use routes::{routes, serve};
