//! Filtering core of the tips dashboard: the dataset store, the per-chart
//! filter/aggregate engine and the UI-independent dashboard state.

pub mod data;
pub mod error;
pub mod state;

pub use error::{DashboardError, Result};
