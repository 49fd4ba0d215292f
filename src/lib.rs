//! Filtering and aggregation core of an insights analytics dashboard.
//!
//! A [`RecordSource`] delivers flat [`Record`]s. The dashboard keeps one
//! [`FilterCriteria`] active, filters the records with it and derives the
//! chart view models in [`DashboardViews`]. Every filter change recomputes
//! all views from scratch.
//!
//! ```text
//!  RecordSource ──► Dataset ──► filter_records ──► DashboardViews ──► render layer
//!                                   ▲
//!                            FilterCriteria
//! ```

pub mod aggregate;
pub mod config;
pub mod data;
pub mod error;
pub mod state;

pub use aggregate::{AggregateOptions, DashboardViews};
pub use data::filter::{FilterCriteria, filter_records};
pub use data::model::{Dataset, Field, FilterKey, Record};
pub use data::source::{FileSource, RecordSource};
pub use error::SourceError;
pub use state::DashboardState;
