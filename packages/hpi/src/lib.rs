#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory housing price index cache with metro/state resolution.
//!
//! Loads a flat HPI time-series dataset once, keeps the purchase-only
//! series wherever a geography has one, and freezes two indexes: one keyed
//! by MSA place name and one keyed by state abbreviation. Queries map a
//! city/state pair to the best matching MSA (falling back to the state)
//! and derive quarter-over-quarter, year-over-year, and five-year price
//! changes from its series.
//!
//! # Usage
//!
//! ```rust,no_run
//! use housing_hpi::{DatasetConfig, HpiCache, paths};
//!
//! # fn example() -> Result<(), housing_hpi::HpiError> {
//! let config = DatasetConfig::embedded()?;
//! let cache = HpiCache::load(&paths::dataset_path(), &config);
//! if let Some(metrics) = cache.price_changes("Warren", "MI")? {
//!     println!("{} YoY {:+.2}%", metrics.as_of, metrics.yoy_change * 100.0);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod index;
pub mod loader;
pub mod metrics;
pub mod paths;
pub mod prioritize;
pub mod record;
pub mod resolve;

use std::path::PathBuf;

pub use cache::{CacheHandle, HpiCache, global};
pub use config::DatasetConfig;
pub use housing_hpi_models::{
    DataVariant, GeographyLevel, PriceChangeMetrics, ResolvedGeography, TimeSeriesPoint,
};
pub use loader::LoadStats;

/// Errors from HPI cache operations.
#[derive(Debug, thiserror::Error)]
pub enum HpiError {
    /// The dataset file is missing or unreadable.
    #[error("HPI dataset unavailable at {}: {source}", path.display())]
    DatasetUnavailable {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Dataset marker configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A query arrived before any cache was installed.
    #[error("HPI cache queried before it was built")]
    CacheNotInitialized,

    /// Metrics were requested for a series with no observations.
    #[error("Cannot compute price changes from an empty series")]
    EmptySeries,
}
