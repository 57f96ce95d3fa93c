#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Housing price index time-series and price-change types.
//!
//! These types describe the frozen HPI cache contents and the metrics
//! derived from it. This crate has no I/O and no heavyweight
//! dependencies; parsing and indexing live in `housing_hpi`.

pub mod states;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Which of the two cache indexes a geography belongs to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum GeographyLevel {
    /// Metropolitan statistical area (or division), keyed by its raw place name.
    MetroArea,
    /// US state, keyed by its two-letter abbreviation.
    State,
}

/// Data-collection methodology of an index row.
///
/// `PurchaseOnly` is the preferred tier whenever a geography has both.
/// `Other` covers every remaining flavor and is never indexed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DataVariant {
    /// Purchase-only index (sales transactions only).
    PurchaseOnly,
    /// All-transactions index (sales plus refinance appraisals).
    AllTransactions,
    /// Any other flavor present in the dataset.
    Other,
}

impl DataVariant {
    /// Whether rows of this variant may enter the cache at all.
    #[must_use]
    pub const fn is_indexed(self) -> bool {
        matches!(self, Self::PurchaseOnly | Self::AllTransactions)
    }
}

/// A single quarterly index observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPoint {
    /// Calendar year of the observation.
    pub year: i32,
    /// Quarter within the year (1-4).
    pub period: u8,
    /// Index value for the quarter.
    pub index: f64,
}

impl TimeSeriesPoint {
    /// Creates a new observation.
    #[must_use]
    pub const fn new(year: i32, period: u8, index: f64) -> Self {
        Self {
            year,
            period,
            index,
        }
    }

    /// The `(year, period)` pair that identifies this observation in time.
    #[must_use]
    pub const fn period_key(&self) -> (i32, u8) {
        (self.year, self.period)
    }

    /// Orders two observations newest first, ignoring the index value.
    ///
    /// Suitable for a stable sort: observations for the same quarter
    /// compare equal and keep their relative order.
    #[must_use]
    pub fn newest_first(a: &Self, b: &Self) -> Ordering {
        b.period_key().cmp(&a.period_key())
    }

    /// Formats the observation's quarter as `"<year> Q<period>"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} Q{}", self.year, self.period)
    }
}

/// A geography matched by the resolver, borrowed from the frozen cache.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedGeography<'a> {
    /// Which index the match came from.
    pub level: GeographyLevel,
    /// MSA place name or two-letter state abbreviation.
    pub key: &'a str,
    /// Observations for the geography, newest first.
    pub points: &'a [TimeSeriesPoint],
}

/// Point-in-time price changes for a resolved geography.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceChangeMetrics {
    /// Change versus the same quarter one year earlier (0 if unavailable).
    pub yoy_change: f64,
    /// Change versus the previous quarter (0 if unavailable).
    pub qoq_change: f64,
    /// Change versus the same quarter five years earlier.
    ///
    /// `None` when the comparator quarter is missing, which is distinct
    /// from a flat market.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub five_year_change: Option<f64>,
    /// Freshness label of the latest observation (e.g. `"2024 Q3"`).
    pub as_of: String,
    /// Index the metrics were computed from.
    pub level: GeographyLevel,
    /// MSA place name or state abbreviation.
    pub geography_name: String,
}
