//! Series index construction.

use std::collections::BTreeMap;

use housing_hpi_models::TimeSeriesPoint;

use crate::loader::BagEntry;

/// Geography key to its observations, newest first.
pub type SeriesIndex = BTreeMap<String, Vec<TimeSeriesPoint>>;

/// Groups prioritized rows by key and sorts each series newest first.
///
/// The sort is stable, so rows for the same quarter keep the order in
/// which they were read.
#[must_use]
pub fn build_index(entries: Vec<BagEntry>) -> SeriesIndex {
    let mut index = SeriesIndex::new();

    for entry in entries {
        index.entry(entry.key).or_default().push(entry.point);
    }

    for points in index.values_mut() {
        points.sort_by(TimeSeriesPoint::newest_first);
    }

    index
}
