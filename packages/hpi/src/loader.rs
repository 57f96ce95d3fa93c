//! Dataset loader.
//!
//! Reads the full dataset, parses each row, and sorts accepted rows into
//! two unsorted bags: one keyed by MSA place name and one keyed by state
//! abbreviation. Malformed, untranslatable, and out-of-scope rows are
//! counted and skipped; none of them abort the load.

use std::io::Read;
use std::path::Path;

use housing_hpi_models::states::state_abbr;
use housing_hpi_models::{DataVariant, GeographyLevel, TimeSeriesPoint};
use serde::Serialize;

use crate::HpiError;
use crate::config::DatasetConfig;
use crate::record::{self, RawRecord, RecordError};

/// One accepted row, tagged with its geography key and data variant.
#[derive(Debug, Clone, PartialEq)]
pub struct BagEntry {
    /// MSA place name or two-letter state abbreviation.
    pub key: String,
    /// Variant the row came from.
    pub variant: DataVariant,
    /// The observation itself.
    pub point: TimeSeriesPoint,
}

/// Counters collected while loading a dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadStats {
    /// Data rows read (header excluded).
    pub rows_read: u64,
    /// Rows accepted into the metro bag.
    pub metro_rows: u64,
    /// Rows accepted into the state bag.
    pub state_rows: u64,
    /// Rows rejected as malformed.
    pub malformed: u64,
    /// State-level rows whose place name is not a supported state.
    pub untranslatable_states: u64,
    /// Well-formed rows outside the indexed series.
    pub ignored: u64,
}

/// The two unsorted bags produced by a load.
#[derive(Debug, Clone, Default)]
pub struct LoadedBags {
    /// Rows keyed by MSA place name.
    pub metro: Vec<BagEntry>,
    /// Rows keyed by state abbreviation.
    pub state: Vec<BagEntry>,
    /// Load counters.
    pub stats: LoadStats,
}

/// Where a parsed row belongs.
#[derive(Debug)]
enum Classification {
    Accepted(GeographyLevel, BagEntry),
    Untranslatable,
    Ignored,
    Malformed(RecordError),
}

/// Loads the dataset at `path`.
///
/// # Errors
///
/// Returns [`HpiError::DatasetUnavailable`] if the file is missing or
/// unreadable. Individual bad rows never produce an error.
pub fn load_file(path: &Path, config: &DatasetConfig) -> Result<LoadedBags, HpiError> {
    let file = std::fs::File::open(path).map_err(|source| HpiError::DatasetUnavailable {
        path: path.to_path_buf(),
        source,
    })?;

    log::info!("Loading HPI dataset from {}", path.display());
    Ok(load_reader(std::io::BufReader::new(file), config))
}

/// Loads a dataset already held in memory.
#[must_use]
pub fn load_str(contents: &str, config: &DatasetConfig) -> LoadedBags {
    load_reader(contents.as_bytes(), config)
}

/// Loads a dataset from any reader. The first line is a header and is
/// discarded; blank lines are skipped.
///
/// Each line is one row. The reader splits on every comma and
/// [`record::unquote`] applies the quote toggle, so a quote never spans
/// lines.
#[must_use]
pub fn load_reader<R: Read>(reader: R, config: &DatasetConfig) -> LoadedBags {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let mut bags = LoadedBags::default();

    for result in reader.records() {
        bags.stats.rows_read += 1;

        let (line, parsed) = match result {
            Ok(row) => (
                row.position().map_or(0, csv::Position::line),
                record::parse_fields(&record::unquote(row.iter()), config.min_fields),
            ),
            Err(e) => (
                e.position().map_or(0, csv::Position::line),
                Err(RecordError::from(e)),
            ),
        };

        let raw = match parsed {
            Ok(raw) => raw,
            Err(e) => {
                log::debug!("Skipping malformed row at line {line}: {e}");
                bags.stats.malformed += 1;
                continue;
            }
        };

        match classify(&raw, config) {
            Classification::Accepted(GeographyLevel::MetroArea, entry) => {
                bags.stats.metro_rows += 1;
                bags.metro.push(entry);
            }
            Classification::Accepted(GeographyLevel::State, entry) => {
                bags.stats.state_rows += 1;
                bags.state.push(entry);
            }
            Classification::Untranslatable => {
                log::debug!("Dropping unsupported state {:?}", raw.place_name);
                bags.stats.untranslatable_states += 1;
            }
            Classification::Ignored => bags.stats.ignored += 1,
            Classification::Malformed(e) => {
                log::debug!("Skipping malformed row at line {line}: {e}");
                bags.stats.malformed += 1;
            }
        }
    }

    let stats = &bags.stats;
    log::info!(
        "Read {} HPI rows: {} metro, {} state, {} malformed, {} unsupported states, {} ignored",
        stats.rows_read,
        stats.metro_rows,
        stats.state_rows,
        stats.malformed,
        stats.untranslatable_states,
        stats.ignored,
    );

    bags
}

fn classify(raw: &RawRecord, config: &DatasetConfig) -> Classification {
    if raw.record_type != config.record_type || raw.frequency != config.frequency {
        return Classification::Ignored;
    }

    let variant = config.variant(&raw.variant);
    if !variant.is_indexed() {
        return Classification::Ignored;
    }

    let level = if config.is_metro_level(&raw.level) {
        GeographyLevel::MetroArea
    } else if config.is_state_level(&raw.level) {
        GeographyLevel::State
    } else {
        return Classification::Ignored;
    };

    if !(1..=4).contains(&raw.period) {
        return Classification::Malformed(RecordError::Malformed {
            reason: "quarter outside 1-4",
        });
    }

    let key = match level {
        GeographyLevel::MetroArea => raw.place_name.clone(),
        GeographyLevel::State => match state_abbr(&raw.place_name) {
            Some(abbr) => abbr.to_owned(),
            None => return Classification::Untranslatable,
        },
    };

    Classification::Accepted(
        level,
        BagEntry {
            key,
            variant,
            point: TimeSeriesPoint::new(raw.year, raw.period, raw.index),
        },
    )
}
