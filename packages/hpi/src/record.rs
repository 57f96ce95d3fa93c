//! Dataset row parser.
//!
//! Splits one delimited line into fields and converts the positional
//! columns into a [`RawRecord`]. Numeric columns are parsed strictly: a
//! value that fails to parse or is not finite rejects the whole row
//! instead of defaulting to zero.
//!
//! A double quote anywhere in a line switches quoting on or off and is
//! never part of the field value. `ab"c,d"e` is the single field `abc,de`,
//! and `"a""b"` is `ab`.

use thiserror::Error;

/// Number of positional columns the parser reads. A configured minimum
/// field count below this is raised to it.
pub const COLUMN_COUNT: usize = 10;

/// Accepted observation years.
pub const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1..=9999;

const COL_RECORD_TYPE: usize = 0;
const COL_VARIANT: usize = 1;
const COL_FREQUENCY: usize = 2;
const COL_LEVEL: usize = 3;
const COL_PLACE_NAME: usize = 4;
// Column 5 is the place id, which is not used.
const COL_YEAR: usize = 6;
const COL_PERIOD: usize = 7;
const COL_INDEX_NSA: usize = 8;
const COL_INDEX_SA: usize = 9;

/// Reasons a row is rejected as malformed.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Fewer fields than the configured minimum after splitting.
    #[error("expected at least {expected} fields, found {found}")]
    TooFewFields {
        /// Minimum field count in effect.
        expected: usize,
        /// Number of fields actually present.
        found: usize,
    },

    /// A numeric column failed to parse or was not finite.
    #[error("invalid {column} value {value:?}")]
    InvalidNumber {
        /// Column name.
        column: &'static str,
        /// Raw field text.
        value: String,
    },

    /// Neither index column held a usable value.
    #[error("no finite index value (nsa={nsa:?}, sa={sa:?})")]
    MissingIndex {
        /// Raw not-seasonally-adjusted field.
        nsa: String,
        /// Raw seasonally-adjusted field.
        sa: String,
    },

    /// The row parsed but its values are out of range.
    #[error("{reason}")]
    Malformed {
        /// What was wrong with the row.
        reason: &'static str,
    },

    /// The line could not be tokenized.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// A parsed data row, before geography classification.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// Record-type marker (e.g. `"traditional"`).
    pub record_type: String,
    /// Data-variant marker (e.g. `"purchase-only"`).
    pub variant: String,
    /// Frequency marker (e.g. `"quarterly"`).
    pub frequency: String,
    /// Geography-level marker (e.g. `"MSA"`, `"State"`).
    pub level: String,
    /// Place name as written in the dataset.
    pub place_name: String,
    /// Observation year.
    pub year: i32,
    /// Observation period within the year.
    pub period: u8,
    /// Seasonally adjusted index if usable, otherwise not seasonally adjusted.
    pub index: f64,
}

/// Splits one line into fields.
///
/// Double quotes toggle quoting and are not emitted; a comma inside an
/// open quote is literal content.
///
/// # Errors
///
/// Returns [`RecordError::Csv`] if the line cannot be tokenized (e.g.
/// invalid UTF-8).
pub fn split_line(line: &str) -> Result<Vec<String>, RecordError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(line.as_bytes());

    let mut record = csv::StringRecord::new();
    if !reader.read_record(&mut record)? {
        return Ok(Vec::new());
    }

    Ok(unquote(record.iter()))
}

/// Rejoins comma-split pieces of one line, applying the quote toggle.
///
/// `pieces` are the raw text between every comma, quotes included, as the
/// `csv` reader yields them with quoting disabled. Pieces separated by a
/// comma inside an open quote are joined back with that comma.
pub fn unquote<'a, I>(pieces: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for (i, piece) in pieces.into_iter().enumerate() {
        if i > 0 {
            if quoted {
                current.push(',');
            } else {
                fields.push(std::mem::take(&mut current));
            }
        }
        for c in piece.chars() {
            if c == '"' {
                quoted = !quoted;
            } else {
                current.push(c);
            }
        }
    }

    fields.push(current);
    fields
}

/// Parses one line into a [`RawRecord`], requiring at least `min_fields`
/// fields.
///
/// # Errors
///
/// Returns a [`RecordError`] if the line is malformed.
pub fn parse_line(line: &str, min_fields: usize) -> Result<RawRecord, RecordError> {
    let fields = split_line(line)?;
    parse_fields(&fields, min_fields)
}

/// Converts already-split fields into a [`RawRecord`].
///
/// # Errors
///
/// Returns a [`RecordError`] if there are too few fields, a numeric
/// column is unusable, or the year is outside [`YEAR_RANGE`].
pub fn parse_fields<S: AsRef<str>>(
    fields: &[S],
    min_fields: usize,
) -> Result<RawRecord, RecordError> {
    let expected = min_fields.max(COLUMN_COUNT);
    if fields.len() < expected {
        return Err(RecordError::TooFewFields {
            expected,
            found: fields.len(),
        });
    }

    let field = |i: usize| fields[i].as_ref().trim();

    let year = parse_integer(field(COL_YEAR), "year")?;
    let year = i32::try_from(year)
        .ok()
        .filter(|y| YEAR_RANGE.contains(y))
        .ok_or_else(|| RecordError::InvalidNumber {
            column: "year",
            value: field(COL_YEAR).to_owned(),
        })?;
    let period = parse_integer(field(COL_PERIOD), "period")?;
    let period = u8::try_from(period).map_err(|_| RecordError::InvalidNumber {
        column: "period",
        value: field(COL_PERIOD).to_owned(),
    })?;

    let index = parse_finite(field(COL_INDEX_SA))
        .or_else(|| parse_finite(field(COL_INDEX_NSA)))
        .ok_or_else(|| RecordError::MissingIndex {
            nsa: field(COL_INDEX_NSA).to_owned(),
            sa: field(COL_INDEX_SA).to_owned(),
        })?;

    Ok(RawRecord {
        record_type: field(COL_RECORD_TYPE).to_owned(),
        variant: field(COL_VARIANT).to_owned(),
        frequency: field(COL_FREQUENCY).to_owned(),
        level: field(COL_LEVEL).to_owned(),
        place_name: field(COL_PLACE_NAME).to_owned(),
        year,
        period,
        index,
    })
}

/// Parses a finite number, treating empty text as absent.
fn parse_finite(value: &str) -> Option<f64> {
    if value.is_empty() {
        return None;
    }
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a whole number, accepting integral float spellings like `"2024.0"`.
#[allow(clippy::cast_possible_truncation)]
fn parse_integer(value: &str, column: &'static str) -> Result<i64, RecordError> {
    let invalid = || RecordError::InvalidNumber {
        column,
        value: value.to_owned(),
    };

    if let Ok(n) = value.parse::<i64>() {
        return Ok(n);
    }

    let n = parse_finite(value).ok_or_else(invalid)?;
    if n.fract() != 0.0 || n.abs() > f64::from(i32::MAX) {
        return Err(invalid());
    }
    Ok(n as i64)
}
