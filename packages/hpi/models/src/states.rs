//! US state name utilities.
//!
//! Provides the fixed mapping between full state names and two-letter
//! abbreviations for the 50 US states. Jurisdictions outside this table
//! (DC, territories, census divisions) are never indexed at the state
//! level.

/// Full state name and two-letter abbreviation for each of the 50 states.
pub const STATES: &[(&str, &str)] = &[
    ("Alabama", "AL"),
    ("Alaska", "AK"),
    ("Arizona", "AZ"),
    ("Arkansas", "AR"),
    ("California", "CA"),
    ("Colorado", "CO"),
    ("Connecticut", "CT"),
    ("Delaware", "DE"),
    ("Florida", "FL"),
    ("Georgia", "GA"),
    ("Hawaii", "HI"),
    ("Idaho", "ID"),
    ("Illinois", "IL"),
    ("Indiana", "IN"),
    ("Iowa", "IA"),
    ("Kansas", "KS"),
    ("Kentucky", "KY"),
    ("Louisiana", "LA"),
    ("Maine", "ME"),
    ("Maryland", "MD"),
    ("Massachusetts", "MA"),
    ("Michigan", "MI"),
    ("Minnesota", "MN"),
    ("Mississippi", "MS"),
    ("Missouri", "MO"),
    ("Montana", "MT"),
    ("Nebraska", "NE"),
    ("Nevada", "NV"),
    ("New Hampshire", "NH"),
    ("New Jersey", "NJ"),
    ("New Mexico", "NM"),
    ("New York", "NY"),
    ("North Carolina", "NC"),
    ("North Dakota", "ND"),
    ("Ohio", "OH"),
    ("Oklahoma", "OK"),
    ("Oregon", "OR"),
    ("Pennsylvania", "PA"),
    ("Rhode Island", "RI"),
    ("South Carolina", "SC"),
    ("South Dakota", "SD"),
    ("Tennessee", "TN"),
    ("Texas", "TX"),
    ("Utah", "UT"),
    ("Vermont", "VT"),
    ("Virginia", "VA"),
    ("Washington", "WA"),
    ("West Virginia", "WV"),
    ("Wisconsin", "WI"),
    ("Wyoming", "WY"),
];

/// Maps a full state name to its two-letter abbreviation.
///
/// Matching ignores ASCII case and surrounding whitespace. Returns `None`
/// for anything outside the 50-state table.
#[must_use]
pub fn state_abbr(name: &str) -> Option<&'static str> {
    let name = name.trim();
    STATES
        .iter()
        .find(|(full, _)| full.eq_ignore_ascii_case(name))
        .map(|(_, abbr)| *abbr)
}

/// Maps a two-letter abbreviation to the full state name.
///
/// Returns `None` for unrecognized abbreviations.
#[must_use]
pub fn state_name(abbr: &str) -> Option<&'static str> {
    let abbr = abbr.trim();
    STATES
        .iter()
        .find(|(_, code)| code.eq_ignore_ascii_case(abbr))
        .map(|(full, _)| *full)
}

/// Iterates over the abbreviations of every supported state.
pub fn supported_states() -> impl Iterator<Item = &'static str> {
    STATES.iter().map(|(_, abbr)| *abbr)
}
