//! City/state to geography resolution.
//!
//! MSA place names look like `"New York-Newark-Jersey City, NY-NJ-PA"`:
//! hyphen-separated principal cities, a comma, then hyphen-separated state
//! codes with an optional trailing annotation such as `"(MSAD)"`. A query
//! matches an MSA when its state is one of the listed codes and its city
//! is one of the principal cities. Matching works on whole tokens and
//! leading whole words, never substrings, so `"york"` does not match
//! `"New York"`.
//!
//! When no MSA matches, the state index is consulted directly.

use std::sync::LazyLock;

use housing_hpi_models::{GeographyLevel, ResolvedGeography};
use regex::Regex;

use crate::index::SeriesIndex;

/// Trailing parenthesized annotation on the state portion, e.g. `"(MSAD)"`.
static ANNOTATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)\s*$").expect("valid regex"));

/// Census place-name suffix, e.g. the `" city"` in `"Detroit city"`.
static CITY_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+city$").expect("valid regex"));

/// Normalizes a city query: trims, turns URL-slug hyphens into spaces,
/// lowercases, and strips a trailing Census `" city"` suffix.
#[must_use]
pub fn normalize_city(city: &str) -> String {
    let spaced = city.trim().replace('-', " ");
    let words: Vec<&str> = spaced.split_whitespace().collect();
    let joined = words.join(" ").to_lowercase();
    CITY_SUFFIX_RE.replace(&joined, "").into_owned()
}

/// Normalizes a state query to an uppercase two-letter code.
#[must_use]
pub fn normalize_state(state: &str) -> String {
    state.trim().to_uppercase()
}

/// Whether the state portion of `msa` lists `state`.
///
/// The state portion is everything after the last comma, minus any
/// trailing parenthesized annotation, split on hyphens.
#[must_use]
pub fn msa_contains_state(msa: &str, state: &str) -> bool {
    let Some((_, suffix)) = msa.rsplit_once(',') else {
        return false;
    };
    let state = normalize_state(state);
    if state.is_empty() {
        return false;
    }

    ANNOTATION_RE
        .replace(suffix, "")
        .split('-')
        .any(|code| code.trim().eq_ignore_ascii_case(&state))
}

/// Whether `city` is one of the principal cities of `msa`.
///
/// A city matches a hyphen-separated token when it equals the whole token
/// (`"warren"` in `"Detroit-Warren-Dearborn"`) or the token's leading
/// whole words (`"jersey"` in `"Jersey City"`). A word later in the token
/// never matches on its own, so `"york"` is not found in `"New York"`.
#[must_use]
pub fn msa_contains_city(msa: &str, city: &str) -> bool {
    let Some((places, _)) = msa.rsplit_once(',') else {
        return false;
    };
    let city = city.trim().to_lowercase();
    let city_words: Vec<&str> = city.split_whitespace().collect();
    if city_words.is_empty() {
        return false;
    }

    places.split('-').any(|token| {
        let token = token.trim().to_lowercase();
        let token_words: Vec<&str> = token.split_whitespace().collect();
        token_words.starts_with(&city_words)
    })
}

/// Resolves a city/state query against the two series indexes.
///
/// Scans MSA keys in index order and takes the first whose state and city
/// both match. Falls back to the state index when no MSA matches or the
/// match has no observations. Returns `None` when neither yields data.
#[must_use]
pub fn resolve<'a>(
    metro: &'a SeriesIndex,
    states: &'a SeriesIndex,
    city: &str,
    state: &str,
) -> Option<ResolvedGeography<'a>> {
    let city = normalize_city(city);
    let state = normalize_state(state);

    if !city.is_empty() {
        let hit = metro
            .iter()
            .find(|(key, _)| msa_contains_state(key, &state) && msa_contains_city(key, &city));

        match hit {
            Some((key, points)) if !points.is_empty() => {
                log::debug!("Resolved {city:?}, {state} to MSA {key:?}");
                return Some(ResolvedGeography {
                    level: GeographyLevel::MetroArea,
                    key: key.as_str(),
                    points: points.as_slice(),
                });
            }
            Some((key, _)) => {
                log::debug!("MSA {key:?} matched {city:?}, {state} but has no observations");
            }
            None => {}
        }
    }

    match states.get_key_value(&state) {
        Some((key, points)) if !points.is_empty() => {
            log::debug!("Resolved {city:?}, {state} to state-level series");
            Some(ResolvedGeography {
                level: GeographyLevel::State,
                key: key.as_str(),
                points: points.as_slice(),
            })
        }
        _ => {
            log::debug!("No HPI series for {city:?}, {state}");
            None
        }
    }
}
