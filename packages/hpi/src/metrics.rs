//! Price-change metrics over a newest-first series.
//!
//! The first observation is the latest. Each change compares it against a
//! fixed lookback quarter: one quarter earlier, the same quarter one year
//! earlier, and the same quarter five years earlier. Quarter-over-quarter
//! and year-over-year fall back to `0.0` when the comparator is missing;
//! the five-year change is `None` instead, so a missing comparator is
//! never mistaken for a flat market.

use housing_hpi_models::{GeographyLevel, PriceChangeMetrics, ResolvedGeography, TimeSeriesPoint};

use crate::HpiError;

/// Computes price-change metrics for a resolved geography.
///
/// # Errors
///
/// Returns [`HpiError::EmptySeries`] if the geography has no observations.
pub fn price_changes(geo: &ResolvedGeography<'_>) -> Result<PriceChangeMetrics, HpiError> {
    compute_metrics(geo.level, geo.key, geo.points)
}

/// Computes price-change metrics from a series sorted newest first.
///
/// # Errors
///
/// Returns [`HpiError::EmptySeries`] if `points` is empty.
pub fn compute_metrics(
    level: GeographyLevel,
    geography_name: &str,
    points: &[TimeSeriesPoint],
) -> Result<PriceChangeMetrics, HpiError> {
    let latest = points.first().ok_or(HpiError::EmptySeries)?;

    let change_from = |key: Option<(i32, u8)>| {
        let key = key?;
        points
            .iter()
            .find(|p| p.period_key() == key)
            .and_then(|prior| ratio(latest.index, prior.index))
    };
    let years_back = |years: i32| {
        latest
            .year
            .checked_sub(years)
            .map(|year| (year, latest.period))
    };

    Ok(PriceChangeMetrics {
        yoy_change: change_from(years_back(1)).unwrap_or(0.0),
        qoq_change: change_from(previous_quarter(latest.year, latest.period)).unwrap_or(0.0),
        five_year_change: change_from(years_back(5)),
        as_of: latest.label(),
        level,
        geography_name: geography_name.to_owned(),
    })
}

/// The quarter immediately before `(year, period)`, or `None` if the year
/// would underflow.
#[must_use]
pub const fn previous_quarter(year: i32, period: u8) -> Option<(i32, u8)> {
    if period > 1 {
        return Some((year, period - 1));
    }
    match year.checked_sub(1) {
        Some(year) => Some((year, 4)),
        None => None,
    }
}

/// Relative change from `prior` to `latest`, rounded to four decimals.
///
/// `None` if the ratio is not finite (a zero prior index).
fn ratio(latest: f64, prior: f64) -> Option<f64> {
    let change = (latest - prior) / prior;
    change.is_finite().then(|| round4(change))
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn sample() -> Vec<TimeSeriesPoint> {
        vec![
            TimeSeriesPoint::new(2024, 3, 300.0),
            TimeSeriesPoint::new(2024, 2, 295.0),
            TimeSeriesPoint::new(2023, 3, 280.0),
            TimeSeriesPoint::new(2019, 3, 250.0),
        ]
    }

    #[test]
    fn computes_all_three_changes() {
        let m = compute_metrics(GeographyLevel::MetroArea, "Detroit-Warren-Dearborn, MI", &sample())
            .unwrap();
        assert!(approx(m.qoq_change, 0.0169), "qoq {}", m.qoq_change);
        assert!(approx(m.yoy_change, 0.0714), "yoy {}", m.yoy_change);
        assert!(approx(m.five_year_change.unwrap(), 0.2), "5y {:?}", m.five_year_change);
        assert_eq!(m.as_of, "2024 Q3");
        assert_eq!(m.level, GeographyLevel::MetroArea);
        assert_eq!(m.geography_name, "Detroit-Warren-Dearborn, MI");
    }

    #[test]
    fn missing_five_year_comparator_is_absent() {
        let mut points = sample();
        points.pop();
        let m = compute_metrics(GeographyLevel::State, "MI", &points).unwrap();
        assert_eq!(m.five_year_change, None);
        assert!(approx(m.yoy_change, 0.0714));
    }

    #[test]
    fn flat_five_year_market_is_zero_not_absent() {
        let points = vec![
            TimeSeriesPoint::new(2024, 3, 250.0),
            TimeSeriesPoint::new(2019, 3, 250.0),
        ];
        let m = compute_metrics(GeographyLevel::State, "MI", &points).unwrap();
        assert_eq!(m.five_year_change, Some(0.0));
    }

    #[test]
    fn missing_short_comparators_are_zero() {
        let points = vec![TimeSeriesPoint::new(2024, 3, 300.0)];
        let m = compute_metrics(GeographyLevel::State, "MI", &points).unwrap();
        assert!(approx(m.qoq_change, 0.0));
        assert!(approx(m.yoy_change, 0.0));
        assert_eq!(m.five_year_change, None);
    }

    #[test]
    fn first_quarter_looks_back_to_prior_year() {
        let points = vec![
            TimeSeriesPoint::new(2024, 1, 110.0),
            TimeSeriesPoint::new(2023, 4, 100.0),
        ];
        let m = compute_metrics(GeographyLevel::State, "OH", &points).unwrap();
        assert!(approx(m.qoq_change, 0.1));
        assert_eq!(previous_quarter(2024, 1), Some((2023, 4)));
        assert_eq!(previous_quarter(2024, 3), Some((2024, 2)));
        assert_eq!(previous_quarter(i32::MIN, 1), None);
    }

    #[test]
    fn extreme_years_do_not_overflow() {
        let points = vec![TimeSeriesPoint::new(i32::MIN, 1, 100.0)];
        let m = compute_metrics(GeographyLevel::State, "OH", &points).unwrap();
        assert!(approx(m.qoq_change, 0.0));
        assert!(approx(m.yoy_change, 0.0));
        assert_eq!(m.five_year_change, None);

        let points = vec![
            TimeSeriesPoint::new(i32::MIN + 1, 1, 110.0),
            TimeSeriesPoint::new(i32::MIN, 4, 100.0),
        ];
        let m = compute_metrics(GeographyLevel::State, "OH", &points).unwrap();
        assert!(approx(m.qoq_change, 0.1));
        assert_eq!(m.five_year_change, None);
    }

    #[test]
    fn negative_years_look_back_normally() {
        let points = vec![
            TimeSeriesPoint::new(-3, 2, 120.0),
            TimeSeriesPoint::new(-8, 2, 100.0),
        ];
        let m = compute_metrics(GeographyLevel::State, "OH", &points).unwrap();
        assert!(approx(m.five_year_change.unwrap(), 0.2));
    }

    #[test]
    fn zero_prior_index_is_treated_as_missing() {
        let points = vec![
            TimeSeriesPoint::new(2024, 3, 100.0),
            TimeSeriesPoint::new(2019, 3, 0.0),
        ];
        let m = compute_metrics(GeographyLevel::State, "OH", &points).unwrap();
        assert_eq!(m.five_year_change, None);
    }

    #[test]
    fn negative_changes_round() {
        let points = vec![
            TimeSeriesPoint::new(2024, 3, 290.0),
            TimeSeriesPoint::new(2024, 2, 300.0),
        ];
        let m = compute_metrics(GeographyLevel::State, "OH", &points).unwrap();
        assert!(approx(m.qoq_change, -0.0333));
    }

    #[test]
    fn empty_series_is_an_error() {
        let err = compute_metrics(GeographyLevel::State, "OH", &[]).unwrap_err();
        assert!(matches!(err, HpiError::EmptySeries));
    }

    #[test]
    fn resolved_geography_shortcut() {
        let points = sample();
        let geo = ResolvedGeography {
            level: GeographyLevel::State,
            key: "MI",
            points: &points,
        };
        let m = price_changes(&geo).unwrap();
        assert_eq!(m.geography_name, "MI");
        assert_eq!(m.level, GeographyLevel::State);
    }
}
