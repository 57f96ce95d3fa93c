//! The frozen HPI cache and its process-wide handle.
//!
//! [`HpiCache`] is built once from a dataset and never mutated. Queries
//! borrow from it without locking. [`CacheHandle`] owns the currently
//! installed cache; a rebuild constructs a fresh [`HpiCache`] and swaps the
//! whole [`Arc`] in, so readers see either the old cache or the new one,
//! never a mix.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use housing_hpi_models::{PriceChangeMetrics, ResolvedGeography, TimeSeriesPoint};

use crate::config::DatasetConfig;
use crate::index::{SeriesIndex, build_index};
use crate::loader::{self, LoadStats, LoadedBags};
use crate::prioritize::prioritize;
use crate::{HpiError, metrics, resolve};

/// Immutable metro and state series indexes.
#[derive(Debug, Clone, Default)]
pub struct HpiCache {
    metro: SeriesIndex,
    state: SeriesIndex,
    stats: LoadStats,
}

impl HpiCache {
    /// A cache with no data. Every query against it resolves to nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Prioritizes and indexes the bags produced by a load.
    #[must_use]
    pub fn from_bags(bags: LoadedBags) -> Self {
        let cache = Self {
            metro: build_index(prioritize(bags.metro)),
            state: build_index(prioritize(bags.state)),
            stats: bags.stats,
        };
        log::info!(
            "Built HPI cache: {} metro areas, {} states",
            cache.metro.len(),
            cache.state.len(),
        );
        cache
    }

    /// Builds a cache from dataset text held in memory.
    #[must_use]
    pub fn from_csv_str(contents: &str, config: &DatasetConfig) -> Self {
        Self::from_bags(loader::load_str(contents, config))
    }

    /// Builds a cache from the dataset at `path`.
    ///
    /// A missing or unreadable file yields an empty cache, not an error.
    #[must_use]
    pub fn load(path: &Path, config: &DatasetConfig) -> Self {
        match loader::load_file(path, config) {
            Ok(bags) => Self::from_bags(bags),
            Err(e) => {
                log::warn!("{e}; housing price history will be unavailable");
                Self::empty()
            }
        }
    }

    /// Resolves a city/state query to a geography with observations.
    #[must_use]
    pub fn resolve(&self, city: &str, state: &str) -> Option<ResolvedGeography<'_>> {
        resolve::resolve(&self.metro, &self.state, city, state)
    }

    /// Resolves a query and computes its price changes.
    ///
    /// `Ok(None)` means no price history is available for the location.
    ///
    /// # Errors
    ///
    /// Returns [`HpiError::EmptySeries`] if a resolved series is empty.
    pub fn price_changes(
        &self,
        city: &str,
        state: &str,
    ) -> Result<Option<PriceChangeMetrics>, HpiError> {
        self.resolve(city, state)
            .map(|geo| metrics::price_changes(&geo))
            .transpose()
    }

    /// Observations for an MSA key, newest first.
    #[must_use]
    pub fn metro_series(&self, key: &str) -> Option<&[TimeSeriesPoint]> {
        self.metro.get(key).map(Vec::as_slice)
    }

    /// Observations for a state abbreviation, newest first.
    #[must_use]
    pub fn state_series(&self, abbr: &str) -> Option<&[TimeSeriesPoint]> {
        self.state.get(abbr).map(Vec::as_slice)
    }

    /// Indexed MSA keys in sorted order.
    pub fn metro_keys(&self) -> impl Iterator<Item = &str> {
        self.metro.keys().map(String::as_str)
    }

    /// Indexed state abbreviations in sorted order.
    pub fn state_keys(&self) -> impl Iterator<Item = &str> {
        self.state.keys().map(String::as_str)
    }

    /// Total number of indexed geographies across both indexes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.metro.len() + self.state.len()
    }

    /// Whether neither index holds any geography.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metro.is_empty() && self.state.is_empty()
    }

    /// Counters from the load that produced this cache.
    #[must_use]
    pub const fn stats(&self) -> &LoadStats {
        &self.stats
    }
}

/// Holder for the currently installed [`HpiCache`].
///
/// Queries fail with [`HpiError::CacheNotInitialized`] until a cache has
/// been installed.
#[derive(Debug, Default)]
pub struct CacheHandle {
    current: RwLock<Option<Arc<HpiCache>>>,
}

impl CacheHandle {
    /// Creates a handle with no cache installed.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: RwLock::new(None),
        }
    }

    /// Installs `cache`, replacing any previous one, and returns it.
    pub fn install(&self, cache: HpiCache) -> Arc<HpiCache> {
        let cache = Arc::new(cache);
        let previous = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(Arc::clone(&cache));

        if previous.is_some() {
            log::info!("Swapped in rebuilt HPI cache ({} geographies)", cache.len());
        } else {
            log::info!("Installed HPI cache ({} geographies)", cache.len());
        }
        cache
    }

    /// Loads the dataset at `path` and installs the resulting cache.
    pub fn load(&self, path: &Path, config: &DatasetConfig) -> Arc<HpiCache> {
        self.install(HpiCache::load(path, config))
    }

    /// Returns the installed cache.
    ///
    /// # Errors
    ///
    /// Returns [`HpiError::CacheNotInitialized`] if no cache has been
    /// installed yet.
    pub fn get(&self) -> Result<Arc<HpiCache>, HpiError> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(HpiError::CacheNotInitialized)
    }

    /// Whether a cache has been installed.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Resolves a query against the installed cache and computes its price
    /// changes.
    ///
    /// # Errors
    ///
    /// Returns [`HpiError::CacheNotInitialized`] if no cache has been
    /// installed, or [`HpiError::EmptySeries`] if a resolved series is empty.
    pub fn price_changes(
        &self,
        city: &str,
        state: &str,
    ) -> Result<Option<PriceChangeMetrics>, HpiError> {
        self.get()?.price_changes(city, state)
    }
}

static GLOBAL: CacheHandle = CacheHandle::new();

/// The process-wide cache handle.
#[must_use]
pub fn global() -> &'static CacheHandle {
    &GLOBAL
}

#[cfg(test)]
mod tests {
    use housing_hpi_models::GeographyLevel;

    use super::*;

    const DATASET: &str = "\
hpi_type,hpi_flavor,frequency,level,place_name,place_id,yr,period,index_nsa,index_sa
traditional,purchase-only,quarterly,MSA,\"Detroit-Warren-Dearborn, MI\",19820,2019,3,250,250
traditional,purchase-only,quarterly,MSA,\"Detroit-Warren-Dearborn, MI\",19820,2024,2,295,295
traditional,purchase-only,quarterly,MSA,\"Detroit-Warren-Dearborn, MI\",19820,2024,3,300,300
traditional,purchase-only,quarterly,MSA,\"Detroit-Warren-Dearborn, MI\",19820,2023,3,280,280
traditional,all-transactions,quarterly,MSA,\"Detroit-Warren-Dearborn, MI\",19820,2024,4,999,999
traditional,all-transactions,quarterly,MSA,\"Chicago-Naperville-Elgin, IL-IN-WI\",16980,2024,3,200,
traditional,all-transactions,quarterly,State,Michigan,MI,2024,3,400,401
traditional,all-transactions,quarterly,State,Michigan,MI,2024,2,390,391
traditional,purchase-only,quarterly,state,Ohio,OH,2024,3,350,
traditional,purchase-only,quarterly,State,District of Columbia,DC,2024,3,500,500
traditional,purchase-only,monthly,MSA,\"Detroit-Warren-Dearborn, MI\",19820,2024,9,1,1
bogus line
";

    fn cache() -> HpiCache {
        HpiCache::from_csv_str(DATASET, &DatasetConfig::embedded().unwrap())
    }

    #[test]
    fn every_series_is_sorted_newest_first() {
        let cache = cache();
        for key in cache.metro_keys() {
            let points = cache.metro_series(key).unwrap();
            assert!(points.windows(2).all(|w| w[0].period_key() > w[1].period_key()));
        }
        for key in cache.state_keys() {
            let points = cache.state_series(key).unwrap();
            assert!(points.windows(2).all(|w| w[0].period_key() > w[1].period_key()));
        }
    }

    #[test]
    fn purchase_only_series_excludes_all_transactions() {
        let cache = cache();
        let detroit = cache.metro_series("Detroit-Warren-Dearborn, MI").unwrap();
        assert_eq!(detroit.len(), 4);
        assert!(detroit.iter().all(|p| (p.index - 999.0).abs() > f64::EPSILON));
        assert_eq!(detroit[0].period_key(), (2024, 3));
    }

    #[test]
    fn every_accepted_key_lands_in_exactly_one_index() {
        let cache = cache();
        let metro: Vec<&str> = cache.metro_keys().collect();
        let states: Vec<&str> = cache.state_keys().collect();
        assert_eq!(
            metro,
            vec!["Chicago-Naperville-Elgin, IL-IN-WI", "Detroit-Warren-Dearborn, MI"]
        );
        assert_eq!(states, vec!["MI", "OH"]);
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.stats().untranslatable_states, 1);
        assert_eq!(cache.stats().malformed, 1);
        assert_eq!(cache.stats().ignored, 1);
    }

    #[test]
    fn end_to_end_metro_metrics() {
        let metrics = cache().price_changes("Warren", "MI").unwrap().unwrap();
        assert_eq!(metrics.level, GeographyLevel::MetroArea);
        assert_eq!(metrics.geography_name, "Detroit-Warren-Dearborn, MI");
        assert_eq!(metrics.as_of, "2024 Q3");
        assert!((metrics.qoq_change - 0.0169).abs() < 1e-9);
        assert!((metrics.yoy_change - 0.0714).abs() < 1e-9);
        assert!((metrics.five_year_change.unwrap() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn state_fallback_reports_abbreviation() {
        let metrics = cache().price_changes("Kalamazoo", "MI").unwrap().unwrap();
        assert_eq!(metrics.level, GeographyLevel::State);
        assert_eq!(metrics.geography_name, "MI");
        assert!((metrics.qoq_change - 0.0256).abs() < 1e-9);
    }

    #[test]
    fn unmatched_location_is_none() {
        assert!(cache().price_changes("Springfield", "IL").unwrap().is_none());
        assert!(cache().price_changes("Washington", "DC").unwrap().is_none());
    }

    #[test]
    fn extreme_year_row_never_reaches_a_query() {
        let data = "\
hpi_type,hpi_flavor,frequency,level,place_name,place_id,yr,period,index_nsa,index_sa
traditional,purchase-only,quarterly,State,Ohio,OH,-2147483648,3,1,1
";
        let cache = HpiCache::from_csv_str(data, &DatasetConfig::embedded().unwrap());
        assert_eq!(cache.stats().malformed, 1);
        assert!(cache.price_changes("Columbus", "OH").unwrap().is_none());
    }

    #[test]
    fn nonexistent_dataset_degrades_to_empty() {
        let path = std::env::temp_dir().join("housing_hpi_does_not_exist.csv");
        let _ = std::fs::remove_file(&path);

        let handle = CacheHandle::new();
        let cache = handle.load(&path, &DatasetConfig::embedded().unwrap());
        assert!(cache.is_empty());
        assert!(handle.is_initialized());
        assert!(handle.price_changes("Detroit", "MI").unwrap().is_none());
        assert!(cache.resolve("Warren", "MI").is_none());
    }

    #[test]
    fn query_before_install_is_an_error() {
        let handle = CacheHandle::new();
        assert!(!handle.is_initialized());
        assert!(matches!(handle.get(), Err(HpiError::CacheNotInitialized)));
        assert!(matches!(
            handle.price_changes("Detroit", "MI"),
            Err(HpiError::CacheNotInitialized)
        ));
    }

    #[test]
    fn rebuild_swaps_whole_cache() {
        let handle = CacheHandle::new();
        handle.install(cache());
        let before = handle.get().unwrap();

        handle.install(HpiCache::empty());
        let after = handle.get().unwrap();

        assert_eq!(before.len(), 4);
        assert!(after.is_empty());
        assert!(before.price_changes("Warren", "MI").unwrap().is_some());
    }

    #[test]
    fn concurrent_readers_share_frozen_cache() {
        let handle = Arc::new(CacheHandle::new());
        handle.install(cache());

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let handle = Arc::clone(&handle);
                std::thread::spawn(move || {
                    handle
                        .price_changes("Detroit", "MI")
                        .unwrap()
                        .map(|m| m.geography_name)
                })
            })
            .collect();

        for worker in workers {
            assert_eq!(
                worker.join().unwrap().as_deref(),
                Some("Detroit-Warren-Dearborn, MI")
            );
        }
    }
}
