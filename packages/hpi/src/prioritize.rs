//! Data-variant prioritization.
//!
//! A geography may carry rows from both the purchase-only and the
//! all-transactions series. Once any purchase-only row exists for a key,
//! that key's all-transactions rows are discarded so its series never
//! mixes methodologies. Keys with only all-transactions data keep it.

use std::collections::BTreeSet;

use housing_hpi_models::DataVariant;

use crate::loader::BagEntry;

/// Filters one bag down to the preferred variant per geography key.
///
/// Row order is preserved.
#[must_use]
pub fn prioritize(bag: Vec<BagEntry>) -> Vec<BagEntry> {
    let purchase_only_keys: BTreeSet<String> = bag
        .iter()
        .filter(|e| e.variant == DataVariant::PurchaseOnly)
        .map(|e| e.key.clone())
        .collect();

    let before = bag.len();
    let kept: Vec<BagEntry> = bag
        .into_iter()
        .filter(|e| match e.variant {
            DataVariant::PurchaseOnly => true,
            DataVariant::AllTransactions => !purchase_only_keys.contains(&e.key),
            DataVariant::Other => false,
        })
        .collect();

    log::debug!(
        "Prioritized {before} rows to {} ({} keys with purchase-only data)",
        kept.len(),
        purchase_only_keys.len(),
    );

    kept
}

#[cfg(test)]
mod tests {
    use housing_hpi_models::TimeSeriesPoint;

    use super::*;

    fn entry(key: &str, variant: DataVariant, year: i32, period: u8) -> BagEntry {
        BagEntry {
            key: key.to_string(),
            variant,
            point: TimeSeriesPoint::new(year, period, 100.0),
        }
    }

    #[test]
    fn purchase_only_displaces_all_transactions_for_same_key() {
        let bag = vec![
            entry("MI", DataVariant::AllTransactions, 1980, 1),
            entry("MI", DataVariant::PurchaseOnly, 2024, 1),
            entry("MI", DataVariant::AllTransactions, 2024, 2),
        ];
        let kept = prioritize(bag);
        assert_eq!(kept.len(), 1);
        assert!(kept.iter().all(|e| e.variant == DataVariant::PurchaseOnly));
    }

    #[test]
    fn all_transactions_kept_when_no_purchase_only_exists() {
        let bag = vec![
            entry("MI", DataVariant::PurchaseOnly, 2024, 1),
            entry("WY", DataVariant::AllTransactions, 2024, 1),
            entry("WY", DataVariant::AllTransactions, 2024, 2),
        ];
        let kept = prioritize(bag);
        let wy: Vec<_> = kept.iter().filter(|e| e.key == "WY").collect();
        assert_eq!(wy.len(), 2);
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn every_key_survives() {
        let bag = vec![
            entry("A", DataVariant::AllTransactions, 2024, 1),
            entry("B", DataVariant::PurchaseOnly, 2024, 1),
            entry("B", DataVariant::AllTransactions, 2024, 1),
            entry("C", DataVariant::AllTransactions, 2023, 4),
        ];
        let keys: BTreeSet<String> = prioritize(bag).into_iter().map(|e| e.key).collect();
        assert_eq!(
            keys.into_iter().collect::<Vec<_>>(),
            vec!["A".to_string(), "B".to_string(), "C".to_string()]
        );
    }

    #[test]
    fn preserves_row_order() {
        let bag = vec![
            entry("A", DataVariant::PurchaseOnly, 2020, 1),
            entry("A", DataVariant::PurchaseOnly, 2024, 1),
            entry("A", DataVariant::PurchaseOnly, 2022, 1),
        ];
        let years: Vec<i32> = prioritize(bag).iter().map(|e| e.point.year).collect();
        assert_eq!(years, vec![2020, 2024, 2022]);
    }
}
