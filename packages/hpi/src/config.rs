//! Dataset marker configuration.
//!
//! The marker strings that classify each dataset row live in the embedded
//! `dataset.toml`, baked into the binary at compile time via
//! [`include_str!`].

use housing_hpi_models::DataVariant;
use serde::Deserialize;

use crate::HpiError;
use crate::record::COLUMN_COUNT;

/// Embedded dataset marker configuration.
const DATASET_TOML: &str = include_str!("../dataset.toml");

/// Marker values used to classify dataset rows.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatasetConfig {
    /// Record-type marker of the series to index (e.g. `"traditional"`).
    pub record_type: String,
    /// Frequency marker of the series to index (e.g. `"quarterly"`).
    pub frequency: String,
    /// Geography-level marker for metropolitan areas.
    pub metro_level: String,
    /// Every accepted spelling of the state geography level.
    pub state_levels: Vec<String>,
    /// Fewest fields a data row may carry.
    pub min_fields: usize,
    /// Data-variant markers.
    pub variants: VariantMarkers,
}

/// Marker strings for the two indexed data variants.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VariantMarkers {
    /// Marker for [`DataVariant::PurchaseOnly`].
    pub purchase_only: String,
    /// Marker for [`DataVariant::AllTransactions`].
    pub all_transactions: String,
}

impl DatasetConfig {
    /// Parses the embedded `dataset.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`HpiError::Config`] if the embedded TOML is malformed.
    pub fn embedded() -> Result<Self, HpiError> {
        Self::from_toml(DATASET_TOML)
    }

    /// Parses a marker configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`HpiError::Config`] if the TOML is malformed, a required
    /// key is missing, or `min_fields` is below the positional column count.
    pub fn from_toml(toml_str: &str) -> Result<Self, HpiError> {
        let config: Self = toml::de::from_str(toml_str)
            .map_err(|e| HpiError::Config(format!("Failed to parse dataset config: {e}")))?;

        if config.min_fields < COLUMN_COUNT {
            return Err(HpiError::Config(format!(
                "min_fields must be at least {COLUMN_COUNT}, got {}",
                config.min_fields
            )));
        }

        Ok(config)
    }

    /// Classifies a raw variant marker.
    #[must_use]
    pub fn variant(&self, marker: &str) -> DataVariant {
        if marker == self.variants.purchase_only {
            DataVariant::PurchaseOnly
        } else if marker == self.variants.all_transactions {
            DataVariant::AllTransactions
        } else {
            DataVariant::Other
        }
    }

    /// Whether `level` is one of the accepted state-level spellings.
    #[must_use]
    pub fn is_state_level(&self, level: &str) -> bool {
        self.state_levels.iter().any(|s| s == level)
    }

    /// Whether `level` is the metropolitan-area marker.
    #[must_use]
    pub fn is_metro_level(&self, level: &str) -> bool {
        level == self.metro_level
    }
}
