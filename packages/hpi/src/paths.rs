//! Canonical file paths for the HPI dataset.

use std::path::{Path, PathBuf};

/// Environment variable that overrides the dataset location.
pub const DATASET_PATH_ENV: &str = "HPI_DATASET_PATH";

/// Default dataset file name inside `data/`.
pub const DEFAULT_DATASET_FILE: &str = "hpi_master.csv";

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`. Falls back to the
/// current directory if the manifest is not nested as expected.
#[must_use]
pub fn project_root() -> PathBuf {
    // No panic here: a dataset that cannot be found loads as an empty
    // cache, so a bad root has to reach the loader rather than abort.
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Returns the `data/` directory path.
#[must_use]
pub fn data_dir() -> PathBuf {
    project_root().join("data")
}

/// Returns the dataset path: `HPI_DATASET_PATH` if set and non-empty,
/// otherwise `data/hpi_master.csv`.
#[must_use]
pub fn dataset_path() -> PathBuf {
    std::env::var_os(DATASET_PATH_ENV)
        .filter(|v| !v.is_empty())
        .map_or_else(|| data_dir().join(DEFAULT_DATASET_FILE), PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_dataset_lives_in_data_dir() {
        let path = data_dir().join(DEFAULT_DATASET_FILE);
        assert!(path.ends_with("data/hpi_master.csv"));
        assert!(path.starts_with(project_root()));
    }
}
