//! Settings and tuning constants.
//!
//! Configuration-file loading lives outside this crate; callers construct a
//! [`Settings`] value at startup (typically from their own config layer) and
//! pass it to [`AssetHub::new`](crate::AssetHub::new). There is no ambient
//! global configuration.

use std::path::PathBuf;

/// Paths and knobs the catalog needs at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Root directory for all AssetHub data.
    pub data_dir: PathBuf,
    /// Directory for managed asset storage (provider downloads land here).
    pub storage_path: PathBuf,
    /// Catalog database file (system of record).
    pub catalog_db: PathBuf,
    /// Search index database file (derived, disposable).
    pub index_db: PathBuf,
    /// Number of concurrent extraction workers during a scan.
    pub scan_workers: usize,
}

impl Settings {
    /// Build settings with all paths derived from a single root directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let data_dir = root.into();
        Self {
            storage_path: data_dir.join("assets"),
            catalog_db: data_dir.join("catalog.db"),
            index_db: data_dir.join("index").join("search.db"),
            scan_workers: ScanConfig::DEFAULT_WORKERS,
            data_dir,
        }
    }

    /// Default data root, under the platform data directory.
    ///
    /// Falls back to the home directory when no data dir is defined.
    pub fn default_root() -> PathBuf {
        dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("assethub")
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_root(Self::default_root())
    }
}

/// Scan pipeline tuning.
pub struct ScanConfig;

impl ScanConfig {
    /// Extraction workers pulling from the traversal queue.
    pub const DEFAULT_WORKERS: usize = 4;
    /// Capacity of the traversal -> worker channel. Bounds how far traversal
    /// can run ahead of extraction.
    pub const QUEUE_CAPACITY: usize = 256;
    /// Maximum header lines consulted when parsing text-based model formats.
    pub const MAX_HEADER_LINES: usize = 256;
}

/// Search index tuning.
pub struct IndexConfig;

impl IndexConfig {
    /// Bumped whenever the index schema changes shape. A mismatch on open
    /// surfaces as `IndexCorrupt` and forces a rebuild.
    pub const SCHEMA_VERSION: i64 = 1;
    /// Default search page size.
    pub const DEFAULT_LIMIT: usize = 50;
    /// bm25 column weights: id, name, description, tags, categories.
    /// Name outranks description at equal term frequency; tunable.
    pub const BM25_WEIGHTS: [f64; 5] = [0.0, 5.0, 1.0, 2.0, 2.0];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_derive_from_root() {
        let settings = Settings::with_root("/srv/assethub");
        assert_eq!(settings.data_dir, PathBuf::from("/srv/assethub"));
        assert_eq!(settings.catalog_db, PathBuf::from("/srv/assethub/catalog.db"));
        assert_eq!(
            settings.index_db,
            PathBuf::from("/srv/assethub/index/search.db")
        );
        assert!(settings.scan_workers > 0);
    }

    #[test]
    fn test_bm25_name_outweighs_description() {
        // weights: id, name, description, tags, categories
        assert!(IndexConfig::BM25_WEIGHTS[1] > IndexConfig::BM25_WEIGHTS[2]);
        assert_eq!(IndexConfig::BM25_WEIGHTS[0], 0.0);
    }
}
