//! AssetHub Core - Headless catalog and search for 3D asset libraries.
//!
//! This crate scans directories of 3D assets (models, textures, materials),
//! extracts per-format metadata, keeps the records in a SQLite catalog and
//! serves filtered, relevance-ranked search from a derived FTS5 index. It can
//! be used programmatically without any GUI or host-plugin layer.
//!
//! # Example
//!
//! ```rust,ignore
//! use assethub::{AssetHub, SearchRequest, Settings};
//!
//! #[tokio::main]
//! async fn main() -> assethub::Result<()> {
//!     let hub = AssetHub::new(Settings::with_root("./assethub-data"))?;
//!
//!     // Catalog a directory tree; scanned assets are searchable on return.
//!     let report = hub.scan_directory("/mnt/assets", true).await?;
//!     println!("{} added, {} updated", report.added, report.updated);
//!
//!     // Search.
//!     let hits = hub
//!         .engine()
//!         .search(&SearchRequest::with_text("chair").filter("file_type", "model"))?;
//!     println!("Found {} chairs", hits.len());
//!
//!     Ok(())
//! }
//! ```

pub mod cancel;
pub mod catalog;
pub mod config;
pub mod error;
pub mod extract;
pub mod index;
pub mod provider;
pub mod scanner;
pub mod search;

// Re-export commonly used types
pub use cancel::{CancellationToken, CancelledError};
pub use catalog::{
    asset_id_for_path, asset_id_for_remote, Asset, AssetKind, CatalogStore, Category,
    CategoryNode, Tag, UpsertOutcome, LOCAL_SOURCE,
};
pub use config::Settings;
pub use error::{AssetHubError, Result};
pub use index::{AssetIndex, IndexDocument, IndexMetadata};
pub use provider::{AssetProvider, ProviderPage, ProviderRegistry};
pub use scanner::{FileScanner, ScanReport, ScanWarning};
pub use search::{QueryEngine, SearchRequest};

use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Main entry point, wiring the catalog, index, scanner and query engine
/// together.
///
/// Constructed once at startup from explicit [`Settings`] and passed down;
/// there is no ambient global state. Opening recovers automatically from an
/// unusable search index by recreating it and rebuilding from the catalog,
/// which is always the system of record.
pub struct AssetHub {
    settings: Settings,
    store: Arc<CatalogStore>,
    index: Arc<AssetIndex>,
    engine: QueryEngine,
}

impl AssetHub {
    /// Open (or create) the catalog and search index under the configured
    /// paths.
    pub fn new(settings: Settings) -> Result<Self> {
        for dir in [&settings.data_dir, &settings.storage_path] {
            if !dir.exists() {
                std::fs::create_dir_all(dir)
                    .map_err(|e| AssetHubError::io_with_path(e, dir))?;
            }
        }

        let store = Arc::new(CatalogStore::open(&settings.catalog_db)?);

        let index = match AssetIndex::open(&settings.index_db) {
            Ok(index) => index,
            Err(err) if err.requires_rebuild() => {
                warn!("Search index unusable ({err}); recreating");
                AssetIndex::recreate(&settings.index_db)?
            }
            Err(err) => return Err(err),
        };
        let index = Arc::new(index);

        let hub = Self {
            engine: QueryEngine::new(store.clone(), index.clone()),
            settings,
            store,
            index,
        };
        hub.ensure_index()?;
        Ok(hub)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The catalog store (system of record).
    pub fn store(&self) -> &Arc<CatalogStore> {
        &self.store
    }

    /// The derived search index.
    pub fn index(&self) -> &Arc<AssetIndex> {
        &self.index
    }

    /// The query engine.
    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    /// A scanner configured against this hub's catalog.
    pub fn scanner(&self) -> FileScanner {
        FileScanner::new(self.store.clone()).with_workers(self.settings.scan_workers)
    }

    // ========================================
    // Scanning & Indexing
    // ========================================

    /// Scan a directory and index everything it cataloged.
    ///
    /// Indexing happens synchronously after the scan commits, so every asset
    /// in the returned report is queryable once this returns.
    pub async fn scan_directory(
        &self,
        root: impl AsRef<Path>,
        recursive: bool,
    ) -> Result<ScanReport> {
        let report = self.scanner().scan(root, recursive).await?;
        let ids: Vec<String> = report.assets.iter().map(|a| a.id.clone()).collect();
        self.index_assets(&ids)?;
        Ok(report)
    }

    /// Index (or re-index) cataloged assets by id. Returns how many
    /// documents were written.
    pub fn index_assets(&self, ids: &[String]) -> Result<usize> {
        let mut indexed = 0;
        for id in ids {
            match self.document_for(id)? {
                Some(doc) => {
                    self.index.upsert_document(&doc)?;
                    indexed += 1;
                }
                None => warn!("Asset {} vanished before indexing", id),
            }
        }
        Ok(indexed)
    }

    /// Regenerate the whole index from the catalog.
    pub fn rebuild_index(&self) -> Result<usize> {
        let assets = self.store.list_assets()?;
        let mut docs = Vec::with_capacity(assets.len());
        for asset in &assets {
            let tags = self.store.tags_for(&asset.id)?;
            let categories: Vec<String> = self
                .store
                .categories_for(&asset.id)?
                .into_iter()
                .map(|c| c.name)
                .collect();
            docs.push(IndexDocument::from_asset(asset, &tags, &categories));
        }
        self.index.rebuild(&docs)
    }

    /// Rebuild the index if its document count has drifted from the catalog.
    pub fn ensure_index(&self) -> Result<()> {
        let meta = self.index.metadata()?;
        let cataloged = self.store.count()?;
        if meta.document_count != cataloged {
            info!(
                "Search index stale ({} documents, {} assets); rebuilding",
                meta.document_count, cataloged
            );
            self.rebuild_index()?;
        }
        Ok(())
    }

    // ========================================
    // Catalog Mutations
    // ========================================

    /// Delete an asset from the catalog and propagate the removal to the
    /// index.
    pub fn delete_asset(&self, id: &str) -> Result<()> {
        if !self.store.delete(id)? {
            return Err(AssetHubError::AssetNotFound { id: id.to_string() });
        }
        self.index.remove_document(id)?;
        info!("Deleted asset {}", id);
        Ok(())
    }

    /// Catalog and index an asset sourced from a marketplace provider.
    ///
    /// Provider records must carry provenance; beyond that they take exactly
    /// the same path as locally scanned files. Re-ingesting the same
    /// source_id updates the existing record.
    pub fn ingest_remote(&self, asset: &Asset) -> Result<Asset> {
        if asset.source == LOCAL_SOURCE || asset.source_id.is_none() {
            return Err(AssetHubError::Provider {
                provider: asset.source.clone(),
                message: "remote assets must carry a provider source and source_id".to_string(),
            });
        }
        let (stored, _) = self.store.upsert(asset)?;
        self.refresh_document(&stored.id)?;
        Ok(stored)
    }

    /// Tag an asset and refresh its index document so the facet is
    /// immediately filterable.
    pub fn tag_asset(&self, id: &str, names: &[String]) -> Result<()> {
        self.store.assign_tags(id, names)?;
        self.refresh_document(id)
    }

    /// Categorize an asset and refresh its index document.
    pub fn categorize_asset(&self, id: &str, category_ids: &[i64]) -> Result<()> {
        self.store.assign_categories(id, category_ids)?;
        self.refresh_document(id)
    }

    /// Note that an asset was opened by a caller.
    pub fn record_access(&self, id: &str) -> Result<()> {
        self.store.record_access(id)
    }

    fn refresh_document(&self, id: &str) -> Result<()> {
        if let Some(doc) = self.document_for(id)? {
            self.index.upsert_document(&doc)?;
        }
        Ok(())
    }

    fn document_for(&self, id: &str) -> Result<Option<IndexDocument>> {
        let Some(asset) = self.store.get(id)? else {
            return Ok(None);
        };
        let tags = self.store.tags_for(id)?;
        let categories: Vec<String> = self
            .store
            .categories_for(id)?
            .into_iter()
            .map(|c| c.name)
            .collect();
        Ok(Some(IndexDocument::from_asset(&asset, &tags, &categories)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn hub_in(temp: &TempDir) -> AssetHub {
        AssetHub::new(Settings::with_root(temp.path().join("data"))).unwrap()
    }

    fn write_assets_dir(temp: &TempDir) -> PathBuf {
        let dir = temp.path().join("library");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("chair.obj"),
            "v 0 0 0\nv 0 0 1\nv 0 1 0\nf 1 2 3\n",
        )
        .unwrap();
        image::RgbImage::new(4, 4).save(dir.join("wood.jpg")).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_scan_then_search_end_to_end() {
        let temp = TempDir::new().unwrap();
        let hub = hub_in(&temp);
        let dir = write_assets_dir(&temp);

        let report = hub.scan_directory(&dir, true).await.unwrap();
        assert_eq!(report.added, 2);

        let hits = hub.engine().search(&SearchRequest::with_text("chair")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].file_type, AssetKind::Model);

        let hits = hub
            .engine()
            .search(&SearchRequest::default().filter("file_type", "texture"))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "wood");

        assert_eq!(
            hub.engine().distinct_file_types().unwrap(),
            vec!["model".to_string(), "texture".to_string()]
        );
    }

    #[tokio::test]
    async fn test_delete_propagates_to_index() {
        let temp = TempDir::new().unwrap();
        let hub = hub_in(&temp);
        let dir = write_assets_dir(&temp);
        hub.scan_directory(&dir, true).await.unwrap();

        let hits = hub.engine().search(&SearchRequest::with_text("chair")).unwrap();
        let id = hits[0].id.clone();

        hub.delete_asset(&id).unwrap();
        assert!(hub
            .engine()
            .search(&SearchRequest::with_text("chair"))
            .unwrap()
            .is_empty());
        assert!(matches!(
            hub.delete_asset(&id).unwrap_err(),
            AssetHubError::AssetNotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_tagging_is_immediately_filterable() {
        let temp = TempDir::new().unwrap();
        let hub = hub_in(&temp);
        let dir = write_assets_dir(&temp);
        hub.scan_directory(&dir, true).await.unwrap();

        let found = hub.engine().search(&SearchRequest::with_text("chair")).unwrap();
        let chair = &found[0];
        hub.tag_asset(&chair.id, &["Furniture".to_string()]).unwrap();

        let hits = hub
            .engine()
            .search(&SearchRequest::default().filter("tags", "furniture"))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, chair.id);
    }

    #[tokio::test]
    async fn test_corrupt_index_is_rebuilt_on_open() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("data");
        let dir = write_assets_dir(&temp);

        {
            let hub = AssetHub::new(Settings::with_root(&root)).unwrap();
            hub.scan_directory(&dir, true).await.unwrap();
        }

        // Trash the index file outright.
        let settings = Settings::with_root(&root);
        std::fs::write(&settings.index_db, b"garbage garbage garbage garbage garbage").unwrap();

        let hub = AssetHub::new(settings).unwrap();
        let hits = hub.engine().search(&SearchRequest::with_text("chair")).unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hub.index().metadata().unwrap().last_full_rebuild.is_some());
    }

    #[tokio::test]
    async fn test_stale_index_rebuilt_on_open() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("data");
        let dir = write_assets_dir(&temp);

        {
            let hub = AssetHub::new(Settings::with_root(&root)).unwrap();
            // Catalog without indexing: the index is now behind the catalog.
            hub.scanner().scan(&dir, true).await.unwrap();
            assert_eq!(hub.index().count().unwrap(), 0);
        }

        let hub = AssetHub::new(Settings::with_root(&root)).unwrap();
        assert_eq!(hub.index().count().unwrap(), 2);
    }

    #[test]
    fn test_ingest_remote() {
        let temp = TempDir::new().unwrap();
        let hub = hub_in(&temp);

        let mut asset = Asset::local(
            Path::new("/downloads/polyhaven/rock_01.glb"),
            AssetKind::Model,
            "glb",
            123_456,
        );
        asset.source = "polyhaven".to_string();
        asset.source_id = Some("rock_01".to_string());
        asset.source_url = Some("https://polyhaven.com/a/rock_01".to_string());
        asset.id = asset_id_for_remote("polyhaven", "rock_01");

        let stored = hub.ingest_remote(&asset).unwrap();

        let hits = hub
            .engine()
            .search(&SearchRequest::default().filter("source", "polyhaven"))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, stored.id);

        // Re-ingest updates rather than duplicating.
        hub.ingest_remote(&asset).unwrap();
        assert_eq!(hub.store().count().unwrap(), 1);
    }

    #[test]
    fn test_ingest_remote_requires_provenance() {
        let temp = TempDir::new().unwrap();
        let hub = hub_in(&temp);

        let asset = Asset::local(Path::new("/assets/chair.obj"), AssetKind::Model, "obj", 10);
        let err = hub.ingest_remote(&asset).unwrap_err();
        assert!(matches!(err, AssetHubError::Provider { .. }));
    }
}
