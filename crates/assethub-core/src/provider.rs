//! Marketplace provider seam.
//!
//! External asset libraries plug in through [`AssetProvider`]: anything that
//! can search, describe, download and preview remote assets. Concrete
//! provider clients live outside this crate; here the trait and the registry
//! define the boundary. Records a provider returns carry provenance
//! (source, source_url, source_id) and flow through the same catalog and
//! index paths as locally scanned files.

use crate::catalog::{Asset, AssetKind};
use crate::error::{AssetHubError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One page of provider search results.
#[derive(Debug, Clone)]
pub struct ProviderPage {
    pub assets: Vec<Asset>,
    pub total_count: usize,
    pub page: u32,
}

/// Capability set every marketplace integration implements.
#[async_trait]
pub trait AssetProvider: Send + Sync {
    /// Registry name, also used as the `source` value on returned records.
    fn name(&self) -> &str;

    /// Search the remote library.
    async fn search(
        &self,
        query: &str,
        file_type: Option<AssetKind>,
        page: u32,
        page_size: u32,
    ) -> Result<ProviderPage>;

    /// Full metadata for one remote asset.
    async fn get_asset_details(&self, source_id: &str) -> Result<Asset>;

    /// Download an asset into `dest_dir`, returning the file path.
    async fn download_asset(&self, source_id: &str, dest_dir: &Path) -> Result<PathBuf>;

    /// Download a preview image into `dest_dir`, returning the file path.
    async fn get_preview(&self, source_id: &str, dest_dir: &Path) -> Result<PathBuf>;
}

type ProviderFactory = Box<dyn Fn() -> Box<dyn AssetProvider> + Send + Sync>;

/// Name -> constructor registry for providers.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: HashMap<String, ProviderFactory>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider constructor under a name. Re-registering a name
    /// replaces the previous constructor.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn AssetProvider> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    /// Construct a provider by name.
    pub fn create(&self, name: &str) -> Result<Box<dyn AssetProvider>> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| AssetHubError::ProviderNotFound {
                name: name.to_string(),
            })
    }

    /// Registered provider names, alphabetical.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::asset_id_for_remote;

    struct StubProvider;

    #[async_trait]
    impl AssetProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        async fn search(
            &self,
            query: &str,
            _file_type: Option<AssetKind>,
            page: u32,
            _page_size: u32,
        ) -> Result<ProviderPage> {
            let mut asset = Asset::local(
                Path::new("/remote/rock.obj"),
                AssetKind::Model,
                "obj",
                4096,
            );
            asset.name = query.to_string();
            asset.source = self.name().to_string();
            asset.source_id = Some("rock-01".to_string());
            asset.id = asset_id_for_remote(self.name(), "rock-01");
            Ok(ProviderPage {
                assets: vec![asset],
                total_count: 1,
                page,
            })
        }

        async fn get_asset_details(&self, source_id: &str) -> Result<Asset> {
            Err(AssetHubError::Provider {
                provider: self.name().to_string(),
                message: format!("no such asset: {source_id}"),
            })
        }

        async fn download_asset(&self, _source_id: &str, dest_dir: &Path) -> Result<PathBuf> {
            Ok(dest_dir.join("rock.obj"))
        }

        async fn get_preview(&self, _source_id: &str, dest_dir: &Path) -> Result<PathBuf> {
            Ok(dest_dir.join("rock_preview.png"))
        }
    }

    #[test]
    fn test_register_and_create() {
        let mut registry = ProviderRegistry::new();
        assert!(registry.is_empty());

        registry.register("stub", || Box::new(StubProvider));
        assert_eq!(registry.names(), vec!["stub".to_string()]);

        let provider = registry.create("stub").unwrap();
        assert_eq!(provider.name(), "stub");

        assert!(matches!(
            registry.create("cgtrader"),
            Err(AssetHubError::ProviderNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_stub_provider_roundtrip() {
        let registry = {
            let mut r = ProviderRegistry::new();
            r.register("stub", || Box::new(StubProvider));
            r
        };
        let provider = registry.create("stub").unwrap();

        let page = provider.search("rock", None, 1, 20).await.unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.assets[0].source, "stub");
        assert_eq!(page.assets[0].source_id.as_deref(), Some("rock-01"));

        assert!(provider.get_asset_details("missing").await.is_err());
    }
}
