//! Query engine: validated, filtered, relevance-ranked search.
//!
//! The engine validates requests, executes them against the search index and
//! resolves the resulting ids into full catalog records. It never writes to
//! either store.

use crate::catalog::{Asset, CatalogStore};
use crate::config::IndexConfig;
use crate::error::{AssetHubError, Result};
use crate::index::{query, AssetIndex, IndexQuery};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// Facet keys accepted in [`SearchRequest::filters`].
const FILTER_KEYS: &[&str] = &["file_type", "file_format", "tags", "categories", "source"];

/// Text fields accepted in [`SearchRequest::fields`].
const TEXT_FIELDS: &[&str] = &["name", "description", "tags", "categories"];

/// A search request: free text, exact-match facet filters, pagination.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Free query text; empty or absent means filter-only search.
    pub text: Option<String>,
    /// Restrict text matching to these fields; `None` searches all text
    /// fields.
    pub fields: Option<Vec<String>>,
    /// Conjunction of facet constraints, keyed by facet name. Unknown keys
    /// are rejected, not ignored.
    pub filters: BTreeMap<String, String>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            text: None,
            fields: None,
            filters: BTreeMap::new(),
            limit: IndexConfig::DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl SearchRequest {
    /// Request with query text and defaults otherwise.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Restrict text matching to the given fields.
    pub fn in_fields(mut self, fields: &[&str]) -> Self {
        self.fields = Some(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    /// Add a facet filter.
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }
}

/// Read-only search over the index, resolving hits from the catalog.
pub struct QueryEngine {
    store: Arc<CatalogStore>,
    index: Arc<AssetIndex>,
}

impl QueryEngine {
    pub fn new(store: Arc<CatalogStore>, index: Arc<AssetIndex>) -> Self {
        Self { store, index }
    }

    /// Execute a search and return matching assets, best first.
    ///
    /// Text matches rank by term frequency with the name field boosted above
    /// the description field, ties broken by most recent update. Filter-only
    /// requests order purely by recency. No match is an empty result, not an
    /// error.
    pub fn search(&self, request: &SearchRequest) -> Result<Vec<Asset>> {
        let index_query = self.validate(request)?;
        let ids = self.index.search_ids(&index_query)?;

        let mut assets = Vec::with_capacity(ids.len());
        for id in ids {
            match self.store.get(&id)? {
                Some(asset) => assets.push(asset),
                // The index may briefly know documents the catalog no longer
                // holds; such hits are dropped, not errors.
                None => warn!("Index hit {} has no catalog record; skipping", id),
            }
        }
        Ok(assets)
    }

    fn validate(&self, request: &SearchRequest) -> Result<IndexQuery> {
        if request.limit == 0 {
            return Err(AssetHubError::InvalidQuery {
                message: "limit must be greater than zero".to_string(),
            });
        }

        let mut index_query = IndexQuery {
            limit: request.limit,
            offset: request.offset,
            ..Default::default()
        };
        if let Some(ref fields) = request.fields {
            for field in fields {
                if !TEXT_FIELDS.contains(&field.as_str()) {
                    return Err(AssetHubError::InvalidQuery {
                        message: format!(
                            "unknown search field: {field} (expected one of {})",
                            TEXT_FIELDS.join(", ")
                        ),
                    });
                }
            }
        }
        if let Some(ref text) = request.text {
            index_query.match_expr = query::build_match_expr(text).map(|expr| {
                match &request.fields {
                    // FTS5 column filter: {name description} : (expr)
                    Some(fields) if !fields.is_empty() => {
                        format!("{{{}}} : ({expr})", fields.join(" "))
                    }
                    _ => expr,
                }
            });
        }

        for (key, value) in &request.filters {
            let value = value.to_lowercase();
            match key.as_str() {
                "file_type" => index_query.file_type = Some(value),
                "file_format" => index_query.file_format = Some(value),
                "tags" => index_query.tag = Some(value),
                "categories" => index_query.category = Some(value),
                "source" => index_query.source = Some(value),
                unknown => {
                    return Err(AssetHubError::InvalidQuery {
                        message: format!(
                            "unknown filter key: {unknown} (expected one of {})",
                            FILTER_KEYS.join(", ")
                        ),
                    })
                }
            }
        }
        Ok(index_query)
    }

    /// Resolve a single asset by id.
    pub fn get_by_id(&self, id: &str) -> Result<Asset> {
        self.store
            .get(id)?
            .ok_or_else(|| AssetHubError::AssetNotFound { id: id.to_string() })
    }

    /// All tag facet values, alphabetical.
    pub fn distinct_tags(&self) -> Result<Vec<String>> {
        self.index.distinct_tags()
    }

    /// All category facet values, alphabetical.
    pub fn distinct_categories(&self) -> Result<Vec<String>> {
        self.index.distinct_categories()
    }

    /// All file types present in the index, alphabetical.
    pub fn distinct_file_types(&self) -> Result<Vec<String>> {
        self.index.distinct_file_types()
    }

    /// All file formats present in the index, alphabetical.
    pub fn distinct_file_formats(&self) -> Result<Vec<String>> {
        self.index.distinct_file_formats()
    }

    /// All sources present in the index, alphabetical.
    pub fn distinct_sources(&self) -> Result<Vec<String>> {
        self.index.distinct_sources()
    }
}
