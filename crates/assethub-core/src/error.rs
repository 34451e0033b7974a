//! Error types for the asset catalog.
//!
//! Structural failures (bad paths, bad queries, corrupt index, category
//! cycles) surface as typed errors. Per-file scan and extraction failures
//! are not errors at all: they are collected as [`ScanWarning`](crate::scanner::ScanWarning)
//! values and reported alongside scan results.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for AssetHub operations.
#[derive(Debug, Error)]
pub enum AssetHubError {
    // File system errors
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Catalog errors
    #[error("Asset not found: {id}")]
    AssetNotFound { id: String },

    #[error("Category not found: {id}")]
    CategoryNotFound { id: i64 },

    #[error("Setting parent of category {category_id} to {parent_id} would create a cycle")]
    CategoryCycle { category_id: i64, parent_id: i64 },

    // Query errors
    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    // Index errors
    #[error("Search index at {path} is unusable: {reason}")]
    IndexCorrupt { path: PathBuf, reason: String },

    // Provider errors
    #[error("Provider not registered: {name}")]
    ProviderNotFound { name: String },

    #[error("Provider error from {provider}: {message}")]
    Provider { provider: String, message: String },

    // Database errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Scan cancelled")]
    ScanCancelled,

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for AssetHub operations.
pub type Result<T> = std::result::Result<T, AssetHubError>;

// Conversion implementations for common error types

impl From<std::io::Error> for AssetHubError {
    fn from(err: std::io::Error) -> Self {
        AssetHubError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for AssetHubError {
    fn from(err: serde_json::Error) -> Self {
        AssetHubError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for AssetHubError {
    fn from(err: rusqlite::Error) -> Self {
        AssetHubError::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl AssetHubError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        AssetHubError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Whether this error means the search index must be rebuilt from the
    /// catalog. Patching is never a valid recovery for these.
    pub fn requires_rebuild(&self) -> bool {
        matches!(self, AssetHubError::IndexCorrupt { .. })
    }

    /// Whether this error identifies a missing entity rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AssetHubError::DirectoryNotFound(_)
                | AssetHubError::AssetNotFound { .. }
                | AssetHubError::CategoryNotFound { .. }
                | AssetHubError::ProviderNotFound { .. }
        )
    }
}
