//! Core catalog record types and asset identity.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Broad classification of a cataloged file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Model,
    Texture,
    Material,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Model => "model",
            AssetKind::Texture => "texture",
            AssetKind::Material => "material",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "model" => Some(AssetKind::Model),
            "texture" => Some(AssetKind::Texture),
            "material" => Some(AssetKind::Material),
            _ => None,
        }
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A cataloged asset file and its metadata.
///
/// The catalog is the system of record for these; the search index only ever
/// holds a disposable projection of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// Stable identity derived from the canonical file path (or from
    /// source + source_id for remote assets). Re-scanning the same path
    /// yields the same id.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Unique per asset.
    pub file_path: String,
    pub file_size: u64,
    pub file_type: AssetKind,
    /// Extension-derived, lower-cased.
    pub file_format: String,
    pub created_at: String,
    pub updated_at: String,
    pub last_accessed: Option<String>,
    pub access_count: u64,
    /// "local" for scanned files; provider name otherwise.
    pub source: String,
    pub source_url: Option<String>,
    pub source_id: Option<String>,
    // Model-specific
    pub vertex_count: Option<u64>,
    pub face_count: Option<u64>,
    pub material_count: Option<u64>,
    // Texture-specific
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub channels: Option<u8>,
}

impl Asset {
    /// Build a record for a locally scanned file. Format-specific fields
    /// start empty; extraction fills what it can.
    pub fn local(
        path: &Path,
        file_type: AssetKind,
        file_format: impl Into<String>,
        file_size: u64,
    ) -> Self {
        let now = Utc::now().to_rfc3339();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());

        Self {
            id: asset_id_for_path(path),
            name,
            description: String::new(),
            file_path: path.to_string_lossy().to_string(),
            file_size,
            file_type,
            file_format: file_format.into(),
            created_at: now.clone(),
            updated_at: now,
            last_accessed: None,
            access_count: 0,
            source: LOCAL_SOURCE.to_string(),
            source_url: None,
            source_id: None,
            vertex_count: None,
            face_count: None,
            material_count: None,
            width: None,
            height: None,
            channels: None,
        }
    }
}

/// Source value for locally scanned files.
pub const LOCAL_SOURCE: &str = "local";

/// Derive a stable asset id for a local file path.
pub fn asset_id_for_path(path: &Path) -> String {
    derive_id(LOCAL_SOURCE, &path.to_string_lossy())
}

/// Derive a stable asset id for a remote asset.
pub fn asset_id_for_remote(source: &str, source_id: &str) -> String {
    derive_id(source, source_id)
}

/// Stable identity: first 16 bytes of SHA-256 over `namespace \0 key`,
/// hex-encoded. The namespace keeps local paths and provider ids from
/// colliding.
fn derive_id(namespace: &str, key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update([0u8]);
    hasher.update(key.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..16])
}

/// Result of a catalog upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// A free-form label. Names are unique case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// A hierarchical label. `parent_id` references another category; the
/// catalog rejects writes that would turn the tree into a cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
}

/// A category with its children resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNode {
    pub category: Category,
    pub children: Vec<CategoryNode>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_kind_roundtrip() {
        for kind in [AssetKind::Model, AssetKind::Texture, AssetKind::Material] {
            let parsed = AssetKind::from_str(kind.as_str()).expect("should parse");
            assert_eq!(kind, parsed);
        }
        assert_eq!(AssetKind::from_str("MODEL"), Some(AssetKind::Model));
        assert_eq!(AssetKind::from_str("hdri"), None);
    }

    #[test]
    fn test_id_stable_for_same_path() {
        let path = PathBuf::from("/assets/props/chair.obj");
        assert_eq!(asset_id_for_path(&path), asset_id_for_path(&path));
        assert_ne!(
            asset_id_for_path(&path),
            asset_id_for_path(&PathBuf::from("/assets/props/table.obj"))
        );
        assert_eq!(asset_id_for_path(&path).len(), 32);
    }

    #[test]
    fn test_remote_id_namespaced() {
        // A provider id that happens to look like a path must not collide
        // with the local namespace.
        let local = asset_id_for_path(&PathBuf::from("abc"));
        let remote = asset_id_for_remote("polyhaven", "abc");
        assert_ne!(local, remote);
    }

    #[test]
    fn test_local_record_defaults() {
        let asset = Asset::local(
            &PathBuf::from("/assets/chair.obj"),
            AssetKind::Model,
            "obj",
            1024,
        );
        assert_eq!(asset.name, "chair");
        assert_eq!(asset.source, LOCAL_SOURCE);
        assert_eq!(asset.access_count, 0);
        assert_eq!(asset.created_at, asset.updated_at);
        assert!(asset.vertex_count.is_none());
    }
}
