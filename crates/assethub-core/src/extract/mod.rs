//! Format-specific metadata extraction.
//!
//! Extraction is best-effort by contract: it never fails a scan. Formats
//! whose structure is readable without proprietary parsing (OBJ, PLY, STL,
//! MTL, common image containers) contribute geometry counts or dimensions;
//! everything else keeps its filesystem-derived fields. A malformed or
//! unreadable file yields a degraded outcome carrying the reason, which the
//! scanner logs as a warning.

mod material;
mod model;
mod texture;

use crate::catalog::{Asset, AssetKind};
use std::path::Path;

/// Format-specific fields pulled out of a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataFields {
    pub vertex_count: Option<u64>,
    pub face_count: Option<u64>,
    pub material_count: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub channels: Option<u8>,
}

/// Outcome of extracting one file.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub fields: MetadataFields,
    /// Set when the file was expected to be parseable but was not; the
    /// record still stands on filesystem-derived fields alone.
    pub degraded: bool,
    pub reason: Option<String>,
}

impl Extraction {
    pub(crate) fn degraded(reason: impl Into<String>) -> Self {
        Self {
            fields: MetadataFields::default(),
            degraded: true,
            reason: Some(reason.into()),
        }
    }

    /// Copy extracted fields onto an asset record.
    pub fn apply_to(&self, asset: &mut Asset) {
        asset.vertex_count = self.fields.vertex_count;
        asset.face_count = self.fields.face_count;
        asset.material_count = self.fields.material_count;
        asset.width = self.fields.width;
        asset.height = self.fields.height;
        asset.channels = self.fields.channels;
    }
}

/// Extract format-specific metadata from a classified file.
///
/// `file_size` comes from the caller's directory walk; a zero-length file is
/// degraded up front without opening it.
pub fn extract(path: &Path, file_type: AssetKind, file_format: &str, file_size: u64) -> Extraction {
    if file_size == 0 {
        return Extraction::degraded("zero-length file");
    }

    match file_type {
        AssetKind::Model => model::extract(path, file_format),
        AssetKind::Texture => texture::extract(path),
        AssetKind::Material => material::extract(path, file_format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_zero_length_is_degraded() {
        let extraction = extract(
            &PathBuf::from("/nowhere/empty.obj"),
            AssetKind::Model,
            "obj",
            0,
        );
        assert!(extraction.degraded);
        assert_eq!(extraction.fields, MetadataFields::default());
    }

    #[test]
    fn test_apply_to() {
        let mut asset = Asset::local(
            &PathBuf::from("/assets/chair.obj"),
            AssetKind::Model,
            "obj",
            10,
        );
        let extraction = Extraction {
            fields: MetadataFields {
                vertex_count: Some(8),
                face_count: Some(12),
                ..Default::default()
            },
            degraded: false,
            reason: None,
        };
        extraction.apply_to(&mut asset);
        assert_eq!(asset.vertex_count, Some(8));
        assert_eq!(asset.face_count, Some(12));
        assert!(asset.width.is_none());
    }
}
