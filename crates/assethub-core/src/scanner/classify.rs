//! Extension-based classification of candidate files.

use crate::catalog::AssetKind;
use std::path::Path;

const MODEL_EXTENSIONS: &[&str] = &[
    "obj", "fbx", "3ds", "blend", "max", "stl", "ply", "gltf", "glb", "dae", "abc", "usd", "usdz",
];

const TEXTURE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "bmp", "tga", "tif", "tiff", "exr", "hdr", "dds", "webp",
];

const MATERIAL_EXTENSIONS: &[&str] = &["mtl", "mat", "sbsar", "vmt"];

/// Classify a path by extension into a kind and a lower-cased format.
///
/// Returns `None` for unrecognized extensions; such files are skipped
/// without comment.
pub fn classify(path: &Path) -> Option<(AssetKind, String)> {
    let ext = path.extension()?.to_str()?.to_lowercase();

    let kind = if MODEL_EXTENSIONS.contains(&ext.as_str()) {
        AssetKind::Model
    } else if TEXTURE_EXTENSIONS.contains(&ext.as_str()) {
        AssetKind::Texture
    } else if MATERIAL_EXTENSIONS.contains(&ext.as_str()) {
        AssetKind::Material
    } else {
        return None;
    };

    Some((kind, ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_classify_known_extensions() {
        assert_eq!(
            classify(&PathBuf::from("/a/chair.obj")),
            Some((AssetKind::Model, "obj".to_string()))
        );
        assert_eq!(
            classify(&PathBuf::from("/a/wood.JPG")),
            Some((AssetKind::Texture, "jpg".to_string()))
        );
        assert_eq!(
            classify(&PathBuf::from("/a/cube.mtl")),
            Some((AssetKind::Material, "mtl".to_string()))
        );
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(classify(&PathBuf::from("/a/readme.txt")), None);
        assert_eq!(classify(&PathBuf::from("/a/no_extension")), None);
    }
}
