//! Geometry metadata from model files.
//!
//! OBJ and ASCII PLY/STL are plain text and self-describing; binary STL
//! carries its triangle count in a fixed header. Formats that would need
//! proprietary parsing (FBX, BLEND, MAX, ...) contribute nothing beyond
//! filesystem fields, and that is not a degraded outcome.

use super::{Extraction, MetadataFields};
use crate::config::ScanConfig;
use regex::Regex;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::sync::LazyLock;

static PLY_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^element\s+(vertex|face)\s+(\d+)").unwrap());

/// Fixed-size prefix of a binary STL: 80-byte comment + u32 triangle count.
const STL_BINARY_HEADER_LEN: u64 = 84;
/// Bytes per encoded binary STL triangle.
const STL_TRIANGLE_LEN: u64 = 50;

pub(crate) fn extract(path: &Path, file_format: &str) -> Extraction {
    match file_format {
        "obj" => extract_obj(path),
        "ply" => extract_ply(path),
        "stl" => extract_stl(path),
        _ => Extraction::default(),
    }
}

/// Count `v` / `f` / `usemtl` directives in a Wavefront OBJ.
fn extract_obj(path: &Path) -> Extraction {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => return Extraction::degraded(format!("cannot open OBJ: {e}")),
    };

    let mut vertices: u64 = 0;
    let mut faces: u64 = 0;
    let mut materials: HashSet<String> = HashSet::new();

    for line in BufReader::new(file).lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => return Extraction::degraded(format!("error reading OBJ: {e}")),
        };
        let line = line.trim_start();
        if line.starts_with("v ") {
            vertices += 1;
        } else if line.starts_with("f ") {
            faces += 1;
        } else if let Some(name) = line.strip_prefix("usemtl ") {
            materials.insert(name.trim().to_string());
        }
    }

    Extraction {
        fields: MetadataFields {
            vertex_count: Some(vertices),
            face_count: Some(faces),
            material_count: Some(materials.len() as u64),
            ..Default::default()
        },
        degraded: false,
        reason: None,
    }
}

/// Read `element vertex N` / `element face N` from a PLY header.
///
/// The header is ASCII for both ascii and binary PLY bodies, so this never
/// touches payload data.
fn extract_ply(path: &Path) -> Extraction {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => return Extraction::degraded(format!("cannot open PLY: {e}")),
    };

    let mut lines = BufReader::new(file).lines();
    match lines.next() {
        Some(Ok(magic)) if magic.trim() == "ply" => {}
        _ => return Extraction::degraded("missing PLY magic"),
    }

    let mut fields = MetadataFields::default();
    for line in lines.take(ScanConfig::MAX_HEADER_LINES) {
        let line = match line {
            Ok(l) => l,
            Err(e) => return Extraction::degraded(format!("error reading PLY header: {e}")),
        };
        let line = line.trim();
        if line == "end_header" {
            return Extraction {
                fields,
                degraded: false,
                reason: None,
            };
        }
        if let Some(caps) = PLY_ELEMENT.captures(line) {
            let count = caps[2].parse::<u64>().ok();
            match &caps[1] {
                "vertex" => fields.vertex_count = count,
                "face" => fields.face_count = count,
                _ => {}
            }
        }
    }

    Extraction::degraded("PLY header did not terminate")
}

/// STL triangle count: binary header word, or `facet normal` lines for the
/// ASCII form. Binary files often begin with "solid" too, so the size check
/// against the encoded triangle length decides first.
fn extract_stl(path: &Path) -> Extraction {
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(e) => return Extraction::degraded(format!("cannot open STL: {e}")),
    };
    let file_size = match file.metadata() {
        Ok(m) => m.len(),
        Err(e) => return Extraction::degraded(format!("cannot stat STL: {e}")),
    };

    if file_size >= STL_BINARY_HEADER_LEN {
        let mut header = [0u8; STL_BINARY_HEADER_LEN as usize];
        if let Err(e) = file.read_exact(&mut header) {
            return Extraction::degraded(format!("error reading STL header: {e}"));
        }
        let triangles = u32::from_le_bytes(header[80..84].try_into().unwrap()) as u64;
        if file_size == STL_BINARY_HEADER_LEN + triangles * STL_TRIANGLE_LEN {
            return Extraction {
                fields: MetadataFields {
                    face_count: Some(triangles),
                    ..Default::default()
                },
                degraded: false,
                reason: None,
            };
        }
        if !header.starts_with(b"solid") {
            return Extraction::degraded("STL is neither valid binary nor ASCII");
        }
    }

    extract_stl_ascii(path)
}

fn extract_stl_ascii(path: &Path) -> Extraction {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => return Extraction::degraded(format!("cannot open STL: {e}")),
    };

    let mut faces: u64 = 0;
    for line in BufReader::new(file).lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => return Extraction::degraded(format!("error reading STL: {e}")),
        };
        if line.trim_start().starts_with("facet normal") {
            faces += 1;
        }
    }

    Extraction {
        fields: MetadataFields {
            face_count: Some(faces),
            ..Default::default()
        },
        degraded: false,
        reason: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents).unwrap();
        path
    }

    #[test]
    fn test_obj_counts() {
        let temp = TempDir::new().unwrap();
        let path = write_file(
            &temp,
            "cube.obj",
            b"# a cube\nmtllib cube.mtl\nusemtl wood\nv 0 0 0\nv 0 0 1\nv 0 1 0\nv 1 0 0\nvt 0 0\nvn 0 0 1\nf 1 2 3\nf 1 3 4\nusemtl wood\n",
        );

        let extraction = extract(&path, "obj");
        assert!(!extraction.degraded);
        assert_eq!(extraction.fields.vertex_count, Some(4));
        assert_eq!(extraction.fields.face_count, Some(2));
        assert_eq!(extraction.fields.material_count, Some(1));
    }

    #[test]
    fn test_ply_header() {
        let temp = TempDir::new().unwrap();
        let path = write_file(
            &temp,
            "bunny.ply",
            b"ply\nformat ascii 1.0\ncomment test\nelement vertex 1204\nproperty float x\nelement face 2048\nproperty list uchar int vertex_indices\nend_header\n",
        );

        let extraction = extract(&path, "ply");
        assert!(!extraction.degraded);
        assert_eq!(extraction.fields.vertex_count, Some(1204));
        assert_eq!(extraction.fields.face_count, Some(2048));
    }

    #[test]
    fn test_ply_without_magic_is_degraded() {
        let temp = TempDir::new().unwrap();
        let path = write_file(&temp, "bad.ply", b"not a ply file at all\n");

        let extraction = extract(&path, "ply");
        assert!(extraction.degraded);
    }

    #[test]
    fn test_stl_ascii() {
        let temp = TempDir::new().unwrap();
        let mut body = String::from("solid part\n");
        for _ in 0..3 {
            body.push_str(
                "facet normal 0 0 1\n outer loop\n  vertex 0 0 0\n  vertex 1 0 0\n  vertex 0 1 0\n endloop\nendfacet\n",
            );
        }
        body.push_str("endsolid part\n");
        let path = write_file(&temp, "part.stl", body.as_bytes());

        let extraction = extract(&path, "stl");
        assert!(!extraction.degraded);
        assert_eq!(extraction.fields.face_count, Some(3));
    }

    #[test]
    fn test_stl_binary() {
        let temp = TempDir::new().unwrap();
        let triangles: u32 = 2;
        let mut bytes = vec![0u8; 80];
        bytes.extend_from_slice(&triangles.to_le_bytes());
        bytes.extend_from_slice(&vec![0u8; (triangles as usize) * 50]);
        let path = write_file(&temp, "part.stl", &bytes);

        let extraction = extract(&path, "stl");
        assert!(!extraction.degraded);
        assert_eq!(extraction.fields.face_count, Some(2));
    }

    #[test]
    fn test_opaque_format_is_not_degraded() {
        let temp = TempDir::new().unwrap();
        let path = write_file(&temp, "scene.fbx", b"\x00\x01binary junk");

        let extraction = extract(&path, "fbx");
        assert!(!extraction.degraded);
        assert_eq!(extraction.fields, MetadataFields::default());
    }
}
