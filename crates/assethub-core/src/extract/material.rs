//! Material file metadata. Best effort: MTL is plain text; everything else
//! keeps filesystem-derived fields only.

use super::{Extraction, MetadataFields};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub(crate) fn extract(path: &Path, file_format: &str) -> Extraction {
    match file_format {
        "mtl" => extract_mtl(path),
        _ => Extraction::default(),
    }
}

/// Count `newmtl` definitions in a Wavefront MTL.
fn extract_mtl(path: &Path) -> Extraction {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => return Extraction::degraded(format!("cannot open MTL: {e}")),
    };

    let mut materials: u64 = 0;
    for line in BufReader::new(file).lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => return Extraction::degraded(format!("error reading MTL: {e}")),
        };
        if line.trim_start().starts_with("newmtl ") {
            materials += 1;
        }
    }

    Extraction {
        fields: MetadataFields {
            material_count: Some(materials),
            ..Default::default()
        },
        degraded: false,
        reason: None,
    }
}
