//! Image dimensions and channel count from container headers.

use super::{Extraction, MetadataFields};
use image::{ImageDecoder, ImageReader};
use std::path::Path;

pub(crate) fn extract(path: &Path) -> Extraction {
    match read_header(path) {
        Ok((width, height, channels)) => Extraction {
            fields: MetadataFields {
                width: Some(width),
                height: Some(height),
                channels: Some(channels),
                ..Default::default()
            },
            degraded: false,
            reason: None,
        },
        Err(reason) => Extraction::degraded(reason),
    }
}

/// Build a decoder and read dimensions and color type from it. Decoder
/// construction parses only the container header; pixel data stays on disk.
fn read_header(path: &Path) -> std::result::Result<(u32, u32, u8), String> {
    let reader = ImageReader::open(path)
        .map_err(|e| format!("cannot open image: {e}"))?
        .with_guessed_format()
        .map_err(|e| format!("cannot probe image format: {e}"))?;

    let decoder = reader
        .into_decoder()
        .map_err(|e| format!("unreadable image header: {e}"))?;

    let (width, height) = decoder.dimensions();
    let channels = decoder.color_type().channel_count();
    Ok((width, height, channels))
}
