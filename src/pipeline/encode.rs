//! Image bytes for upload.
//!
//! A stream whose only filter is `DCTDecode` is already a JPEG file and is
//! uploaded as stored. Every other stream (Flate, CCITT, JBIG2, raw samples)
//! has no standalone file form, so pdfium decodes it and it is written out as
//! a lossless PNG.

use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// File format of an extracted image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    /// Pick the format from the image stream's filter chain.
    pub fn from_filters<'a>(filters: impl IntoIterator<Item = &'a str>) -> Self {
        let filters: Vec<&str> = filters.into_iter().collect();
        match filters.as_slice() {
            ["DCTDecode"] | ["DCT"] => ImageKind::Jpeg,
            _ => ImageKind::Png,
        }
    }

    /// Lowercase file extension used in the destination key.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Png => "png",
            ImageKind::Jpeg => "jpg",
        }
    }

    /// Content type for a lowercase extension, falling back to octet-stream.
    pub fn content_type_for_extension(ext: &str) -> &'static str {
        match ext {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            _ => "application/octet-stream",
        }
    }
}

/// True when `bytes` starts with the JPEG start-of-image marker.
pub fn is_jpeg_stream(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0xFF, 0xD8])
}

/// Encode a decoded image as PNG.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    debug!("Encoded {}x{} image → {} bytes png", img.width(), img.height(), buf.len());
    Ok(buf)
}
