//! Thumbnail helpers.
//!
//! This module provides functions for:
//! - Picking the preferred thumbnail from a metadata sidecar
//! - Detecting image formats from magic bytes (JPEG, PNG, WebP, GIF)

use serde_json::Value;
use url::Url;

/// Image format detected by magic bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
    Unknown,
}

impl ImageFormat {
    /// Canonical file extension, without the dot.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            ImageFormat::Jpeg => Some("jpg"),
            ImageFormat::Png => Some("png"),
            ImageFormat::WebP => Some("webp"),
            ImageFormat::Gif => Some("gif"),
            ImageFormat::Unknown => None,
        }
    }
}

/// Detects image format from the first bytes of a file (magic bytes)
///
/// # Arguments
///
/// * `bytes` - The first bytes of the image file (at least 12 bytes recommended)
///
/// # Returns
///
/// The detected `ImageFormat` or `ImageFormat::Unknown` if the format cannot be determined
pub fn detect_image_format(bytes: &[u8]) -> ImageFormat {
    if bytes.len() < 4 {
        return ImageFormat::Unknown;
    }

    // JPEG: FF D8 FF
    if bytes[0] == 0xFF && bytes[1] == 0xD8 && bytes[2] == 0xFF {
        return ImageFormat::Jpeg;
    }

    // PNG: 89 50 4E 47
    if bytes[0] == 0x89 && bytes[1] == 0x50 && bytes[2] == 0x4E && bytes[3] == 0x47 {
        return ImageFormat::Png;
    }

    // GIF: "GIF8"
    if bytes.starts_with(b"GIF8") {
        return ImageFormat::Gif;
    }

    // WebP: RIFF....WEBP
    if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        return ImageFormat::WebP;
    }

    ImageFormat::Unknown
}

/// Extension of the highest-preference entry in the sidecar's `thumbnails` list.
///
/// The extension is taken from the URL path, so query strings such as
/// `?sqp=...` do not leak into it.
pub fn preferred_thumbnail_extension(info: &Value) -> Option<String> {
    let thumbnails = info.get("thumbnails")?.as_array()?;

    let best = thumbnails
        .iter()
        .filter(|t| t.get("url").and_then(Value::as_str).is_some())
        .max_by(|a, b| preference(a).total_cmp(&preference(b)))?;

    let url = best.get("url").and_then(Value::as_str)?;
    url_path_extension(url)
}

/// `preference` of a thumbnail entry; entries without one rank lowest.
fn preference(thumbnail: &Value) -> f64 {
    thumbnail
        .get("preference")
        .and_then(Value::as_f64)
        .unwrap_or(f64::NEG_INFINITY)
}

fn url_path_extension(url: &str) -> Option<String> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or(url).to_string(),
    };
    let last_segment = path.rsplit('/').next()?;
    let (_, ext) = last_segment.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
