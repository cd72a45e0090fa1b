//! HTTP helpers that present themselves as a regular browser.
//!
//! Some sites serve reduced markup (without the embedded data blobs) to
//! clients that do not look like a browser, so every request carries the
//! same navigation headers a desktop browser would send.

use reqwest::header::{self, HeaderMap, HeaderValue};
use std::path::{Path, PathBuf};

use crate::core::config::network;
use crate::core::error::{AppError, AppResult};
use crate::download::thumbnail::detect_image_format;

/// Headers sent with every request.
const BROWSER_HEADERS: &[(&str, &str)] = &[
    (
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
    ),
    ("accept-language", "en-US,en;q=0.5"),
    ("upgrade-insecure-requests", "1"),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "same-origin"),
    ("sec-gpc", "1"),
    ("cache-control", "max-age=0"),
];

/// Builds an HTTP client with browser-like defaults.
pub fn browser_client() -> AppResult<reqwest::Client> {
    let mut headers = HeaderMap::new();
    for (name, value) in BROWSER_HEADERS {
        headers.insert(*name, HeaderValue::from_static(value));
    }

    reqwest::Client::builder()
        .user_agent(network::USER_AGENT)
        .default_headers(headers)
        .timeout(network::timeout())
        .build()
        .map_err(AppError::Http)
}

/// Fetches a page body as text.
///
/// # Errors
///
/// Returns an error if:
/// - the request could not be sent
/// - the response status is not successful
/// - the body could not be read
pub async fn fetch_page(client: &reqwest::Client, url: &str) -> AppResult<String> {
    let resp = client.get(url).send().await?;

    if !resp.status().is_success() {
        return Err(AppError::HttpStatus(resp.status()));
    }

    Ok(resp.text().await?)
}

/// Downloads an image to `dest_stem` plus an extension derived from the
/// response's Content-Type, or from the file's magic bytes when the header
/// is missing or not an image type.
pub async fn download_image(client: &reqwest::Client, url: &str, dest_stem: &Path) -> AppResult<PathBuf> {
    let resp = client.get(url).send().await?;

    if !resp.status().is_success() {
        return Err(AppError::HttpStatus(resp.status()));
    }

    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = resp.bytes().await?;

    let ext = content_type
        .as_deref()
        .and_then(extension_for_mime)
        .or_else(|| detect_image_format(&bytes).extension().map(str::to_string))
        .ok_or_else(|| AppError::Auxiliary(format!("Response from {} is not a recognised image", url)))?;

    let dest = append_extension(dest_stem, &ext);
    tokio::fs::write(&dest, &bytes).await?;
    log::debug!("Saved {} ({} bytes)", dest.display(), bytes.len());

    Ok(dest)
}

/// File extension for an image MIME type (`image/jpeg` → `jpg`).
pub fn extension_for_mime(content_type: &str) -> Option<String> {
    let mime: mime::Mime = content_type.parse().ok()?;
    if mime.type_() != mime::IMAGE {
        return None;
    }

    let ext = match mime.subtype().as_str() {
        "jpeg" | "jpg" | "pjpeg" => "jpg".to_string(),
        "svg" => "svg".to_string(),
        "x-icon" | "vnd.microsoft.icon" => "ico".to_string(),
        other => other.to_ascii_lowercase(),
    };
    Some(ext)
}

fn append_extension(stem: &Path, ext: &str) -> PathBuf {
    let mut name = stem.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}
