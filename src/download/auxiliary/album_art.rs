//! Album art for music collections.
//!
//! The collection page embeds its state in an inline `initialData` script.
//! The header thumbnail list in that state points at a resizable image URL
//! (`...=w544-h544-l90-rj`); rewriting the size token gives a full-size and a
//! folder-sized cover, saved next to the tracks as `folder-orig.<ext>` and
//! `folder.<ext>`.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use select::document::Document;
use select::predicate::Name;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use url::Url;

use super::script_literal::extract_array_variable;
use super::AuxiliaryTask;
use crate::core::config::album_art;
use crate::core::error::{AppError, AppResult};
use crate::download::fetch::{browser_client, download_image, fetch_page};

const STATE_VARIABLE: &str = "initialData";
const BROWSE_PATH: &str = "/browse";

/// Where the header thumbnails live in the `/browse` payload, newest layout last.
const HEADER_THUMBNAIL_POINTERS: &[&str] = &[
    "/header/musicDetailHeaderRenderer/thumbnail/croppedSquareThumbnailRenderer/thumbnail/thumbnails",
    "/header/musicImmersiveHeaderRenderer/thumbnail/musicThumbnailRenderer/thumbnail/thumbnails",
    "/header/musicResponsiveHeaderRenderer/thumbnail/musicThumbnailRenderer/thumbnail/thumbnails",
];

static SIZE_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"=w\d+-h\d+-l\d+-").expect("Failed to compile size token regex"));

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Thumbnail {
    pub url: String,
    #[serde(default)]
    pub width: u64,
    #[serde(default)]
    pub height: u64,
}

impl Thumbnail {
    fn area(&self) -> u64 {
        self.width.saturating_mul(self.height)
    }
}

/// Cover image URLs derived from one thumbnail.
#[derive(Debug, Clone, PartialEq)]
pub struct AlbumArtUrls {
    pub large: String,
    pub small: String,
}

/// Downloads the collection's cover art into the organized directory.
#[derive(Debug, Default)]
pub struct AlbumArtTask;

impl AlbumArtTask {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuxiliaryTask for AlbumArtTask {
    fn name(&self) -> &str {
        "album-art"
    }

    async fn run(&self, url: &str, item_dir: &Path) -> AppResult<()> {
        let client = browser_client()?;
        let html = fetch_page(&client, url).await?;
        let art = scrape_album_art(&html, url)?;
        log::debug!("Album art: large={} small={}", art.large, art.small);

        let small = download_image(&client, &art.small, &item_dir.join(album_art::SMALL_STEM)).await?;
        let large = download_image(&client, &art.large, &item_dir.join(album_art::LARGE_STEM)).await?;
        log::info!("Saved album art {} and {}", small.display(), large.display());

        Ok(())
    }
}

/// Finds the cover art URLs in a collection page.
///
/// # Errors
///
/// Returns `AppError::Auxiliary` when the page has no readable state script,
/// no `/browse` entry, or no header thumbnails.
pub fn scrape_album_art(html: &str, page_url: &str) -> AppResult<AlbumArtUrls> {
    let script = find_state_script(html)
        .ok_or_else(|| AppError::Auxiliary(format!("No script mentioning '{}' on the page", STATE_VARIABLE)))?;

    let entries = extract_array_variable(&script, STATE_VARIABLE)
        .map_err(|e| AppError::Auxiliary(format!("Could not read '{}': {}", STATE_VARIABLE, e)))?;

    let browse = browse_data(&entries)?;
    let thumbnails = header_thumbnails(&browse);
    let best = largest_thumbnail(&thumbnails)
        .ok_or_else(|| AppError::Auxiliary("No album thumbnails in the page data".to_string()))?;

    let base = Url::parse(page_url).map_err(|e| AppError::Auxiliary(format!("Invalid page URL: {}", e)))?;
    let absolute = base
        .join(&best.url)
        .map_err(|e| AppError::Auxiliary(format!("Invalid thumbnail URL '{}': {}", best.url, e)))?;

    Ok(AlbumArtUrls {
        large: resize_image_url(absolute.as_str(), album_art::LARGE_SIZE, album_art::LARGE_QUALITY),
        small: resize_image_url(absolute.as_str(), album_art::SMALL_SIZE, album_art::SMALL_QUALITY),
    })
}

/// Replaces the `=w<W>-h<H>-l<Q>-` size token; URLs without one come back unchanged.
pub fn resize_image_url(url: &str, size: u32, quality: u32) -> String {
    if !SIZE_TOKEN_RE.is_match(url) {
        log::debug!("No size token in {}", url);
    }
    SIZE_TOKEN_RE
        .replace(url, format!("=w{size}-h{size}-l{quality}-").as_str())
        .into_owned()
}

pub fn largest_thumbnail(thumbnails: &[Thumbnail]) -> Option<&Thumbnail> {
    thumbnails.iter().max_by_key(|t| t.area())
}

fn find_state_script(html: &str) -> Option<String> {
    let document = Document::from(html);
    document
        .find(Name("script"))
        .map(|node| node.text())
        .find(|text| text.contains(STATE_VARIABLE))
}

/// The parsed `data` payload of the `/browse` entry.
fn browse_data(entries: &[Value]) -> AppResult<Value> {
    let entry = entries
        .iter()
        .find(|e| e.get("path").and_then(Value::as_str) == Some(BROWSE_PATH))
        .ok_or_else(|| AppError::Auxiliary(format!("No '{}' entry in the page data", BROWSE_PATH)))?;

    match entry.get("data") {
        Some(Value::String(raw)) => Ok(serde_json::from_str(raw)?),
        Some(data @ Value::Object(_)) => Ok(data.clone()),
        _ => Err(AppError::Auxiliary(format!("'{}' entry has no data", BROWSE_PATH))),
    }
}

/// Header thumbnails by known location, else the first thumbnail list found
/// under `header`, else anywhere.
fn header_thumbnails(data: &Value) -> Vec<Thumbnail> {
    let known = HEADER_THUMBNAIL_POINTERS.iter().filter_map(|p| data.pointer(p));
    let searched = [data.get("header"), Some(data)]
        .into_iter()
        .flatten()
        .filter_map(find_thumbnail_list);

    known
        .chain(searched)
        .map(parse_thumbnails)
        .find(|list| !list.is_empty())
        .unwrap_or_default()
}

fn find_thumbnail_list(value: &Value) -> Option<&Value> {
    match value {
        Value::Object(map) => {
            if let Some(list @ Value::Array(items)) = map.get("thumbnails") {
                if items.iter().any(|t| t.get("url").is_some()) {
                    return Some(list);
                }
            }
            map.values().find_map(find_thumbnail_list)
        }
        Value::Array(items) => items.iter().find_map(find_thumbnail_list),
        _ => None,
    }
}

fn parse_thumbnails(list: &Value) -> Vec<Thumbnail> {
    list.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|t| serde_json::from_value::<Thumbnail>(t.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    /// Encodes `data` the way the page does: a JS string of `\xHH`-escaped JSON.
    fn js_escaped(data: &Value) -> String {
        data.to_string()
            .chars()
            .map(|c| match c {
                '{' | '}' | '"' | '[' | ']' | '\'' | '\\' => format!("\\x{:02x}", c as u32),
                other => other.to_string(),
            })
            .collect()
    }

    fn page(data: &Value) -> String {
        format!(
            r#"<html><head><script>var ytcfg = {{}};</script></head><body>
            <script nonce="x">try {{ const initialData = []; initialData.push({{path: '\/browse', params: JSON.parse('\x7b\x7d'), data: '{}'}}); ytcfg.set({{'INITIAL': 1}}); }} catch (e) {{}}</script>
            </body></html>"#,
            js_escaped(data)
        )
    }

    fn browse_payload() -> Value {
        json!({
            "header": {
                "musicDetailHeaderRenderer": {
                    "thumbnail": { "croppedSquareThumbnailRenderer": { "thumbnail": { "thumbnails": [
                        { "url": "https://lh3.example/abc=w60-h60-l90-rj", "width": 60, "height": 60 },
                        { "url": "https://lh3.example/abc=w544-h544-l90-rj", "width": 544, "height": 544 },
                        { "url": "https://lh3.example/abc=w226-h226-l90-rj", "width": 226, "height": 226 }
                    ] } } }
                }
            }
        })
    }

    #[test]
    fn test_resize_image_url() {
        assert_eq!(
            resize_image_url("https://lh3.example/abc=w544-h544-l90-rj", 5000, 100),
            "https://lh3.example/abc=w5000-h5000-l100-rj"
        );
        assert_eq!(resize_image_url("https://x/plain.jpg", 500, 90), "https://x/plain.jpg");
    }

    #[test]
    fn test_scrape_album_art_from_page() {
        let html = page(&browse_payload());

        let art = scrape_album_art(&html, "https://music.youtube.com/playlist?list=OLAK").unwrap();

        assert_eq!(
            art,
            AlbumArtUrls {
                large: "https://lh3.example/abc=w5000-h5000-l100-rj".to_string(),
                small: "https://lh3.example/abc=w500-h500-l90-rj".to_string(),
            }
        );
    }

    #[test]
    fn test_relative_thumbnail_urls_resolve_against_page() {
        let data = json!({ "header": { "thumbnails": [
            { "url": "//img.example/c=w100-h100-l90-rj", "width": 100, "height": 100 }
        ] } });

        let art = scrape_album_art(&page(&data), "https://music.example/album").unwrap();

        assert_eq!(art.small, "https://img.example/c=w500-h500-l90-rj");
    }

    #[test]
    fn test_page_without_state_fails() {
        let err = scrape_album_art("<html><script>var x = 1;</script></html>", "https://m.example/").unwrap_err();
        assert!(matches!(err, AppError::Auxiliary(_)));
    }

    #[test]
    fn test_page_without_thumbnails_fails() {
        let err = scrape_album_art(&page(&json!({ "header": {} })), "https://m.example/").unwrap_err();
        assert!(matches!(err, AppError::Auxiliary(_)));
    }

    #[test]
    fn test_largest_thumbnail_by_area() {
        let thumbs = vec![
            Thumbnail { url: "a".into(), width: 100, height: 50 },
            Thumbnail { url: "b".into(), width: 60, height: 90 },
        ];
        assert_eq!(largest_thumbnail(&thumbs).map(|t| t.url.as_str()), Some("b"));
        assert_eq!(largest_thumbnail(&[]), None);
    }
}
