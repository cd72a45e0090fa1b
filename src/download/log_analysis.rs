//! Recovers structured facts from yt-dlp's human-readable output.
//!
//! The tool has no stable schema for what it prints, so completion, errors
//! and the produced filename are all derived from well-known text markers:
//!
//! ```text
//! [download] Destination: Title (20200101) [Channel, id].f137.mp4
//! [download] 100% of   10.00MiB in 00:00:05 at 2.00MiB/s
//! [Merger] Merging formats into "Title (20200101) [Channel, id].mp4"
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::core::error::LogErrorKind;
use crate::core::utils::{escape_filename, strip_format_suffix};
use crate::download::provider::{OrganizeMode, ProviderTag};

static COMPLETE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)^\[download\]\s+100(?:\.0+)?%").expect("completion regex"));

static DESTINATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)^\[download\] destination: (.+?)\s*$").expect("destination regex"));

static MERGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?mi)^\[Merger\] Merging formats into "(.+?)"\s*$"#).expect("merge regex"));

static PROGRESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[download\]\s+(\d{1,3}(?:\.\d+)?)%").expect("progress regex"));

/// Error phrases in priority order; the first one present wins.
const ERROR_PHRASES: &[(&str, LogErrorKind)] = &[
    ("requested format is not available", LogErrorKind::FormatUnavailable),
    ("nodename nor servname provided, or not known", LogErrorKind::HostUnreachable),
    ("name or service not known", LogErrorKind::HostUnreachable),
    ("temporary failure in name resolution", LogErrorKind::HostUnreachable),
    ("getaddrinfo failed", LogErrorKind::HostUnreachable),
    ("unable to download video data", LogErrorKind::HostUnreachable),
    ("traceback (most recent call last)", LogErrorKind::Exception),
];

/// Structured outcome of one downloader run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogAnalysis {
    /// A line announced 100% download progress
    pub is_complete: bool,
    pub has_errors: bool,
    pub error_kind: Option<LogErrorKind>,
    /// Captured output with a guaranteed trailing newline
    pub normalized_log: String,
    /// Stem used for the item directory (and the primary file in single-file mode)
    pub basename: Option<String>,
    /// Single-file mode: one merged media file named after `basename`
    pub has_primary_output_file: bool,
}

impl LogAnalysis {
    pub fn organize_mode(&self) -> OrganizeMode {
        if self.has_primary_output_file {
            OrganizeMode::SingleFile
        } else {
            OrganizeMode::Batch
        }
    }
}

/// Analyzes captured output for `provider`.
///
/// In batch mode the basename comes from the metadata sidecar of the first
/// downloaded track, which is looked up relative to `workspace`.
pub fn analyze_log(output: &str, provider: ProviderTag, workspace: &Path) -> LogAnalysis {
    let normalized_log = normalize_log(output);
    let is_complete = is_download_complete(&normalized_log);
    let error_kind = detect_error(&normalized_log);

    let (basename, has_primary_output_file) = match provider.organize_mode() {
        OrganizeMode::SingleFile => (single_file_basename(&normalized_log), true),
        OrganizeMode::Batch => (batch_basename(&normalized_log, workspace), false),
    };

    if !is_complete {
        if let Some(percent) = last_progress(&normalized_log) {
            log::debug!("Download progress stopped at {:.1}%", percent);
        }
    }

    LogAnalysis {
        is_complete,
        has_errors: error_kind.is_some(),
        error_kind,
        normalized_log,
        basename,
        has_primary_output_file,
    }
}

/// Guarantees a trailing line terminator.
pub fn normalize_log(output: &str) -> String {
    let mut log = output.to_string();
    if !log.ends_with('\n') {
        log.push('\n');
    }
    log
}

pub fn is_download_complete(log: &str) -> bool {
    COMPLETE_RE.is_match(log)
}

/// Case-insensitive scan for the known error phrases.
pub fn detect_error(log: &str) -> Option<LogErrorKind> {
    let log_lower = log.to_lowercase();
    ERROR_PHRASES
        .iter()
        .find(|(phrase, _)| log_lower.contains(phrase))
        .map(|(_, kind)| *kind)
}

/// Percentage of a `[download]  45.2% of ...` progress line.
pub fn parse_progress_percent(line: &str) -> Option<f32> {
    let caps = PROGRESS_RE.captures(line.trim_start())?;
    caps.get(1)?.as_str().parse::<f32>().ok().map(|p| p.clamp(0.0, 100.0))
}

fn last_progress(log: &str) -> Option<f32> {
    log.lines().rev().find_map(parse_progress_percent)
}

/// Every path announced on a `[download] Destination:` line, in order.
pub fn destination_paths(log: &str) -> Vec<String> {
    DESTINATION_RE
        .captures_iter(log)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Picks the media destination among several announcements.
///
/// Metadata downloads are announced the same way as media, so the first
/// path that does not end in `.json` is preferred.
pub fn choose_destination(paths: &[String]) -> Option<&str> {
    paths
        .iter()
        .find(|p| !p.to_lowercase().ends_with(".json"))
        .or_else(|| paths.first())
        .map(String::as_str)
}

/// File named on the `[Merger] Merging formats into "..."` line.
pub fn merge_target(log: &str) -> Option<String> {
    MERGE_RE
        .captures(log)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

fn single_file_basename(log: &str) -> Option<String> {
    let destinations = destination_paths(log);
    let winner = merge_target(log).or_else(|| choose_destination(&destinations).map(str::to_string))?;
    file_stem(&winner)
}

fn file_stem(path: &str) -> Option<String> {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
}

fn batch_basename(log: &str, workspace: &Path) -> Option<String> {
    let first = destination_paths(log).into_iter().next()?;
    let sidecar = sidecar_for(&first, workspace)?;

    let content = match fs_err::read_to_string(&sidecar) {
        Ok(content) => content,
        Err(e) => {
            log::warn!("Metadata sidecar for first track not readable: {}", e);
            return None;
        }
    };

    match serde_json::from_str::<Value>(&content) {
        Ok(info) => collection_title(&info),
        Err(e) => {
            log::warn!("Metadata sidecar {} is not valid JSON: {}", sidecar.display(), e);
            None
        }
    }
}

/// `<dir>/<stem without format id>.info.json` for an announced destination.
pub fn sidecar_for(destination: &str, workspace: &Path) -> Option<PathBuf> {
    let dest = Path::new(destination);
    let stem = dest.file_stem()?.to_string_lossy().into_owned();
    let parent = dest.parent().unwrap_or_else(|| Path::new(""));
    let dir = if parent.is_absolute() {
        parent.to_path_buf()
    } else {
        workspace.join(parent)
    };
    Some(dir.join(format!("{}.info.json", strip_format_suffix(&stem))))
}

/// Composite, filename-safe collection title:
/// `Creator - Album (Year) [PlaylistId]`.
pub fn collection_title(info: &Value) -> Option<String> {
    let creator = first_text(info, &["creator", "artist", "uploader", "channel"]);
    let album = first_text(info, &["album", "playlist_title", "playlist"]);

    let mut title = match (creator, album) {
        (Some(c), Some(a)) => format!("{} - {}", c, a),
        (Some(c), None) => c,
        (None, Some(a)) => a,
        (None, None) => return None,
    };
    if let Some(year) = first_text(info, &["release_year"]) {
        title.push_str(&format!(" ({})", year));
    }
    if let Some(id) = first_text(info, &["playlist_id"]) {
        title.push_str(&format!(" [{}]", id));
    }

    Some(escape_filename(&title))
}

/// First non-empty string or number among `keys`.
fn first_text(info: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match info.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
