//! Configuration constants for the archiver

use once_cell::sync::Lazy;
use std::env;

/// Cached yt-dlp binary path
/// Read once at startup from YTDL_BIN environment variable or defaults to "yt-dlp"
pub static YTDL_BIN: Lazy<String> = Lazy::new(|| env::var("YTDL_BIN").unwrap_or_else(|_| "yt-dlp".to_string()));

/// Optional log file path
/// Read from VIDARC_LOG_FILE environment variable
/// When unset, logs only go to stderr
pub static LOG_FILE_PATH: Lazy<Option<String>> =
    Lazy::new(|| env::var("VIDARC_LOG_FILE").ok().filter(|p| !p.trim().is_empty()));

/// Archive layout configuration
pub mod archive {
    /// Attempts made to find a free "<name> N" path before giving up
    pub const MAX_COLLISION_ATTEMPTS: u32 = 99;

    /// Prefix of the per-URL workspace directory created inside the destination root
    pub const WORKSPACE_PREFIX: &str = ".vidarc-";

    /// Name of the normalized downloader log inside the item directory
    pub const LOG_FILE_NAME: &str = "log.txt";

    /// Name of the pretty-printed metadata file in single-file mode
    pub const INFO_FILE_NAME: &str = "info.json";

    /// Stem of the renamed thumbnail in single-file mode
    pub const THUMB_STEM: &str = "thumb";

    /// Subdirectory holding sidecars in batch mode
    pub const METADATA_DIR: &str = "Metadata";
}

/// Request pacing handed to yt-dlp
///
/// Video pages are throttled aggressively, so video providers wait longer
/// between requests than audio-only providers with their smaller payloads.
pub mod pacing {
    /// Seconds between extractor requests
    pub const SLEEP_REQUESTS: &str = "1";

    /// Video providers: minimum/maximum seconds between downloads
    pub const VIDEO_SLEEP_INTERVAL: &str = "5";
    pub const VIDEO_MAX_SLEEP_INTERVAL: &str = "30";

    /// Audio providers: minimum/maximum seconds between downloads
    pub const AUDIO_SLEEP_INTERVAL: &str = "1";
    pub const AUDIO_MAX_SLEEP_INTERVAL: &str = "5";
}

/// Network configuration for auxiliary fetches
pub mod network {
    use std::time::Duration;

    /// Request timeout for HTTP requests (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }

    /// Browser identity presented to sites that serve different markup to bots
    pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.14; rv:98.0) Gecko/20100101 Firefox/98.0";
}

/// Album art sizes requested from the image CDN
pub mod album_art {
    pub const LARGE_SIZE: u32 = 5000;
    pub const LARGE_QUALITY: u32 = 100;
    pub const SMALL_SIZE: u32 = 500;
    pub const SMALL_QUALITY: u32 = 90;

    /// File stems written next to the organized tracks
    pub const LARGE_STEM: &str = "folder-orig";
    pub const SMALL_STEM: &str = "folder";
}
