//! Builder for yt-dlp invocations.
//!
//! Every provider gets three independent sub-choices: the fixed flag set,
//! the format selector and the output naming template. Each one falls back
//! to the default template on its own, so a provider may override only the
//! pieces it cares about.

use crate::core::config::{self, pacing};
use crate::download::provider::ProviderTag;

/// User-selected options that shape the command and the job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadOptions {
    /// Put the upload date in front of the title in output names
    pub date_first: bool,
    /// Keep the workspace directory after the job finishes
    pub keep_workspace: bool,
}

/// A ready-to-run downloader command, paired with the provider it was built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadCommand {
    pub program: String,
    pub args: Vec<String>,
    pub provider: ProviderTag,
}

impl DownloadCommand {
    /// Full token list: executable first, URL last.
    pub fn tokens(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }

    /// Single-line rendering for logs.
    pub fn display(&self) -> String {
        self.tokens().join(" ")
    }
}

/// Flags shared by every video provider.
///
/// The two `--parse-metadata` pairs keep Content ID matches from
/// overwriting the embedded title and artist.
const VIDEO_FLAGS: &[&str] = &[
    "--no-colors",
    "--newline",
    "--verbose",
    "--sleep-requests",
    pacing::SLEEP_REQUESTS,
    "--sleep-interval",
    pacing::VIDEO_SLEEP_INTERVAL,
    "--max-sleep-interval",
    pacing::VIDEO_MAX_SLEEP_INTERVAL,
    "--ignore-errors",
    "--no-continue",
    "--add-metadata",
    "--write-description",
    "--write-info-json",
    "--write-thumbnail",
    "--embed-thumbnail",
    "--all-subs",
    "--embed-subs",
    "--get-comments",
    "--match-filter",
    "!is_live & !live",
    "--merge-output-format",
    "mp4",
    "--parse-metadata",
    "%(title)s:%(meta_title)s",
    "--parse-metadata",
    "%(uploader)s:%(meta_artist)s",
];

/// Flags for audio-only providers.
const AUDIO_FLAGS: &[&str] = &[
    "--no-colors",
    "--newline",
    "--verbose",
    "--sleep-requests",
    pacing::SLEEP_REQUESTS,
    "--sleep-interval",
    pacing::AUDIO_SLEEP_INTERVAL,
    "--max-sleep-interval",
    pacing::AUDIO_MAX_SLEEP_INTERVAL,
    "--ignore-errors",
    "--no-continue",
    "--add-metadata",
    "--write-info-json",
    "--write-thumbnail",
    "--embed-thumbnail",
    "--extract-audio",
    "--yes-playlist",
];

const DEFAULT_FORMAT: &str = "(bestvideo)+(bestaudio)/best";
const VIDEO_SITE_FORMAT: &str = "(bestvideo)+(bestaudio[acodec^=opus]/bestaudio)/best";
const MUSIC_FORMAT: &str = "bestaudio[acodec^=opus]/bestaudio";

const TRACK_TEMPLATE: &str = "%(playlist_index)02d. %(title)s [%(id)s].%(ext)s";

/// Builder for constructing download commands.
///
/// # Example
///
/// ```
/// use vidarc::download::command::{CommandBuilder, DownloadOptions};
/// use vidarc::download::provider::ProviderTag;
///
/// let url = "https://www.youtube.com/watch?v=abc";
/// let cmd = CommandBuilder::new(url, ProviderTag::resolve(url))
///     .options(DownloadOptions { date_first: true, keep_workspace: false })
///     .executable("yt-dlp")
///     .build();
/// assert_eq!(cmd.tokens().first(), Some(&"yt-dlp"));
/// assert_eq!(cmd.tokens().last(), Some(&url));
/// ```
pub struct CommandBuilder {
    url: String,
    provider: ProviderTag,
    options: DownloadOptions,
    program: Option<String>,
}

impl CommandBuilder {
    pub fn new(url: &str, provider: ProviderTag) -> Self {
        Self {
            url: url.to_string(),
            provider,
            options: DownloadOptions::default(),
            program: None,
        }
    }

    pub fn options(mut self, options: DownloadOptions) -> Self {
        self.options = options;
        self
    }

    /// Override the executable (defaults to `YTDL_BIN`).
    pub fn executable(mut self, program: &str) -> Self {
        self.program = Some(program.to_string());
        self
    }

    /// Assembles the command. Total: never fails for any input.
    pub fn build(self) -> DownloadCommand {
        let mut args: Vec<String> = fixed_flags(self.provider).iter().map(|s| s.to_string()).collect();

        args.push("--format".to_string());
        args.push(format_selector(self.provider).to_string());

        args.push("--output".to_string());
        args.push(output_template(self.provider, self.options.date_first));

        args.push(self.url);

        DownloadCommand {
            program: self.program.unwrap_or_else(|| config::YTDL_BIN.clone()),
            args,
            provider: self.provider,
        }
    }
}

fn fixed_flags(provider: ProviderTag) -> &'static [&'static str] {
    if provider.is_audio_only() {
        AUDIO_FLAGS
    } else {
        VIDEO_FLAGS
    }
}

fn format_selector(provider: ProviderTag) -> &'static str {
    match provider {
        ProviderTag::VideoSite => VIDEO_SITE_FORMAT,
        ProviderTag::VideoSiteMusic => MUSIC_FORMAT,
        _ => DEFAULT_FORMAT,
    }
}

/// Name of the field that identifies who published the item.
fn uploader_field(provider: ProviderTag) -> &'static str {
    match provider {
        ProviderTag::LiveClipSite => "uploader",
        _ => "channel",
    }
}

fn output_template(provider: ProviderTag, date_first: bool) -> String {
    if provider == ProviderTag::VideoSiteMusic {
        // The collection directory already carries the release year.
        return TRACK_TEMPLATE.to_string();
    }

    let uploader = uploader_field(provider);
    if date_first {
        format!("%(upload_date)s %(title)s [%({})s, %(id)s].%(ext)s", uploader)
    } else {
        format!("%(title)s (%(upload_date)s) [%({})s, %(id)s].%(ext)s", uploader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn build(url: &str, date_first: bool) -> DownloadCommand {
        CommandBuilder::new(url, ProviderTag::resolve(url))
            .options(DownloadOptions {
                date_first,
                keep_workspace: false,
            })
            .executable("yt-dlp")
            .build()
    }

    fn value_after<'a>(cmd: &'a DownloadCommand, flag: &str) -> Option<&'a str> {
        let pos = cmd.args.iter().position(|a| a == flag)?;
        cmd.args.get(pos + 1).map(String::as_str)
    }

    #[test]
    fn test_starts_with_executable_and_ends_with_url() {
        for url in [
            "https://www.youtube.com/watch?v=a",
            "https://music.youtube.com/playlist?list=b",
            "https://www.twitch.tv/videos/1",
            "https://example.org/clip",
            "",
        ] {
            let cmd = build(url, false);
            let tokens = cmd.tokens();
            assert_eq!(tokens.first(), Some(&"yt-dlp"));
            assert_eq!(tokens.last(), Some(&url));
        }
    }

    #[test]
    fn test_default_naming_template() {
        let cmd = build("https://example.org/clip", false);
        assert_eq!(
            value_after(&cmd, "--output"),
            Some("%(title)s (%(upload_date)s) [%(channel)s, %(id)s].%(ext)s")
        );
    }

    #[test]
    fn test_date_first_puts_upload_date_in_front() {
        let cmd = build("https://example.org/clip", true);
        let template = value_after(&cmd, "--output").unwrap();
        assert!(template.starts_with("%(upload_date)s"), "template: {}", template);
    }

    #[test]
    fn test_live_clip_site_uses_uploader_field() {
        let cmd = build("https://www.twitch.tv/videos/1", false);
        assert_eq!(
            value_after(&cmd, "--output"),
            Some("%(title)s (%(upload_date)s) [%(uploader)s, %(id)s].%(ext)s")
        );
        // Quality falls back to the default selector independently.
        assert_eq!(value_after(&cmd, "--format"), Some(DEFAULT_FORMAT));
    }

    #[test]
    fn test_video_site_prefers_opus_audio() {
        let cmd = build("https://www.youtube.com/watch?v=a", false);
        assert_eq!(value_after(&cmd, "--format"), Some(VIDEO_SITE_FORMAT));
        assert!(cmd.args.iter().any(|a| a == "--embed-subs"));
        assert_eq!(value_after(&cmd, "--sleep-interval"), Some("5"));
    }

    #[test]
    fn test_music_extracts_audio_with_short_pacing() {
        let cmd = build("https://music.youtube.com/playlist?list=b", true);
        assert_eq!(cmd.provider, ProviderTag::VideoSiteMusic);
        assert!(cmd.args.iter().any(|a| a == "--extract-audio"));
        assert!(!cmd.args.iter().any(|a| a == "--embed-subs"));
        assert_eq!(value_after(&cmd, "--sleep-interval"), Some("1"));
        assert_eq!(value_after(&cmd, "--max-sleep-interval"), Some("5"));
        assert_eq!(value_after(&cmd, "--format"), Some(MUSIC_FORMAT));
        assert_eq!(value_after(&cmd, "--output"), Some(TRACK_TEMPLATE));
    }

    #[test]
    fn test_display_joins_tokens() {
        let cmd = DownloadCommand {
            program: "yt-dlp".into(),
            args: vec!["--newline".into(), "https://x".into()],
            provider: ProviderTag::Default,
        };
        assert_eq!(cmd.display(), "yt-dlp --newline https://x");
    }
}
