//! URL → provider classification.
//!
//! The provider tag selects the command template, the naming template and
//! the organize mode. It is resolved once per URL and passed by value.

use std::fmt;

/// Content source of a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProviderTag {
    /// Any site without a dedicated template
    #[default]
    Default,
    /// Main video site
    VideoSite,
    /// Music subdomain of the video site; collections of audio tracks
    VideoSiteMusic,
    /// Live streaming site with clips and VODs
    LiveClipSite,
}

/// How the artifacts of a provider are laid out after download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrganizeMode {
    /// One merged media file plus sidecars
    SingleFile,
    /// A collection of tracks without a primary file
    Batch,
}

/// Host markers in priority order. A marker must come before any marker
/// that is a substring of it.
const HOST_MARKERS: &[(&str, ProviderTag)] = &[
    ("music.youtube.com", ProviderTag::VideoSiteMusic),
    ("youtube.com", ProviderTag::VideoSite),
    ("youtu.be", ProviderTag::VideoSite),
    ("twitch.tv", ProviderTag::LiveClipSite),
];

impl ProviderTag {
    /// Classifies a URL. Never fails; unknown sites map to `Default`.
    pub fn resolve(url: &str) -> Self {
        let url_lower = url.to_lowercase();
        HOST_MARKERS
            .iter()
            .find(|(marker, _)| url_lower.contains(marker))
            .map(|(_, tag)| *tag)
            .unwrap_or_default()
    }

    pub fn organize_mode(&self) -> OrganizeMode {
        match self {
            ProviderTag::VideoSiteMusic => OrganizeMode::Batch,
            ProviderTag::Default | ProviderTag::VideoSite | ProviderTag::LiveClipSite => OrganizeMode::SingleFile,
        }
    }

    /// Whether this provider only delivers audio.
    pub fn is_audio_only(&self) -> bool {
        matches!(self, ProviderTag::VideoSiteMusic)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProviderTag::Default => "default",
            ProviderTag::VideoSite => "video-site",
            ProviderTag::VideoSiteMusic => "video-site-music",
            ProviderTag::LiveClipSite => "live-clip-site",
        }
    }
}

impl fmt::Display for ProviderTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
