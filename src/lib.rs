//! vidarc - archive online video and audio with yt-dlp
//!
//! For every URL the downloader runs inside a private workspace, its log is
//! analyzed to find out whether the download worked and what it produced,
//! and the results are moved into one directory per item.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging, process execution, helpers
//! - `download`: providers, command building, log analysis, organizing,
//!   auxiliary tasks and the per-URL pipeline
//! - `cli`: command line surface

pub mod cli;
pub mod core;
pub mod download;

// Re-export commonly used types for convenience
pub use crate::core::{config, AppError, AppResult, ArchiveFailure};
pub use crate::download::{archive_url, archive_urls, ArchiveOutcome, ArchiveSettings, AuxRegistry, ProviderTag};
