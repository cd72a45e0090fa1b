//! Archive jobs: from a URL to an organized item directory

pub mod auxiliary;
pub mod command;
pub mod fetch;
pub mod fsops;
pub mod log_analysis;
pub mod organizer;
pub mod pipeline;
pub mod provider;
pub mod thumbnail;

// Re-exports for convenience
pub use auxiliary::{AuxRegistry, AuxiliaryTask};
pub use command::{CommandBuilder, DownloadCommand, DownloadOptions};
pub use log_analysis::{analyze_log, LogAnalysis};
pub use organizer::organize;
pub use pipeline::{archive_url, archive_urls, check_writable, ArchiveOutcome, ArchiveSettings};
pub use provider::{OrganizeMode, ProviderTag};
