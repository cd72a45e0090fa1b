//! Core utilities, configuration, errors, and process execution

pub mod config;
pub mod error;
pub mod logging;
pub mod process;
pub mod utils;

// Re-exports for convenience
pub use error::{AppError, AppResult, ArchiveFailure, LogErrorKind};
pub use logging::{init_logger, log_downloader_configuration};
