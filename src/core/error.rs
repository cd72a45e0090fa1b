use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Error kinds recognised in the downloader's own output.
///
/// Detection order matters: the first phrase found in the log wins, so
/// a format problem is reported even when a later network error follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogErrorKind {
    /// "requested format is not available"
    FormatUnavailable,
    /// DNS failures and "unable to download video data"
    HostUnreachable,
    /// The tool crashed with an unhandled exception
    Exception,
    /// Something went wrong but no known phrase matched
    Unknown,
}

impl LogErrorKind {
    /// Fixed, human readable description shown to the user.
    pub fn description(&self) -> &'static str {
        match self {
            LogErrorKind::FormatUnavailable => "Given format was not available.",
            LogErrorKind::HostUnreachable => "Server name not known or video data unavailable. Try again later.",
            LogErrorKind::Exception => "An exception occurred while running yt-dlp.",
            LogErrorKind::Unknown => "Unknown error; see log for details.",
        }
    }

    /// Short label for log lines.
    pub fn label(&self) -> &'static str {
        match self {
            LogErrorKind::FormatUnavailable => "format-unavailable",
            LogErrorKind::HostUnreachable => "host-unreachable",
            LogErrorKind::Exception => "exception",
            LogErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for LogErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Centralized error types for the archiver
///
/// Every failure inside an archive job is converted to this enum and then
/// wrapped into an [`ArchiveFailure`] at the pipeline boundary.
#[derive(Error, Debug)]
pub enum AppError {
    /// The destination root cannot be written to; fatal for the whole batch
    #[error("Destination directory is not writable: {}", .0.display())]
    WorkspaceUnwritable(PathBuf),

    /// The downloader could not be started or exited abnormally
    #[error("Process error: {0}")]
    Process(String),

    /// The downloader's log contains a known error phrase
    #[error("{kind}")]
    DetectedLog { kind: LogErrorKind },

    /// Unexpected filesystem state while organizing or relocating files
    #[error("File operation failed: {0}")]
    FileOperation(String),

    /// Post-processing task failure (cover art and similar)
    #[error("Auxiliary task failed: {0}")]
    Auxiliary(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed metadata sidecars
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP/Fetch errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP status code errors
    #[error("HTTP request failed with status: {0}")]
    HttpStatus(reqwest::StatusCode),
}

impl AppError {
    /// Category label used in log lines and the final summary.
    pub fn category(&self) -> &'static str {
        match self {
            AppError::WorkspaceUnwritable(_) => "workspace_unwritable",
            AppError::Process(_) => "process",
            AppError::DetectedLog { .. } => "detected_log",
            AppError::FileOperation(_) | AppError::Io(_) | AppError::Json(_) => "file_operation",
            AppError::Auxiliary(_) | AppError::Http(_) | AppError::HttpStatus(_) => "auxiliary",
        }
    }

    /// The detected log error kind, if this error came from log analysis.
    pub fn log_error_kind(&self) -> Option<LogErrorKind> {
        match self {
            AppError::DetectedLog { kind } => Some(*kind),
            _ => None,
        }
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

/// A failed archive job: the originating reason plus the basename when
/// log analysis got far enough to resolve one.
#[derive(Debug)]
pub struct ArchiveFailure {
    pub reason: AppError,
    pub basename: Option<String>,
}

impl ArchiveFailure {
    pub fn new(reason: AppError, basename: Option<String>) -> Self {
        Self { reason, basename }
    }
}

impl fmt::Display for ArchiveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.basename {
            Some(base) => write!(f, "{} ({})", self.reason, base),
            None => write!(f, "{}", self.reason),
        }
    }
}

impl std::error::Error for ArchiveFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.reason)
    }
}
