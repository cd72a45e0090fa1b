//! Per-URL archive pipeline.
//!
//! One job per URL, strictly one after another:
//!   workspace → build command → run → analyze log → organize → auxiliary
//!   → relocate → cleanup
//!
//! Every job owns a fresh workspace created inside the destination root, so
//! the final move is a rename on the same filesystem. The downloader runs
//! with the workspace as its working directory; the process's own working
//! directory is never changed. Nothing inside a job propagates past
//! [`archive_url`]: failures come back as an [`ArchiveOutcome`].

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::core::config::{self, archive};
use crate::core::error::{AppError, AppResult, ArchiveFailure, LogErrorKind};
use crate::core::process::run_captured;
use crate::download::auxiliary::AuxRegistry;
use crate::download::command::{CommandBuilder, DownloadOptions};
use crate::download::fsops::move_no_clobber;
use crate::download::log_analysis::analyze_log;
use crate::download::organizer::organize;
use crate::download::provider::ProviderTag;

/// Everything a job needs besides the URL.
#[derive(Debug, Clone)]
pub struct ArchiveSettings {
    /// Where finished items end up; workspaces are created here too
    pub dest_root: PathBuf,
    /// Downloader executable
    pub executable: String,
    pub options: DownloadOptions,
    /// Echo the downloader's output to stdout while it runs
    pub echo_output: bool,
}

impl ArchiveSettings {
    pub fn new(dest_root: impl Into<PathBuf>) -> Self {
        Self {
            dest_root: dest_root.into(),
            executable: config::YTDL_BIN.clone(),
            options: DownloadOptions::default(),
            echo_output: true,
        }
    }

    pub fn options(mut self, options: DownloadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = executable.into();
        self
    }

    pub fn echo_output(mut self, echo: bool) -> Self {
        self.echo_output = echo;
        self
    }
}

/// Result of one archive job.
#[derive(Debug)]
pub struct ArchiveOutcome {
    pub success: bool,
    pub url: String,
    /// Final location of the item directory
    pub destination_path: Option<PathBuf>,
    pub error: Option<ArchiveFailure>,
}

impl ArchiveOutcome {
    fn archived(url: &str, path: PathBuf) -> Self {
        Self {
            success: true,
            url: url.to_string(),
            destination_path: Some(path),
            error: None,
        }
    }

    fn failed(url: &str, failure: ArchiveFailure) -> Self {
        Self {
            success: false,
            url: url.to_string(),
            destination_path: None,
            error: Some(failure),
        }
    }
}

/// Checks that `dir` accepts new files by creating and removing a probe file.
pub fn check_writable(dir: &Path) -> AppResult<()> {
    tempfile::Builder::new()
        .prefix(archive::WORKSPACE_PREFIX)
        .tempfile_in(dir)
        .map(drop)
        .map_err(|e| {
            log::debug!("Write probe in {} failed: {}", dir.display(), e);
            AppError::WorkspaceUnwritable(dir.to_path_buf())
        })
}

/// Archives `urls` in order.
///
/// The destination root is probed before each URL; an unwritable root stops
/// the batch with [`AppError::WorkspaceUnwritable`]. Individual job failures
/// do not stop it.
pub async fn archive_urls(
    urls: &[String],
    settings: &ArchiveSettings,
    registry: &AuxRegistry,
) -> AppResult<Vec<ArchiveOutcome>> {
    let mut outcomes = Vec::with_capacity(urls.len());
    for (i, url) in urls.iter().enumerate() {
        check_writable(&settings.dest_root)?;
        log::info!("Pipeline: [{}/{}] {}", i + 1, urls.len(), url);
        outcomes.push(archive_url(url, settings, registry).await);
    }
    Ok(outcomes)
}

/// Runs one archive job. Never fails; errors are reported in the outcome.
pub async fn archive_url(url: &str, settings: &ArchiveSettings, registry: &AuxRegistry) -> ArchiveOutcome {
    // ── Step 1: Workspace ──
    let workspace = match create_workspace(&settings.dest_root) {
        Ok(ws) => ws,
        Err(e) => {
            log::error!("Pipeline: could not create a workspace for {}: {}", url, e);
            return ArchiveOutcome::failed(url, ArchiveFailure::new(e, None));
        }
    };
    log::debug!("Pipeline: workspace {}", workspace.path().display());

    let provider = ProviderTag::resolve(url);
    log::info!("Pipeline: provider '{}' for {}", provider, url);

    let result = run_job(url, provider, workspace.path(), settings, registry).await;

    // ── Step 8: Cleanup ──
    release_workspace(workspace, settings.options.keep_workspace);

    match result {
        Ok(path) => {
            log::info!("Pipeline: archived {} to {}", url, path.display());
            ArchiveOutcome::archived(url, path)
        }
        Err(failure) => {
            log::error!(
                "Pipeline: failed to archive {} [{}]: {}",
                url,
                failure.reason.category(),
                failure
            );
            ArchiveOutcome::failed(url, failure)
        }
    }
}

fn create_workspace(dest_root: &Path) -> AppResult<TempDir> {
    tempfile::Builder::new()
        .prefix(archive::WORKSPACE_PREFIX)
        .tempdir_in(dest_root)
        .map_err(|e| {
            log::debug!("Workspace creation in {} failed: {}", dest_root.display(), e);
            AppError::WorkspaceUnwritable(dest_root.to_path_buf())
        })
}

fn release_workspace(workspace: TempDir, keep: bool) {
    if keep {
        let path = workspace.keep();
        log::info!("Pipeline: keeping workspace {}", path.display());
        return;
    }

    let path = workspace.path().to_path_buf();
    if let Err(e) = workspace.close() {
        log::warn!("Pipeline: could not remove workspace {}: {}", path.display(), e);
    }
}

async fn run_job(
    url: &str,
    provider: ProviderTag,
    workspace: &Path,
    settings: &ArchiveSettings,
    registry: &AuxRegistry,
) -> Result<PathBuf, ArchiveFailure> {
    // ── Step 2: Build command ──
    let command = CommandBuilder::new(url, provider)
        .options(settings.options)
        .executable(&settings.executable)
        .build();
    log::debug!("Pipeline: {}", command.display());

    // ── Step 3: Run the downloader ──
    let process = run_captured(&command.program, &command.args, workspace, settings.echo_output)
        .await
        .map_err(|e| ArchiveFailure::new(e, None))?;

    // ── Step 4: Analyze the log ──
    let analysis = analyze_log(&process.combined_output, provider, workspace);
    let basename = analysis.basename.clone();
    let fail = |reason: AppError| ArchiveFailure::new(reason, basename.clone());

    if let Some(kind) = analysis.error_kind {
        log::warn!("Pipeline: downloader reported an error ({})", kind.label());
        return Err(fail(AppError::DetectedLog { kind }));
    }
    if !process.success() {
        return Err(fail(AppError::Process(format!(
            "{} exited with code {}",
            command.program, process.exit_code
        ))));
    }
    if !analysis.is_complete {
        log::warn!("Pipeline: no completed download in the log");
        return Err(fail(AppError::DetectedLog {
            kind: LogErrorKind::Unknown,
        }));
    }
    let Some(name) = basename.clone() else {
        return Err(fail(AppError::FileOperation(
            "Could not determine the output name from the log".to_string(),
        )));
    };
    log::info!("Pipeline: output name '{}'", name);

    // ── Step 5: Organize ──
    let item_dir = organize(workspace, &analysis).map_err(fail)?;

    // ── Step 6: Auxiliary tasks ──
    match registry.run(provider, url, &item_dir).await {
        Ok(true) => log::info!("Pipeline: auxiliary task finished for '{}'", name),
        Ok(false) => {}
        Err(e) => log::warn!("Pipeline: auxiliary task failed for '{}', continuing without it: {}", name, e),
    }

    // ── Step 7: Relocate ──
    move_no_clobber(&item_dir, &settings.dest_root.join(&name)).map_err(fail)
}
