//! Reorganizes a finished workspace into the canonical item layout.
//!
//! Single-file mode (`<basename>/`):
//! - `<basename>.<ext>` (or the original names when several media files exist)
//! - `thumb.<ext>`, `info.json`, `log.txt`
//! - chat replays and leftover subtitles, when present
//!
//! Batch mode (`<basename>/`):
//! - every track at the top level, original names kept
//! - `Metadata/` with all JSON sidecars and `log.txt`
//!
//! Organizing runs once per item; running it again on an organized
//! directory is not supported.

use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::core::config::archive;
use crate::core::error::{AppError, AppResult};
use crate::core::utils::{file_name_lossy, is_media_file, is_subtitle_file, IMAGE_EXTENSIONS};
use crate::download::fsops::{move_into, move_into_if_exists, move_no_clobber, path_exists, remove_file_if_exists};
use crate::download::log_analysis::LogAnalysis;
use crate::download::provider::OrganizeMode;
use crate::download::thumbnail::preferred_thumbnail_extension;

/// Builds `<workspace>/<basename>/` and returns its path.
pub fn organize(workspace: &Path, analysis: &LogAnalysis) -> AppResult<PathBuf> {
    let basename = analysis
        .basename
        .as_deref()
        .ok_or_else(|| AppError::FileOperation("Could not determine the output name from the log".to_string()))?;

    match analysis.organize_mode() {
        OrganizeMode::SingleFile => organize_single_file(workspace, basename, &analysis.normalized_log),
        OrganizeMode::Batch => organize_batch(workspace, basename, &analysis.normalized_log),
    }
}

fn organize_single_file(workspace: &Path, basename: &str, log: &str) -> AppResult<PathBuf> {
    let item_dir = workspace.join(basename);
    fs_err::create_dir_all(&item_dir)?;

    // ── Metadata ──
    let sidecar = workspace.join(format!("{}.info.json", basename));
    if !path_exists(&sidecar) {
        return Err(AppError::FileOperation(format!(
            "Metadata sidecar not found: {}",
            file_name_lossy(&sidecar)
        )));
    }
    let info: Value = serde_json::from_str(&fs_err::read_to_string(&sidecar)?)?;
    let thumb_ext = preferred_thumbnail_extension(&info);
    fs_err::write(
        item_dir.join(archive::INFO_FILE_NAME),
        serde_json::to_string_pretty(&info)?,
    )?;

    // ── Thumbnail ──
    match find_thumbnail(workspace, basename, thumb_ext.as_deref()) {
        Some(thumb) => {
            let ext = thumb
                .extension()
                .map(|e| e.to_string_lossy().to_ascii_lowercase())
                .unwrap_or_else(|| "jpg".to_string());
            move_no_clobber(&thumb, &item_dir.join(format!("{}.{}", archive::THUMB_STEM, ext)))?;
        }
        None => log::warn!("No thumbnail found for '{}'", basename),
    }

    // ── Chat replays and subtitles ──
    for name in CHAT_REPLAY_NAMES {
        move_into_if_exists(&workspace.join(name), &item_dir)?;
    }
    for file in list_files(workspace)? {
        if is_chat_sidecar(&file) || is_subtitle_file(&file) {
            move_into(&file, &item_dir)?;
        }
    }

    // ── Media ──
    let media = list_files(workspace)?
        .into_iter()
        .filter(|p| is_media_file(p))
        .collect::<Vec<_>>();
    match media.as_slice() {
        [] => {
            return Err(AppError::FileOperation(format!(
                "No media file was produced for '{}'",
                basename
            )))
        }
        [primary] => {
            let ext = primary
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default();
            move_no_clobber(primary, &item_dir.join(format!("{}.{}", basename, ext)))?;
        }
        several => {
            log::info!("{} media files for '{}', keeping original names", several.len(), basename);
            for file in several {
                move_into(file, &item_dir)?;
            }
        }
    }

    // ── Redundant sidecars ──
    for leftover in [
        sidecar,
        workspace.join(format!("{}.description", basename)),
    ] {
        if let Err(e) = remove_file_if_exists(&leftover) {
            log::warn!("Could not remove {}: {}", leftover.display(), e);
        }
    }

    fs_err::write(item_dir.join(archive::LOG_FILE_NAME), log)?;

    Ok(item_dir)
}

fn organize_batch(workspace: &Path, basename: &str, log: &str) -> AppResult<PathBuf> {
    let files = list_files(workspace)?;
    let tracks = files.iter().filter(|p| is_media_file(p)).count();
    if tracks == 0 {
        return Err(AppError::FileOperation(format!(
            "No audio or video tracks were produced for '{}'",
            basename
        )));
    }

    let item_dir = workspace.join(basename);
    let metadata_dir = item_dir.join(archive::METADATA_DIR);
    fs_err::create_dir_all(&metadata_dir)?;

    for file in &files {
        if is_json(file) {
            move_into(file, &metadata_dir)?;
        } else if is_media_file(file) {
            move_into(file, &item_dir)?;
        }
    }
    log::info!("Organized {} tracks into '{}'", tracks, basename);

    fs_err::write(metadata_dir.join(archive::LOG_FILE_NAME), log)?;

    Ok(item_dir)
}

/// `<basename>.<ext>` if present, otherwise any image named after the basename.
fn find_thumbnail(workspace: &Path, basename: &str, preferred_ext: Option<&str>) -> Option<PathBuf> {
    let preferred = preferred_ext.map(|ext| workspace.join(format!("{}.{}", basename, ext)));
    preferred
        .into_iter()
        .chain(
            IMAGE_EXTENSIONS
                .iter()
                .map(|ext| workspace.join(format!("{}.{}", basename, ext))),
        )
        .find(|p| p.is_file())
}

/// Chat replays some extractors write without the item's name in front.
const CHAT_REPLAY_NAMES: &[&str] = &["live_chat.json", "rechat.json"];

fn is_chat_sidecar(path: &Path) -> bool {
    let name = file_name_lossy(path).to_lowercase();
    CHAT_REPLAY_NAMES.iter().any(|bare| name.ends_with(&format!(".{}", bare)))
}

fn is_json(path: &Path) -> bool {
    file_name_lossy(path).to_lowercase().ends_with(".json")
}

/// Regular files directly inside `dir`, sorted by name.
fn list_files(dir: &Path) -> AppResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs_err::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}
