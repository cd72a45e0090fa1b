//! Filesystem moves that never overwrite.
//!
//! Every move goes through [`move_no_clobber`]: when the target name is
//! taken, `Name 2`, `Name 3`, … are tried in turn. Only renames that cross a
//! filesystem boundary fall back to copy + remove; any other rename error is
//! returned untouched.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::core::config::archive::MAX_COLLISION_ATTEMPTS;
use crate::core::error::{AppError, AppResult};

/// Whether anything (file, directory or dangling symlink) occupies `path`.
pub fn path_exists(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok()
}

/// `path` with a numeric suffix: `Name N` for directories,
/// `Stem N.ext` for files.
pub fn suffixed_path(path: &Path, n: u32, is_dir: bool) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let new_name = match (is_dir, path.file_stem(), path.extension()) {
        (false, Some(stem), Some(ext)) => format!("{} {}.{}", stem.to_string_lossy(), n, ext.to_string_lossy()),
        _ => format!("{} {}", name, n),
    };

    path.with_file_name(new_name)
}

/// First free path among `path`, `path 2`, `path 3`, …
pub fn free_destination(path: &Path, is_dir: bool) -> AppResult<PathBuf> {
    if !path_exists(path) {
        return Ok(path.to_path_buf());
    }

    for n in 2..=MAX_COLLISION_ATTEMPTS {
        let candidate = suffixed_path(path, n, is_dir);
        if !path_exists(&candidate) {
            log::debug!("{} is taken, using {}", path.display(), candidate.display());
            return Ok(candidate);
        }
    }

    Err(AppError::FileOperation(format!(
        "No free name for {} after {} attempts",
        path.display(),
        MAX_COLLISION_ATTEMPTS
    )))
}

/// Moves `src` to `dst` (or a suffixed variant) and returns the final path.
pub fn move_no_clobber(src: &Path, dst: &Path) -> AppResult<PathBuf> {
    let is_dir = src.is_dir();
    let target = free_destination(dst, is_dir)?;
    rename_or_copy(src, &target, is_dir)?;
    Ok(target)
}

/// Moves `src` into `dir`, keeping its file name.
pub fn move_into(src: &Path, dir: &Path) -> AppResult<PathBuf> {
    let name = src
        .file_name()
        .ok_or_else(|| AppError::FileOperation(format!("No file name in {}", src.display())))?;
    move_no_clobber(src, &dir.join(name))
}

/// Moves `src` into `dir` if it exists. Absence is not an error.
pub fn move_into_if_exists(src: &Path, dir: &Path) -> AppResult<Option<PathBuf>> {
    if !path_exists(src) {
        return Ok(None);
    }
    move_into(src, dir).map(Some)
}

/// Removes a file, tolerating its absence. Returns whether something was removed.
pub fn remove_file_if_exists(path: &Path) -> AppResult<bool> {
    match fs_err::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(AppError::Io(e)),
    }
}

fn rename_or_copy(src: &Path, dst: &Path, is_dir: bool) -> AppResult<()> {
    let rename_err = match fs_err::rename(src, dst) {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };

    if !is_cross_device(&rename_err) {
        return Err(AppError::Io(rename_err));
    }

    log::debug!("{} and {} are on different filesystems, copying", src.display(), dst.display());
    copy_across(src, dst, is_dir)
}

/// Copies `src` to `dst`, then removes `src`. A failed copy leaves nothing at `dst`.
fn copy_across(src: &Path, dst: &Path, is_dir: bool) -> AppResult<()> {
    let copied = if is_dir {
        copy_dir_all(src, dst)
    } else {
        fs_err::copy(src, dst).map(drop)
    };

    if let Err(copy_err) = copied {
        let cleanup = if is_dir {
            fs_err::remove_dir_all(dst)
        } else {
            fs_err::remove_file(dst)
        };
        if let Err(e) = cleanup {
            if e.kind() != ErrorKind::NotFound {
                log::warn!("Could not remove partial copy {}: {}", dst.display(), e);
            }
        }
        return Err(AppError::FileOperation(format!(
            "Could not copy {} to {}: {}",
            src.display(),
            dst.display(),
            copy_err
        )));
    }

    let removed = if is_dir {
        fs_err::remove_dir_all(src)
    } else {
        fs_err::remove_file(src)
    };
    if let Err(e) = removed {
        log::warn!("Copied to {} but could not remove {}: {}", dst.display(), src.display(), e);
    }
    Ok(())
}

#[cfg(unix)]
fn is_cross_device(err: &std::io::Error) -> bool {
    // EXDEV
    err.raw_os_error() == Some(18)
}

#[cfg(windows)]
fn is_cross_device(err: &std::io::Error) -> bool {
    // ERROR_NOT_SAME_DEVICE
    err.raw_os_error() == Some(17)
}

#[cfg(not(any(unix, windows)))]
fn is_cross_device(_err: &std::io::Error) -> bool {
    false
}

fn copy_dir_all(src: &Path, dst: &Path) -> std::io::Result<()> {
    fs_err::create_dir_all(dst)?;
    for entry in fs_err::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&entry.path(), &target)?;
        } else {
            fs_err::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
