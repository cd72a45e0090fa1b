//! Logging initialization and configuration checking
//!
//! This module provides:
//! - Logger initialization (stderr + optional file)
//! - Startup diagnostics for the downloader binary

use anyhow::Result;
use simplelog::*;
use std::fs::File;
use std::process::{Command, Stdio};

use crate::core::config;

/// Initialize logger for stderr and, optionally, file output
///
/// Terminal output goes to stderr so it never interleaves with the
/// downloader output echoed on stdout.
///
/// # Arguments
/// * `level` - Minimum level for both sinks
/// * `log_file_path` - Path to an additional log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to create the file or install the logger
pub fn init_logger(level: LevelFilter, log_file_path: Option<&str>) -> Result<()> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    if let Some(path) = log_file_path {
        let log_file = File::create(path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;
        loggers.push(WriteLogger::new(level, Config::default(), log_file));
    }

    CombinedLogger::init(loggers).map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs which downloader binary will be used and whether it responds
///
/// A missing binary is not fatal here; every archive job reports it
/// again as a process failure.
pub fn log_downloader_configuration() {
    let bin = config::YTDL_BIN.as_str();

    match Command::new(bin)
        .arg("--version")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
    {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
            log::info!("Downloader: {} (version {})", bin, version);
        }
        Ok(output) => {
            log::warn!("Downloader '{}' answered --version with {}", bin, output.status);
        }
        Err(e) => {
            log::error!("Downloader '{}' could not be started: {}", bin, e);
            log::error!("Install yt-dlp or point YTDL_BIN at an existing binary");
        }
    }
}
