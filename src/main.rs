use anyhow::Result;
use dotenvy::dotenv;
use simplelog::LevelFilter;
use std::process::ExitCode;

use vidarc::cli::Cli;
use vidarc::core::{config, init_logger, log_downloader_configuration, AppError};
use vidarc::download::{archive_urls, ArchiveSettings, AuxRegistry, DownloadOptions};

/// Archives every URL given on the command line.
///
/// Exits with 1 only when the destination directory is not writable; failed
/// URLs are reported and counted but do not change the exit code.
#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse_args();

    // Load environment variables from .env if present
    let _ = dotenv();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    init_logger(level, config::LOG_FILE_PATH.as_deref())?;
    log_downloader_configuration();

    let settings = ArchiveSettings::new(&cli.output_dir).options(DownloadOptions {
        date_first: cli.date_first,
        keep_workspace: cli.keep_tmp,
    });
    let registry = AuxRegistry::default_registry();

    let outcomes = match archive_urls(&cli.urls, &settings, &registry).await {
        Ok(outcomes) => outcomes,
        Err(AppError::WorkspaceUnwritable(dir)) => {
            log::error!("Destination {} is not writable", dir.display());
            eprintln!("vidarc: error: destination directory is not writable");
            return Ok(ExitCode::from(1));
        }
        Err(e) => return Err(e.into()),
    };

    let archived = outcomes.iter().filter(|o| o.success).count();
    let failed = outcomes.len() - archived;

    for outcome in outcomes.iter().filter(|o| !o.success) {
        if let Some(failure) = &outcome.error {
            eprintln!("vidarc: failed: {}: {}", outcome.url, failure);
        }
    }

    println!("vidarc: URLs archived: {}.", archived);
    if failed > 0 {
        println!("vidarc: URLs failed: {}.", failed);
    }

    Ok(ExitCode::SUCCESS)
}
