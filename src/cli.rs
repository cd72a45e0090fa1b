use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "vidarc")]
#[command(author, version, about = "Archive online video and audio with yt-dlp", long_about = None)]
pub struct Cli {
    /// URLs to archive, processed one after another
    #[arg(required = true, num_args = 1.., value_name = "URL")]
    pub urls: Vec<String>,

    /// Put the upload date in front of the title in file names
    #[arg(long)]
    pub date_first: bool,

    /// Keep the temporary workspace of every job
    #[arg(long = "keep-tmp")]
    pub keep_tmp: bool,

    /// Destination directory for archived items
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
