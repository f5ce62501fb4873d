use clap::Parser;
use std::path::PathBuf;

use crate::config::UploadConfig;

/// Command-line arguments for the core uploader.
///
/// Anything left unset here may still come from the `--config` file.
#[derive(Parser, Debug)]
#[clap(
    name = "coreuploader",
    version,
    about = "Stream a crash dump to cloud object storage over TLS"
)]
pub struct Args {
    /// Target storage system (gcp)
    #[clap(short, long)]
    pub system: Option<String>,

    /// Bucket to upload into
    #[clap(short, long)]
    pub bucket: Option<String>,

    /// Object name to store the upload under
    #[clap(short, long)]
    pub filename: Option<String>,

    /// File to upload (default: standard input)
    #[clap(short, long)]
    pub input: Option<PathBuf>,

    /// Path to configuration YAML file
    #[clap(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[clap(short, long)]
    pub verbose: bool,
}

impl Args {
    /// The upload settings given on the command line
    pub fn overrides(&self) -> UploadConfig {
        UploadConfig {
            system: self.system.clone(),
            bucket: self.bucket.clone(),
            filename: self.filename.clone(),
            input: self.input.clone(),
        }
    }
}
