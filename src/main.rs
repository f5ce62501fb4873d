use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, error, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use coreuploader::cli::Args;
use coreuploader::config::UploadConfig;
use coreuploader::tls::TrustAnchors;
use coreuploader::upload::run_upload;

fn main() -> ExitCode {
    // Parse arguments
    let args = Args::parse();

    // Initialize logging
    if let Err(e) = initialize_logging(args.verbose) {
        eprintln!("{:#}", e);
        return ExitCode::FAILURE;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging with the specified verbosity level
fn initialize_logging(verbose: bool) -> Result<()> {
    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .context("Failed to initialize logger")?;
    Ok(())
}

/// Config file values first, then command-line values on top
fn load_config(args: &Args) -> Result<UploadConfig> {
    let from_file = match &args.config {
        Some(path) => UploadConfig::from_yaml_file(path)?,
        None => UploadConfig::default(),
    };
    Ok(from_file.merge(args.overrides()))
}

fn run(args: &Args) -> Result<()> {
    let plan = load_config(args)?.validate()?;
    let mut source = plan.input.open()?;

    debug!(
        "Uploading {} to {} ({})",
        plan.input.describe(),
        plan.target,
        plan.request.path
    );

    let anchors = TrustAnchors::compiled_in().context("Failed to load compiled-in trust anchors")?;
    let report = run_upload(&plan.request, &anchors, &mut source)?;

    debug!(
        "Upload of {} finished: {} payload bytes, {} response bytes",
        plan.request.object_name, report.body.payload_bytes, report.response_bytes
    );
    Ok(())
}
