use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use log::{error, info, warn};

use vidterm::{pipeline, CancellationToken, Cli, Outcome, ViewerConfig, ViewerError};

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command line arguments; usage errors exit with 1
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(1),
            };
        }
    };

    // Initialize logging
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = ViewerConfig::from_cli(&cli)?;

    if cli.info_only {
        info!("Info-only mode: loading video information");
        let info = tokio::task::spawn_blocking(move || pipeline::probe(&config))
            .await
            .context("probe task failed")??;

        println!("Video Information:");
        println!("  Source: {}", cli.source);
        println!("  Stream: {}", info.index);
        println!("  Codec: {}", info.codec_name);
        println!("  Dimensions: {}x{}", info.width, info.height);
        println!("  Pixel Format: {:?}", info.format);
        println!("  Frame Rate: {:.2} FPS", info.fps());
        return Ok(ExitCode::SUCCESS);
    }

    info!("Starting vidterm v{}", vidterm::VERSION);
    info!("Playing: {} ({:?})", config.source, config.mode);

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl+C pressed, exiting");
                interrupt.cancel();
            }
            Err(e) => warn!("Failed to listen for Ctrl+C: {}", e),
        }
    });

    // The whole pipeline runs on one blocking thread
    let outcome = tokio::task::spawn_blocking(move || pipeline::play(&config, cancel))
        .await
        .context("pipeline task failed")?;

    match outcome {
        Ok(Outcome::EndOfStream) => {
            info!("Playback finished");
            Ok(ExitCode::SUCCESS)
        }
        Ok(Outcome::Interrupted) => Ok(ExitCode::SUCCESS),
        Err(ViewerError::Startup(e)) => Err(e.into()),
        // Stream errors are reported by the sequencer as it terminates
        Err(_) => Ok(ExitCode::from(1)),
    }
}
