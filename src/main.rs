use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use yt_transcribe::channel;
use yt_transcribe::cli::Cli;
use yt_transcribe::config::Config;
use yt_transcribe::downloader::Downloader;
use yt_transcribe::models;
use yt_transcribe::transcribe::pipeline::{self, JobStatus};
use yt_transcribe::transcribe::{SpeechEngine, WhisperCli};
use yt_transcribe::utils;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yt_transcribe=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    if let Err(msg) = cli.validate() {
        eprintln!("error: {msg}");
        std::process::exit(2);
    }

    // Check for required external tools (non-fatal: the run may not need all of them)
    let missing_deps = utils::check_dependencies().await;
    if !missing_deps.is_empty() {
        eprintln!("Dependency check warnings:");
        for dep in missing_deps {
            eprintln!("  - {dep}");
        }
    }

    let model_path = models::resolve_model(&cli.model).await?;
    utils::check_file_accessible(&model_path)?;

    let config = Config::resolve(&cli, model_path)?;
    let downloader = Downloader::new();
    let engine: Arc<dyn SpeechEngine> = Arc::new(WhisperCli::new(&config));

    if let Some(channel_url) = &cli.channel {
        let channel_url = utils::validate_url(channel_url)?;
        let results =
            channel::run_channel_mode(&channel_url, Arc::new(config), downloader, engine).await?;
        if results.iter().any(|r| r.is_failure()) {
            std::process::exit(1);
        }
    } else if let Some(url) = &cli.url {
        let url = utils::validate_url(url)?;
        let video = downloader.fetch_video_info(&url).await?;
        let result = pipeline::run(&video, &config, &downloader, engine.as_ref(), 0, "").await;
        match result.status {
            JobStatus::Completed => {
                for path in &result.output_paths {
                    println!("{}", path.display());
                }
            }
            JobStatus::Failed { stage, error } => {
                anyhow::bail!("{stage} failed for {}: {error}", result.video_id);
            }
            JobStatus::Skipped => {}
        }
    }

    Ok(())
}
