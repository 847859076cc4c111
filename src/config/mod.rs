use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::cli::Cli;
use crate::output::OutputFormat;

/// Run configuration, resolved once at startup and passed down.
///
/// Environment-derived defaults (output dir, model cache) are folded in here
/// so nothing downstream reads the environment ad hoc.
#[derive(Debug, Clone)]
pub struct Config {
    /// Resolved path to the GGML model file
    pub model_path: PathBuf,
    /// Language code or "auto"
    pub language: String,
    /// Formats to write, with "all" already expanded
    pub formats: Vec<OutputFormat>,
    /// Format whose file presence signals "already transcribed"
    pub primary_format: OutputFormat,
    /// Audio container requested from yt-dlp
    pub audio_format: String,
    /// Keep the downloaded audio next to the transcripts
    pub keep_audio: bool,
    /// Absolute base output directory
    pub output_dir: PathBuf,
    pub use_gpu: bool,
    /// Channel mode: skip videos shorter than this
    pub min_seconds: u64,
    /// Channel mode: cap on newly processed videos, 0 = unlimited
    pub amount: usize,
    /// Channel mode: bounded pool size
    pub workers: usize,
}

impl Config {
    /// Build the run configuration from parsed CLI arguments and the resolved
    /// model path.
    pub fn resolve(cli: &Cli, model_path: PathBuf) -> Result<Self> {
        let output_dir = if cli.output_dir.is_absolute() {
            cli.output_dir.clone()
        } else {
            std::env::current_dir()
                .context("cannot determine current directory")?
                .join(&cli.output_dir)
        };

        Ok(Self {
            model_path,
            language: cli.language.clone(),
            formats: cli.output_format.expand(),
            primary_format: cli.output_format.primary(),
            audio_format: cli.audio_format.clone(),
            keep_audio: cli.keep_audio,
            output_dir,
            use_gpu: !cli.no_gpu,
            min_seconds: cli.min_seconds,
            amount: cli.amount,
            workers: cli.workers,
        })
    }

    /// Short model name for log lines (file stem of the model path).
    pub fn model_label(&self) -> String {
        self.model_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.model_path.display().to_string())
    }
}
