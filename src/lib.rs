//! yt-transcribe - A Rust CLI tool for downloading and transcribing YouTube videos
//!
//! This library orchestrates yt-dlp, ffmpeg and whisper-cpp to turn single videos
//! or whole channels into transcript files, with a bounded worker pool and
//! idempotent skip-detection for channel mode.

pub mod channel;
pub mod cli;
pub mod config;
pub mod downloader;
pub mod models;
pub mod output;
pub mod transcribe;
pub mod utils;

pub use cli::Cli;
pub use config::Config;
pub use downloader::VideoRef;
pub use output::OutputFormat;
pub use transcribe::pipeline::{JobResult, JobStatus, Stage};
pub use transcribe::{Segment, SpeechEngine, WhisperCli};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error taxonomy for the transcription pipeline
#[derive(thiserror::Error, Debug)]
pub enum TranscribeError {
    #[error("Channel listing failed: {0}")]
    Resolution(String),

    #[error("Audio download failed: {0}")]
    Download(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Failed to write transcript: {0}")]
    Write(String),
}

impl TranscribeError {
    /// The pipeline stage a failure of this kind is attributed to.
    pub fn stage(&self) -> Stage {
        match self {
            // Resolution failures happen before any per-video work starts
            TranscribeError::Resolution(_) => Stage::Pending,
            TranscribeError::Download(_) => Stage::Downloading,
            TranscribeError::Transcription(_) => Stage::Transcribing,
            TranscribeError::Write(_) => Stage::Writing,
        }
    }
}
