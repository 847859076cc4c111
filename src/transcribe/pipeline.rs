//! Single-video pipeline: download, transcribe, write, clean up.
//!
//! Used standalone in single mode and as the unit of work inside pool workers.
//! The pipeline boundary converts every stage error into a failed [`JobResult`]
//! and never propagates or panics.

use std::path::PathBuf;
use tempfile::TempDir;

use crate::config::Config;
use crate::downloader::{AudioSource, VideoRef};
use crate::output;
use crate::transcribe::SpeechEngine;
use crate::TranscribeError;

/// Per-video pipeline stage: `pending → downloading → transcribing → writing → done`,
/// with `failed` absorbing from any non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Pending,
    Downloading,
    Transcribing,
    Writing,
    Done,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Pending => "pending",
            Stage::Downloading => "downloading",
            Stage::Transcribing => "transcribing",
            Stage::Writing => "writing",
            Stage::Done => "done",
        };
        f.write_str(s)
    }
}

/// Terminal status of one video's job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Completed,
    Skipped,
    Failed { stage: Stage, error: String },
}

/// Outcome of one video's pipeline run, consumed by the batch aggregator
#[derive(Debug, Clone)]
pub struct JobResult {
    pub video_id: String,
    pub title: String,
    pub status: JobStatus,
    pub output_paths: Vec<PathBuf>,
}

impl JobResult {
    pub fn completed(video: &VideoRef, output_paths: Vec<PathBuf>) -> Self {
        Self {
            video_id: video.id.clone(),
            title: video.title.clone(),
            status: JobStatus::Completed,
            output_paths,
        }
    }

    pub fn skipped(video: &VideoRef) -> Self {
        Self {
            video_id: video.id.clone(),
            title: video.title.clone(),
            status: JobStatus::Skipped,
            output_paths: Vec::new(),
        }
    }

    pub fn failed(video: &VideoRef, error: &TranscribeError) -> Self {
        Self {
            video_id: video.id.clone(),
            title: video.title.clone(),
            status: JobStatus::Failed {
                stage: error.stage(),
                error: error.to_string(),
            },
            output_paths: Vec::new(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, JobStatus::Failed { .. })
    }
}

/// Run the full pipeline for one video. Never fails: errors become a failed
/// [`JobResult`] carrying the stage they occurred in.
pub async fn run(
    video: &VideoRef,
    config: &Config,
    source: &dyn AudioSource,
    engine: &dyn SpeechEngine,
    worker: usize,
    label: &str,
) -> JobResult {
    tracing::info!(worker, "{label}processing \"{}\" ({})", video.title, video.id);

    match execute(video, config, source, engine, worker).await {
        Ok(paths) => {
            tracing::info!(worker, "{label}done: {}", video.id);
            JobResult::completed(video, paths)
        }
        Err(e) => {
            tracing::error!(worker, "{label}{} failed while {}: {e}", video.id, e.stage());
            JobResult::failed(video, &e)
        }
    }
}

async fn execute(
    video: &VideoRef,
    config: &Config,
    source: &dyn AudioSource,
    engine: &dyn SpeechEngine,
    worker: usize,
) -> Result<Vec<PathBuf>, TranscribeError> {
    let work_dir = TempDir::new()
        .map_err(|e| TranscribeError::Download(format!("cannot create temp dir: {e}")))?;

    tracing::info!(worker, video = %video.id, "downloading audio");
    let audio_path = source
        .download_audio(&video.url, work_dir.path(), &video.id, &config.audio_format)
        .await?;

    tracing::info!(
        worker,
        video = %video.id,
        "transcribing with {} ({})",
        config.model_label(),
        if config.use_gpu { "gpu" } else { "cpu" }
    );
    let segments = engine.transcribe(&audio_path, work_dir.path()).await?;

    tracing::info!(worker, video = %video.id, "writing {} format(s)", config.formats.len());
    let paths = output::write_outputs(&config.output_dir, &video.id, &segments, &config.formats)?;

    if config.keep_audio {
        preserve_audio(&audio_path, config, video, worker);
    }
    // temp dir drop removes the working audio

    Ok(paths)
}

/// Move the working audio file into the output directory. Best effort: a
/// failure here is logged and never fails the job.
fn preserve_audio(audio_path: &std::path::Path, config: &Config, video: &VideoRef, worker: usize) {
    let file_name = format!("{}.{}", video.id, config.audio_format);
    let dest = config.output_dir.join(file_name);
    // copy + remove rather than rename: temp dirs often sit on another filesystem
    if let Err(e) = fs_err::copy(audio_path, &dest) {
        tracing::warn!(worker, "could not keep audio for {}: {e}", video.id);
    } else if let Err(e) = fs_err::remove_file(audio_path) {
        tracing::warn!(worker, "could not remove working audio for {}: {e}", video.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::FormatArg;
    use crate::output::OutputFormat;
    use crate::transcribe::Segment;
    use async_trait::async_trait;
    use std::path::Path;

    struct FakeSource {
        fail: bool,
    }

    #[async_trait]
    impl AudioSource for FakeSource {
        async fn download_audio(
            &self,
            _url: &str,
            dir: &Path,
            basename: &str,
            audio_format: &str,
        ) -> Result<PathBuf, TranscribeError> {
            if self.fail {
                return Err(TranscribeError::Download("HTTP 403".into()));
            }
            let path = dir.join(format!("{basename}.{audio_format}"));
            fs_err::write(&path, b"fake audio").unwrap();
            Ok(path)
        }
    }

    struct FakeEngine {
        fail: bool,
    }

    #[async_trait]
    impl crate::transcribe::SpeechEngine for FakeEngine {
        async fn transcribe(
            &self,
            audio_path: &Path,
            _work_dir: &Path,
        ) -> Result<Vec<Segment>, TranscribeError> {
            assert!(audio_path.is_file());
            if self.fail {
                return Err(TranscribeError::Transcription("model exploded".into()));
            }
            Ok(vec![Segment {
                start_ms: 0,
                end_ms: 1000,
                text: "hello".into(),
            }])
        }
    }

    fn video() -> VideoRef {
        VideoRef {
            id: "abcdefghijk".into(),
            title: "Test video".into(),
            duration_seconds: 120,
            url: "https://www.youtube.com/watch?v=abcdefghijk".into(),
        }
    }

    fn config(output_dir: &Path, keep_audio: bool) -> Config {
        Config {
            model_path: PathBuf::from("/models/ggml-base.bin"),
            language: "auto".into(),
            formats: FormatArg::Txt.expand(),
            primary_format: OutputFormat::Txt,
            audio_format: "mp3".into(),
            keep_audio,
            output_dir: output_dir.to_path_buf(),
            use_gpu: true,
            min_seconds: 60,
            amount: 0,
            workers: 1,
        }
    }

    #[tokio::test]
    async fn test_successful_run_writes_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), false);
        let result = run(
            &video(),
            &config,
            &FakeSource { fail: false },
            &FakeEngine { fail: false },
            0,
            "",
        )
        .await;

        assert_eq!(result.status, JobStatus::Completed);
        assert_eq!(result.output_paths.len(), 1);
        assert!(dir.path().join("abcdefghijk.txt").is_file());
        // audio was not kept
        assert!(!dir.path().join("abcdefghijk.mp3").exists());
    }

    #[tokio::test]
    async fn test_keep_audio_moves_file_into_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), true);
        let result = run(
            &video(),
            &config,
            &FakeSource { fail: false },
            &FakeEngine { fail: false },
            0,
            "",
        )
        .await;

        assert_eq!(result.status, JobStatus::Completed);
        assert!(dir.path().join("abcdefghijk.mp3").is_file());
    }

    #[tokio::test]
    async fn test_download_failure_carries_stage() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), false);
        let result = run(
            &video(),
            &config,
            &FakeSource { fail: true },
            &FakeEngine { fail: false },
            0,
            "",
        )
        .await;

        match result.status {
            JobStatus::Failed { stage, ref error } => {
                assert_eq!(stage, Stage::Downloading);
                assert!(error.contains("HTTP 403"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(result.output_paths.is_empty());
    }

    #[tokio::test]
    async fn test_transcription_failure_carries_stage() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), false);
        let result = run(
            &video(),
            &config,
            &FakeSource { fail: false },
            &FakeEngine { fail: true },
            0,
            "",
        )
        .await;

        match result.status {
            JobStatus::Failed { stage, .. } => assert_eq!(stage, Stage::Transcribing),
            other => panic!("expected failure, got {other:?}"),
        }
        // nothing written on failure
        assert!(!dir.path().join("abcdefghijk.txt").exists());
    }
}
