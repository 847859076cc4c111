//! Speech recognition via whisper-cpp's whisper-cli, behind a trait seam.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::config::Config;
use crate::TranscribeError;

pub mod pipeline;

/// One timed transcript segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

/// Trait for turning an audio file into timed transcript segments
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Transcribe `audio_path`, using `work_dir` for intermediate files.
    async fn transcribe(
        &self,
        audio_path: &Path,
        work_dir: &Path,
    ) -> Result<Vec<Segment>, TranscribeError>;
}

/// whisper-cli subprocess backend, with ffmpeg audio normalization
pub struct WhisperCli {
    cli_path: String,
    ffmpeg_path: String,
    model_path: PathBuf,
    language: String,
    use_gpu: bool,
}

impl WhisperCli {
    pub fn new(config: &Config) -> Self {
        Self {
            cli_path: "whisper-cli".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            model_path: config.model_path.clone(),
            language: config.language.clone(),
            use_gpu: config.use_gpu,
        }
    }

    /// Convert the downloaded audio to 16 kHz mono WAV, whisper-cpp's input format.
    async fn normalize_audio(
        &self,
        audio_path: &Path,
        work_dir: &Path,
    ) -> Result<PathBuf, TranscribeError> {
        let stem = audio_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());
        let wav_path = work_dir.join(format!("{stem}.16k.wav"));

        let output = Command::new(&self.ffmpeg_path)
            .args([
                "-i",
                &audio_path.to_string_lossy(),
                "-ar",
                "16000",
                "-ac",
                "1",
                "-c:a",
                "pcm_s16le",
                "-vn",
                "-y",
                &wav_path.to_string_lossy(),
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| TranscribeError::Transcription(format!("cannot run ffmpeg: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TranscribeError::Transcription(format!(
                "ffmpeg failed for {}: {}",
                audio_path.display(),
                last_lines(&stderr, 5)
            )));
        }
        Ok(wav_path)
    }
}

#[async_trait]
impl SpeechEngine for WhisperCli {
    async fn transcribe(
        &self,
        audio_path: &Path,
        work_dir: &Path,
    ) -> Result<Vec<Segment>, TranscribeError> {
        if !self.model_path.is_file() {
            return Err(TranscribeError::Transcription(format!(
                "model file not found: {}",
                self.model_path.display()
            )));
        }

        let wav_path = self.normalize_audio(audio_path, work_dir).await?;
        let output_base = work_dir.join("transcript");

        let mut args = vec![
            "--model".to_string(),
            self.model_path.to_string_lossy().into_owned(),
            "--language".to_string(),
            self.language.clone(),
            "--no-prints".to_string(),
            "--output-json".to_string(),
            "--output-file".to_string(),
            output_base.to_string_lossy().into_owned(),
            "--file".to_string(),
            wav_path.to_string_lossy().into_owned(),
        ];
        if !self.use_gpu {
            args.push("--no-gpu".to_string());
        }

        let output = Command::new(&self.cli_path)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| TranscribeError::Transcription(format!("cannot run whisper-cli: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TranscribeError::Transcription(format!(
                "whisper-cli exited with {}: {}",
                output.status,
                last_lines(&stderr, 5)
            )));
        }

        let json_path = output_base.with_extension("json");
        let raw = fs_err::read_to_string(&json_path).map_err(|e| {
            TranscribeError::Transcription(format!("missing whisper-cli output: {e}"))
        })?;
        parse_whisper_json(&raw)
    }
}

/// whisper-cli --output-json document, reduced to the fields we use
#[derive(Debug, Deserialize)]
struct WhisperJson {
    transcription: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    offsets: WhisperOffsets,
    text: String,
}

#[derive(Debug, Deserialize)]
struct WhisperOffsets {
    from: i64,
    to: i64,
}

fn parse_whisper_json(raw: &str) -> Result<Vec<Segment>, TranscribeError> {
    let doc: WhisperJson = serde_json::from_str(raw)
        .map_err(|e| TranscribeError::Transcription(format!("unparseable whisper-cli JSON: {e}")))?;

    Ok(doc
        .transcription
        .into_iter()
        .map(|seg| Segment {
            start_ms: seg.offsets.from.max(0) as u64,
            end_ms: seg.offsets.to.max(0) as u64,
            text: seg.text.trim().to_string(),
        })
        .collect())
}

fn last_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whisper_json() {
        let raw = r#"{
            "result": {"language": "en"},
            "transcription": [
                {"timestamps": {"from": "00:00:00,000", "to": "00:00:02,500"},
                 "offsets": {"from": 0, "to": 2500},
                 "text": " Hello world"},
                {"timestamps": {"from": "00:00:02,500", "to": "00:00:05,000"},
                 "offsets": {"from": 2500, "to": 5000},
                 "text": " Second"}
            ]
        }"#;

        let segments = parse_whisper_json(raw).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].start_ms, 0);
        assert_eq!(segments[0].end_ms, 2500);
        assert_eq!(segments[0].text, "Hello world");
        assert_eq!(segments[1].start_ms, 2500);
    }

    #[test]
    fn test_parse_whisper_json_empty_transcription() {
        let segments = parse_whisper_json(r#"{"transcription": []}"#).unwrap();
        assert!(segments.is_empty());
    }

    #[test]
    fn test_parse_whisper_json_invalid() {
        let err = parse_whisper_json("definitely not json").unwrap_err();
        assert!(matches!(err, TranscribeError::Transcription(_)));
    }

    #[test]
    fn test_last_lines() {
        assert_eq!(last_lines("a\nb\nc", 2), "b | c");
        assert_eq!(last_lines("a", 5), "a");
        assert_eq!(last_lines("", 5), "");
    }
}
