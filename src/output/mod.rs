use std::path::{Path, PathBuf};

use crate::transcribe::Segment;
use crate::TranscribeError;

pub mod formatters;

/// Supported transcript output formats
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Txt,
    Vtt,
    Srt,
    Csv,
    Json,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 5] = [
        OutputFormat::Txt,
        OutputFormat::Vtt,
        OutputFormat::Srt,
        OutputFormat::Csv,
        OutputFormat::Json,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Txt => "txt",
            OutputFormat::Vtt => "vtt",
            OutputFormat::Srt => "srt",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Deterministic transcript location for a video id and format.
///
/// This naming is the skip-detection contract: a video counts as already
/// transcribed iff this path exists for the primary format.
pub fn transcript_path(dir: &Path, video_id: &str, format: OutputFormat) -> PathBuf {
    dir.join(format!("{}.{}", video_id, format.extension()))
}

/// Render segments in the given format.
pub fn render(segments: &[Segment], format: OutputFormat) -> Result<String, TranscribeError> {
    match format {
        OutputFormat::Txt => Ok(formatters::format_as_text(segments)),
        OutputFormat::Vtt => Ok(formatters::format_as_vtt(segments)),
        OutputFormat::Srt => Ok(formatters::format_as_srt(segments)),
        OutputFormat::Csv => Ok(formatters::format_as_csv(segments)),
        OutputFormat::Json => formatters::format_as_json(segments)
            .map_err(|e| TranscribeError::Write(format!("JSON serialization failed: {e}"))),
    }
}

/// Write one transcript file per requested format, named from the video id.
/// Returns the paths written, in the order of `formats`.
pub fn write_outputs(
    dir: &Path,
    video_id: &str,
    segments: &[Segment],
    formats: &[OutputFormat],
) -> Result<Vec<PathBuf>, TranscribeError> {
    fs_err::create_dir_all(dir)
        .map_err(|e| TranscribeError::Write(format!("cannot create {}: {e}", dir.display())))?;

    let mut written = Vec::with_capacity(formats.len());
    for &format in formats {
        let path = transcript_path(dir, video_id, format);
        let content = render(segments, format)?;
        fs_err::write(&path, content)
            .map_err(|e| TranscribeError::Write(format!("cannot write {}: {e}", path.display())))?;
        written.push(path);
    }
    Ok(written)
}
