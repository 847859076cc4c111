//! Transcript renderers for the supported output formats.

use crate::transcribe::Segment;

/// Plain text: segment texts joined into one line per segment.
pub fn format_as_text(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        out.push_str(segment.text.trim());
        out.push('\n');
    }
    out
}

/// WebVTT with `HH:MM:SS.mmm` cue timestamps.
pub fn format_as_vtt(segments: &[Segment]) -> String {
    let mut lines = vec!["WEBVTT".to_string(), String::new()];
    for segment in segments {
        lines.push(format!(
            "{} --> {}",
            format_timestamp(segment.start_ms, '.'),
            format_timestamp(segment.end_ms, '.')
        ));
        lines.push(segment.text.trim().to_string());
        lines.push(String::new());
    }
    lines.join("\n")
}

/// SRT with numbered cues and `HH:MM:SS,mmm` timestamps.
pub fn format_as_srt(segments: &[Segment]) -> String {
    let mut lines = Vec::new();
    for (i, segment) in segments.iter().enumerate() {
        lines.push((i + 1).to_string());
        lines.push(format!(
            "{} --> {}",
            format_timestamp(segment.start_ms, ','),
            format_timestamp(segment.end_ms, ',')
        ));
        lines.push(segment.text.trim().to_string());
        lines.push(String::new());
    }
    lines.join("\n")
}

/// CSV with a `start,end,text` header; times in milliseconds.
pub fn format_as_csv(segments: &[Segment]) -> String {
    let mut lines = vec!["start,end,text".to_string()];
    for segment in segments {
        let text = segment.text.trim().replace('"', "\"\"");
        lines.push(format!("{},{},\"{}\"", segment.start_ms, segment.end_ms, text));
    }
    lines.push(String::new());
    lines.join("\n")
}

/// JSON array of `{start, end, text}` objects; times in milliseconds.
pub fn format_as_json(segments: &[Segment]) -> serde_json::Result<String> {
    #[derive(serde::Serialize)]
    struct JsonSegment<'a> {
        start: u64,
        end: u64,
        text: &'a str,
    }

    let entries: Vec<JsonSegment<'_>> = segments
        .iter()
        .map(|s| JsonSegment {
            start: s.start_ms,
            end: s.end_ms,
            text: s.text.trim(),
        })
        .collect();

    let mut out = serde_json::to_string_pretty(&entries)?;
    out.push('\n');
    Ok(out)
}

/// Format milliseconds as `HH:MM:SS<sep>mmm`.
fn format_timestamp(ms: u64, sep: char) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let millis = ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02}{sep}{millis:03}")
}
