use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "yt-transcribe",
    about = "Download and transcribe YouTube videos using yt-dlp and whisper-cpp",
    version,
    long_about = "Downloads audio from a single YouTube video or a whole channel and \
transcribes it locally with whisper-cpp. Channel mode skips videos that already \
have transcripts in the output directory and can fan work out to parallel workers."
)]
pub struct Cli {
    /// Video URL to transcribe (single mode; mutually exclusive with --channel)
    #[arg(value_name = "URL")]
    pub url: Option<String>,

    /// Whisper model name or path to a GGML .bin file
    #[arg(short, long, default_value = crate::models::DEFAULT_MODEL, value_name = "NAME_OR_PATH")]
    pub model: String,

    /// Disable GPU acceleration
    #[arg(long)]
    pub no_gpu: bool,

    /// Language code (e.g. en, de) or "auto"
    #[arg(short, long, default_value = "auto", value_name = "LANG")]
    pub language: String,

    /// Transcript output format
    #[arg(short = 'f', long, value_enum, default_value = "txt")]
    pub output_format: FormatArg,

    /// Audio download format passed to yt-dlp
    #[arg(short, long, default_value = "mp3", value_name = "FMT")]
    pub audio_format: String,

    /// Keep the downloaded audio file after transcription
    #[arg(short, long)]
    pub keep_audio: bool,

    /// Base output directory
    #[arg(
        short,
        long,
        value_name = "PATH",
        env = "YT_TRANSCRIBE_OUTPUT_DIR",
        default_value = "."
    )]
    pub output_dir: PathBuf,

    /// Channel URL: transcribe all channel videos (batch mode)
    #[arg(short, long, value_name = "URL")]
    pub channel: Option<String>,

    /// Skip videos shorter than N seconds (channel mode)
    #[arg(long, default_value_t = 60, value_name = "N")]
    pub min_seconds: u64,

    /// Max new videos to transcribe, 0 = unlimited (channel mode)
    #[arg(long, default_value_t = 0, value_name = "N")]
    pub amount: usize,

    /// Parallel workers for channel mode
    #[arg(long, default_value_t = 1, value_name = "N")]
    pub workers: usize,
}

impl Cli {
    /// Validate argument combinations clap cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if self.url.is_some() && self.channel.is_some() {
            return Err("cannot use both a positional URL and --channel".into());
        }
        if self.url.is_none() && self.channel.is_none() {
            return Err("provide a video URL or use --channel <url>".into());
        }
        if self.workers == 0 {
            return Err("--workers must be at least 1".into());
        }
        Ok(())
    }
}

/// Requested transcript format, including the "all" expansion
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatArg {
    Txt,
    Vtt,
    Srt,
    Csv,
    Json,
    /// Every supported format
    All,
}

impl FormatArg {
    /// Expand to the concrete list of formats to write.
    pub fn expand(self) -> Vec<OutputFormat> {
        match self {
            FormatArg::Txt => vec![OutputFormat::Txt],
            FormatArg::Vtt => vec![OutputFormat::Vtt],
            FormatArg::Srt => vec![OutputFormat::Srt],
            FormatArg::Csv => vec![OutputFormat::Csv],
            FormatArg::Json => vec![OutputFormat::Json],
            FormatArg::All => OutputFormat::ALL.to_vec(),
        }
    }

    /// The format whose presence marks a video as already transcribed.
    ///
    /// "all" resolves to txt so that runs with different format selections
    /// agree on the skip signal.
    pub fn primary(self) -> OutputFormat {
        match self {
            FormatArg::All => OutputFormat::Txt,
            other => other.expand()[0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("yt-transcribe").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["https://youtu.be/abc"]);
        assert_eq!(cli.model, "base");
        assert_eq!(cli.language, "auto");
        assert_eq!(cli.output_format, FormatArg::Txt);
        assert_eq!(cli.audio_format, "mp3");
        assert_eq!(cli.min_seconds, 60);
        assert_eq!(cli.amount, 0);
        assert_eq!(cli.workers, 1);
        assert!(!cli.no_gpu);
        assert!(!cli.keep_audio);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_url_and_channel_conflict() {
        let cli = parse(&["https://youtu.be/abc", "--channel", "https://youtube.com/@c"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_requires_some_input() {
        let cli = parse(&[]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let cli = parse(&["--channel", "https://youtube.com/@c", "--workers", "0"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_format_all_expands_to_every_format() {
        assert_eq!(FormatArg::All.expand().len(), 5);
        assert_eq!(FormatArg::All.primary(), OutputFormat::Txt);
        assert_eq!(FormatArg::Srt.primary(), OutputFormat::Srt);
    }
}
