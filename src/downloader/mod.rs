//! yt-dlp subprocess wrapper: video metadata, channel listing, audio download.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::TranscribeError;

/// Immutable reference to a video, produced by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRef {
    pub id: String,
    pub title: String,
    pub duration_seconds: u64,
    pub url: String,
}

/// Canonical watch URL for a video id.
pub fn watch_url(id: &str) -> String {
    format!("https://www.youtube.com/watch?v={id}")
}

/// Wrapper around the yt-dlp binary.
#[derive(Clone)]
pub struct Downloader {
    yt_dlp_path: String,
}

impl Downloader {
    pub fn new() -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
        }
    }

    /// Fetch video metadata without downloading anything.
    pub async fn fetch_video_info(&self, url: &str) -> Result<VideoRef, TranscribeError> {
        tracing::debug!("fetching metadata for {url}");

        let output = Command::new(&self.yt_dlp_path)
            .args(["--dump-json", "--no-playlist", url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| TranscribeError::Download(format!("cannot run yt-dlp: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TranscribeError::Download(format!(
                "yt-dlp failed for {url}: {}",
                stderr.trim()
            )));
        }

        let info: VideoInfoJson = serde_json::from_slice(&output.stdout)
            .map_err(|e| TranscribeError::Download(format!("unparseable yt-dlp metadata: {e}")))?;

        Ok(VideoRef {
            url: info.webpage_url.unwrap_or_else(|| url.to_string()),
            id: info.id,
            title: info.title.unwrap_or_default(),
            duration_seconds: info.duration.unwrap_or(0.0) as u64,
        })
    }

    /// List a channel's videos in metadata-only (flat playlist) mode.
    ///
    /// Videos shorter than `min_seconds`, entries without a duration, and
    /// non-video ids (e.g. `UC…` channel ids) are excluded. Upstream order is
    /// preserved.
    pub async fn list_channel_videos(
        &self,
        channel_url: &str,
        min_seconds: u64,
    ) -> Result<Vec<VideoRef>, TranscribeError> {
        let url = videos_tab_url(channel_url);
        tracing::debug!("listing channel videos from {url}");

        let output = Command::new(&self.yt_dlp_path)
            .args(["--flat-playlist", "-j", "--no-warnings", &url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| TranscribeError::Resolution(format!("cannot run yt-dlp: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TranscribeError::Resolution(format!(
                "yt-dlp failed for {url}: {}",
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_flat_playlist(&stdout, min_seconds))
    }

    /// Download a video's audio into `dir` as `<basename>.<audio_format>`.
    pub async fn download_audio(
        &self,
        url: &str,
        dir: &Path,
        basename: &str,
        audio_format: &str,
    ) -> Result<PathBuf, TranscribeError> {
        let template = dir.join(format!("{basename}.%(ext)s"));
        tracing::debug!("downloading audio for {url} to {}", dir.display());

        let output = Command::new(&self.yt_dlp_path)
            .args([
                "--format",
                "bestaudio/best",
                "--extract-audio",
                "--audio-format",
                audio_format,
                "--audio-quality",
                "0",
                "--no-playlist",
                "--no-warnings",
                "--output",
                &template.to_string_lossy(),
                url,
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| TranscribeError::Download(format!("cannot run yt-dlp: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TranscribeError::Download(format!(
                "yt-dlp failed for {url}: {}",
                stderr.trim()
            )));
        }

        let audio_path = dir.join(format!("{basename}.{audio_format}"));
        if !audio_path.is_file() {
            return Err(TranscribeError::Download(format!(
                "yt-dlp reported success but {} is missing",
                audio_path.display()
            )));
        }
        Ok(audio_path)
    }
}

impl Default for Downloader {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait seam for the pipeline's download stage
#[async_trait]
pub trait AudioSource: Send + Sync {
    async fn download_audio(
        &self,
        url: &str,
        dir: &Path,
        basename: &str,
        audio_format: &str,
    ) -> Result<PathBuf, TranscribeError>;
}

#[async_trait]
impl AudioSource for Downloader {
    async fn download_audio(
        &self,
        url: &str,
        dir: &Path,
        basename: &str,
        audio_format: &str,
    ) -> Result<PathBuf, TranscribeError> {
        Downloader::download_audio(self, url, dir, basename, audio_format).await
    }
}

#[derive(Debug, Deserialize)]
struct VideoInfoJson {
    id: String,
    title: Option<String>,
    duration: Option<f64>,
    webpage_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FlatEntry {
    id: Option<String>,
    title: Option<String>,
    duration: Option<f64>,
    url: Option<String>,
}

/// Point a channel URL at its /videos tab, replacing any existing tab suffix.
fn videos_tab_url(channel_url: &str) -> String {
    let mut url = channel_url.trim_end_matches('/');
    for suffix in ["/videos", "/shorts", "/streams"] {
        if let Some(stripped) = url.strip_suffix(suffix) {
            url = stripped;
            break;
        }
    }
    format!("{url}/videos")
}

/// Parse yt-dlp's line-delimited flat-playlist JSON into filtered VideoRefs.
pub(crate) fn parse_flat_playlist(stdout: &str, min_seconds: u64) -> Vec<VideoRef> {
    stdout
        .lines()
        .filter_map(|line| serde_json::from_str::<FlatEntry>(line).ok())
        .filter_map(|entry| {
            let id = entry.id?;
            // Flat listings mix in channel ids (UC…) and other non-video entries
            if id.len() != 11 || id.starts_with("UC") {
                return None;
            }
            let duration = entry.duration? as u64;
            if duration < min_seconds {
                return None;
            }
            Some(VideoRef {
                url: entry.url.unwrap_or_else(|| watch_url(&id)),
                id,
                title: entry.title.unwrap_or_default(),
                duration_seconds: duration,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_videos_tab_url() {
        assert_eq!(
            videos_tab_url("https://www.youtube.com/@chan"),
            "https://www.youtube.com/@chan/videos"
        );
        assert_eq!(
            videos_tab_url("https://www.youtube.com/@chan/"),
            "https://www.youtube.com/@chan/videos"
        );
        assert_eq!(
            videos_tab_url("https://www.youtube.com/@chan/videos"),
            "https://www.youtube.com/@chan/videos"
        );
        assert_eq!(
            videos_tab_url("https://www.youtube.com/@chan/shorts"),
            "https://www.youtube.com/@chan/videos"
        );
        assert_eq!(
            videos_tab_url("https://www.youtube.com/@chan/streams"),
            "https://www.youtube.com/@chan/videos"
        );
    }

    #[test]
    fn test_parse_flat_playlist_filters() {
        let stdout = concat!(
            r#"{"id": "aaaaaaaaaaa", "title": "Long enough", "duration": 120.0, "url": "https://www.youtube.com/watch?v=aaaaaaaaaaa"}"#,
            "\n",
            r#"{"id": "bbbbbbbbbbb", "title": "Too short", "duration": 30.0}"#,
            "\n",
            r#"{"id": "UCbbbbbbbbb", "title": "Channel id", "duration": 500.0}"#,
            "\n",
            r#"{"id": "ccccccccccc", "title": "No duration"}"#,
            "\n",
            "not json at all\n",
            r#"{"id": "ddddddddddd", "title": "Also fine", "duration": 61.0}"#,
            "\n",
        );

        let refs = parse_flat_playlist(stdout, 60);
        let ids: Vec<&str> = refs.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, ["aaaaaaaaaaa", "ddddddddddd"]);
        assert_eq!(refs[0].duration_seconds, 120);
        assert_eq!(refs[0].url, "https://www.youtube.com/watch?v=aaaaaaaaaaa");
        assert_eq!(refs[1].url, watch_url("ddddddddddd"));
    }

    #[test]
    fn test_parse_flat_playlist_preserves_order() {
        let stdout = concat!(
            r#"{"id": "ccccccccccc", "duration": 300.0}"#,
            "\n",
            r#"{"id": "aaaaaaaaaaa", "duration": 100.0}"#,
            "\n",
            r#"{"id": "bbbbbbbbbbb", "duration": 200.0}"#,
            "\n",
        );
        let ids: Vec<String> = parse_flat_playlist(stdout, 0)
            .into_iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(ids, ["ccccccccccc", "aaaaaaaaaaa", "bbbbbbbbbbb"]);
    }

    #[test]
    fn test_parse_flat_playlist_empty() {
        assert!(parse_flat_playlist("", 60).is_empty());
    }
}
