use std::path::Path;
use url::Url;

/// Validate a URL and return its normalized form.
pub fn validate_url(input: &str) -> crate::Result<String> {
    let parsed =
        Url::parse(input).map_err(|_| anyhow::anyhow!("Invalid URL format: {input}"))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("URL must use HTTP or HTTPS protocol");
    }

    Ok(parsed.to_string())
}

/// Format seconds in human-readable form for listings and log lines.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

/// Check if a file exists and is readable
pub fn check_file_accessible(path: &Path) -> crate::Result<()> {
    if !path.exists() {
        anyhow::bail!("File does not exist: {}", path.display());
    }
    if !path.is_file() {
        anyhow::bail!("Path is not a file: {}", path.display());
    }
    std::fs::metadata(path)
        .map_err(|e| anyhow::anyhow!("Cannot access file {}: {}", path.display(), e))?;
    Ok(())
}

/// Check if the current environment has the required external tools
pub async fn check_dependencies() -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available("yt-dlp", "--version").await {
        missing.push("yt-dlp - required for video listing and audio download".to_string());
    }
    if !check_command_available("ffmpeg", "-version").await {
        missing.push("ffmpeg - required for audio normalization".to_string());
    }
    if !check_command_available("whisper-cli", "--help").await {
        missing.push("whisper-cli - required for transcription (whisper-cpp)".to_string());
    }

    missing
}

/// Check if a command is available in PATH
async fn check_command_available(command: &str, probe_arg: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg(probe_arg)
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://www.youtube.com/watch?v=abc").is_ok());
        assert!(validate_url("http://example.com").is_ok());
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_url("not-a-url").is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(30), "30s");
        assert_eq!(format_duration(90), "1m 30s");
        assert_eq!(format_duration(3661), "1h 1m 1s");
        assert_eq!(format_duration(0), "0s");
    }

    #[test]
    fn test_check_file_accessible() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs_err::write(&file, "x").unwrap();

        assert!(check_file_accessible(&file).is_ok());
        assert!(check_file_accessible(&dir.path().join("missing")).is_err());
        assert!(check_file_accessible(dir.path()).is_err());
    }

    #[tokio::test]
    async fn test_check_command_available_missing() {
        assert!(!check_command_available("definitely-not-a-real-binary", "--version").await);
    }
}
