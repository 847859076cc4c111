//! Whisper model resolution: local path, cache lookup, or auto-download.

use anyhow::{Context, Result};
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const DEFAULT_MODEL: &str = "base";

const HF_BASE_URL: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";
const KNOWN_MODELS: &str = "tiny, base, small, medium, large-v3, large-v3-turbo";

/// Directory where downloaded GGML models are cached.
///
/// `$WHISPER_CPP_MODEL_DIR` overrides the default `~/.cache/whisper-cpp`.
pub fn model_cache_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("WHISPER_CPP_MODEL_DIR") {
        return PathBuf::from(dir);
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("whisper-cpp")
}

/// Resolve a model name or file path to an actual GGML model file.
///
/// An existing file path is used directly. Otherwise the name is looked up as
/// `ggml-<name>.bin` in the cache dir and auto-downloaded when missing.
pub async fn resolve_model(name_or_path: &str) -> Result<PathBuf> {
    let path = Path::new(name_or_path);
    if path.is_file() {
        return Ok(path.to_path_buf());
    }

    let model_file = format!("ggml-{name_or_path}.bin");
    let model_path = model_cache_dir().join(&model_file);
    if model_path.is_file() {
        return Ok(model_path);
    }

    let url = format!("{HF_BASE_URL}/{model_file}");
    tracing::info!("downloading model {model_file}");
    download_model(&url, &model_path)
        .await
        .with_context(|| format!("failed to download model from {url} (known models: {KNOWN_MODELS})"))?;
    tracing::info!("model saved to {}", model_path.display());

    Ok(model_path)
}

async fn download_model(url: &str, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs_err::create_dir_all(parent)?;
    }

    // download to a .part file, rename only on success
    let part_path = dest.with_extension("bin.part");
    let result = stream_to_file(url, &part_path).await;
    if result.is_err() {
        let _ = fs_err::remove_file(&part_path);
        return result;
    }

    fs_err::rename(&part_path, dest)?;
    Ok(())
}

async fn stream_to_file(url: &str, path: &Path) -> Result<()> {
    let response = reqwest::get(url)
        .await
        .context("request failed")?
        .error_for_status()
        .context("server rejected model download")?;

    let total = response.content_length().unwrap_or(0);
    let progress = ProgressBar::new(total);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
            .context("invalid progress template")?,
    );
    progress.set_message("Downloading model...");

    let mut file = fs_err::File::create(path)?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("download interrupted")?;
        file.write_all(&chunk)?;
        progress.inc(chunk.len() as u64);
    }
    progress.finish_with_message("Download complete");

    Ok(())
}
