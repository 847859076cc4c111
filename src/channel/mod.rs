//! Channel batch mode: resolve, skip, fan out, summarize.

use console::style;
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::downloader::{Downloader, VideoRef};
use crate::output::{self, OutputFormat};
use crate::transcribe::pipeline::{self, JobResult, JobStatus};
use crate::transcribe::SpeechEngine;
use crate::TranscribeError;

pub mod pool;

/// Whether a video already has a transcript in the output directory.
///
/// Pure filesystem check against the primary format's deterministic path.
/// Skip decisions are made once, before dispatch; concurrent runs over the
/// same directory are not guarded against.
pub fn is_transcribed(video: &VideoRef, output_dir: &Path, primary: OutputFormat) -> bool {
    output::transcript_path(output_dir, &video.id, primary).is_file()
}

/// Skip filter: drop videos that already have a primary-format transcript,
/// preserving resolver order.
pub fn filter_pending(
    videos: &[VideoRef],
    output_dir: &Path,
    primary: OutputFormat,
) -> Vec<VideoRef> {
    videos
        .iter()
        .filter(|v| !is_transcribed(v, output_dir, primary))
        .cloned()
        .collect()
}

/// Cap the pending list to `amount` new videos; 0 means unlimited. Applied
/// after the skip filter so skipped videos never count toward the cap.
pub fn apply_amount(mut pending: Vec<VideoRef>, amount: usize) -> Vec<VideoRef> {
    if amount > 0 && pending.len() > amount {
        pending.truncate(amount);
    }
    pending
}

/// Transcribe a channel's videos with a bounded worker pool.
///
/// Returns one terminal [`JobResult`] per considered video (skipped ones
/// included), in resolver order. Fails only on channel resolution, before any
/// dispatch.
pub async fn run_channel_mode(
    channel_url: &str,
    config: Arc<Config>,
    downloader: Downloader,
    engine: Arc<dyn SpeechEngine>,
) -> Result<Vec<JobResult>, TranscribeError> {
    tracing::info!(
        "fetching video list (min duration: {}s)",
        config.min_seconds
    );
    let all = downloader
        .list_channel_videos(channel_url, config.min_seconds)
        .await?;

    if all.is_empty() {
        tracing::info!("no videos found");
        return Ok(Vec::new());
    }

    let total = all.len();
    let pending = filter_pending(&all, &config.output_dir, config.primary_format);
    let already_done = total - pending.len();
    tracing::info!(
        "found {total} videos, {already_done} already transcribed, {} remaining",
        pending.len()
    );

    // skip decisions are made exactly once, from the filter above
    let pending_ids: std::collections::HashSet<String> =
        pending.iter().map(|v| v.id.clone()).collect();
    let skipped: Vec<JobResult> = all
        .iter()
        .filter(|v| !pending_ids.contains(&v.id))
        .map(JobResult::skipped)
        .collect();
    let to_process = apply_amount(pending, config.amount);

    if to_process.is_empty() {
        tracing::info!("nothing to transcribe");
        return Ok(skipped);
    }

    let amount_note = if config.amount > 0 {
        format!(" (--amount={})", config.amount)
    } else {
        String::new()
    };
    tracing::info!(
        "will transcribe {} videos{amount_note} with {} worker(s)",
        to_process.len(),
        config.workers
    );

    println!("\n  Videos to transcribe:");
    for (i, video) in to_process.iter().enumerate() {
        println!(
            "    {}. {} ({})",
            i + 1,
            video.url,
            crate::utils::format_duration(video.duration_seconds)
        );
    }
    println!();

    let job_count = to_process.len();
    let job_config = Arc::clone(&config);
    let processed = pool::run_pool(to_process, config.workers, move |video, index, worker| {
        let config = Arc::clone(&job_config);
        let downloader = downloader.clone();
        let engine = Arc::clone(&engine);
        async move {
            let label = format!("({}/{job_count}) ", index + 1);
            pipeline::run(&video, &config, &downloader, engine.as_ref(), worker, &label).await
        }
    })
    .await;

    let succeeded = processed.iter().filter(|r| !r.is_failure()).count();
    let failed = processed.len() - succeeded;
    tracing::info!("batch complete: {succeeded} succeeded, {failed} failed");

    // skipped and processed entries interleave in resolver order
    let results = merge_in_resolver_order(&all, skipped, processed);
    print_summary(&results);
    Ok(results)
}

fn merge_in_resolver_order(
    all: &[VideoRef],
    skipped: Vec<JobResult>,
    processed: Vec<JobResult>,
) -> Vec<JobResult> {
    let mut by_id: std::collections::HashMap<String, JobResult> = skipped
        .into_iter()
        .chain(processed)
        .map(|r| (r.video_id.clone(), r))
        .collect();

    all.iter().filter_map(|v| by_id.remove(&v.id)).collect()
}

fn print_summary(results: &[JobResult]) {
    println!("\n  Summary:");
    for result in results {
        let status = match &result.status {
            JobStatus::Completed => style("completed".to_string()).green(),
            JobStatus::Skipped => style("skipped".to_string()).dim(),
            JobStatus::Failed { stage, error } => {
                style(format!("failed ({stage}: {error})")).red()
            }
        };
        println!("    {} {}", result.video_id, status);
    }
    println!();
}
