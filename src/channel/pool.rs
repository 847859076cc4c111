//! Bounded worker pool for channel mode.
//!
//! At most `workers` jobs run concurrently; the pool drains only after every
//! dispatched job has finished. A failing or panicking job becomes a failed
//! [`JobResult`] and never aborts its siblings.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::downloader::VideoRef;
use crate::transcribe::pipeline::{JobResult, JobStatus, Stage};

/// Dispatch each video to `job`, with at most `workers` running at once.
///
/// `job` receives the video, its input index, and a 1-based worker label for
/// logging. Results are collected by completion order but returned sorted by
/// input order, so summaries are deterministic regardless of scheduling.
pub async fn run_pool<F, Fut>(videos: Vec<VideoRef>, workers: usize, job: F) -> Vec<JobResult>
where
    F: Fn(VideoRef, usize, usize) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = JobResult> + Send + 'static,
{
    let job = Arc::new(job);
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut tasks = JoinSet::new();
    let mut dispatched: HashMap<tokio::task::Id, (usize, VideoRef)> = HashMap::new();

    for (index, video) in videos.into_iter().enumerate() {
        let job = Arc::clone(&job);
        let semaphore = Arc::clone(&semaphore);
        let worker = (index % workers.max(1)) + 1;
        let task_video = video.clone();
        let handle = tasks.spawn(async move {
            // holding the permit (inside the Result) bounds concurrency;
            // the semaphore is never closed
            let _permit = semaphore.acquire().await;
            (index, job(task_video, index, worker).await)
        });
        dispatched.insert(handle.id(), (index, video));
    }

    let mut indexed: Vec<(usize, JobResult)> = Vec::with_capacity(dispatched.len());
    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((_, (index, result))) => indexed.push((index, result)),
            Err(join_err) => {
                // a panicked job still gets a terminal status in the summary
                tracing::error!("worker task aborted: {join_err}");
                if let Some((index, video)) = dispatched.get(&join_err.id()) {
                    indexed.push((
                        *index,
                        JobResult {
                            video_id: video.id.clone(),
                            title: video.title.clone(),
                            status: JobStatus::Failed {
                                stage: Stage::Pending,
                                error: format!("worker task aborted: {join_err}"),
                            },
                            output_paths: Vec::new(),
                        },
                    ));
                }
            }
        }
    }

    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, result)| result).collect()
}
