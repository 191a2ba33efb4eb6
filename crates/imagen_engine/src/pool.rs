use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::time::Instant;

use imagen_logging::{imagen_debug, imagen_error, imagen_info, imagen_warn};
use thiserror::Error;
use tokio::task::JoinSet;

use crate::job::{generate_job, JobError};
use crate::{EngineEvent, GenerationJob, GenerationSettings, ImageBackend, RunSummary};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("worker panicked: {0}")]
    WorkerPanicked(String),
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Turns the prompt sequence into jobs, keeping each prompt's original index.
pub fn dispatch_jobs(prompts: Vec<String>) -> Vec<GenerationJob> {
    let total = prompts.len();
    prompts
        .into_iter()
        .enumerate()
        .map(|(index, prompt)| GenerationJob {
            index,
            prompt,
            total,
        })
        .collect()
}

/// Runs every job with at most `settings.worker_count` in flight and aggregates
/// results in completion order. `started_at` is when the run was dispatched.
///
/// A failing job counts as zero images and never stops its siblings. Only a
/// worker that dies without producing a result aborts the run; the jobs still
/// in flight are cancelled and awaited before the error is returned.
pub async fn run_batch(
    backend: Arc<dyn ImageBackend>,
    jobs: Vec<GenerationJob>,
    settings: GenerationSettings,
    output_dir: &Path,
    sink: Arc<dyn ProgressSink>,
    started_at: Instant,
) -> Result<RunSummary, RunError> {
    let total = jobs.len();
    let workers = settings.worker_count.max(1);
    sink.emit(EngineEvent::RunStarted { total, workers });

    let mut pending = jobs.into_iter();
    let mut in_flight = JoinSet::new();
    for job in pending.by_ref().take(workers) {
        spawn_job(&mut in_flight, job, &backend, &sink, settings, output_dir);
    }

    let mut images_saved: u64 = 0;
    let mut observed = 0usize;
    let mut failed_jobs = 0usize;
    while let Some(joined) = in_flight.join_next().await {
        let (job, result) = match joined {
            Ok(done) => done,
            Err(err) => {
                imagen_error!(
                    "Worker died, cancelling {} running jobs: {}",
                    in_flight.len(),
                    err
                );
                in_flight.abort_all();
                while in_flight.join_next().await.is_some() {}
                return Err(RunError::WorkerPanicked(err.to_string()));
            }
        };
        if let Some(next) = pending.next() {
            spawn_job(&mut in_flight, next, &backend, &sink, settings, output_dir);
        }

        observed += 1;
        let result = match result {
            Ok(count) => {
                imagen_debug!("Job {} saved {} images", job.index, count);
                images_saved += count as u64;
                Ok(count)
            }
            Err(err) => {
                imagen_warn!("Job {} failed: {}", job.index, err);
                failed_jobs += 1;
                Err(err.to_failure())
            }
        };
        sink.emit(EngineEvent::JobFinished {
            index: job.index,
            total: job.total,
            result,
        });
    }

    let summary = RunSummary {
        images_saved,
        jobs: observed,
        failed_jobs,
        elapsed: started_at.elapsed(),
        output_dir: absolute_dir(output_dir),
    };
    imagen_info!(
        "Run finished jobs={} failed={} images={} elapsed_ms={}",
        summary.jobs,
        summary.failed_jobs,
        summary.images_saved,
        summary.elapsed.as_millis()
    );
    Ok(summary)
}

type JobOutcome = (GenerationJob, Result<usize, JobError>);

fn spawn_job(
    set: &mut JoinSet<JobOutcome>,
    job: GenerationJob,
    backend: &Arc<dyn ImageBackend>,
    sink: &Arc<dyn ProgressSink>,
    settings: GenerationSettings,
    output_dir: &Path,
) {
    let backend = backend.clone();
    let sink = sink.clone();
    let dir = output_dir.to_path_buf();
    set.spawn(async move {
        sink.emit(EngineEvent::JobStarted {
            index: job.index,
            total: job.total,
            prompt: job.prompt.clone(),
        });
        let result = generate_job(backend.as_ref(), &job, &settings, &dir).await;
        (job, result)
    });
}

fn absolute_dir(dir: &Path) -> PathBuf {
    std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf())
}
