use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;

use crate::filename::{image_filename, prompt_slug};
use crate::persist::PersistError;
use crate::{
    BackendError, FailureKind, GeneratedImage, GenerationJob, GenerationRequest,
    GenerationSettings, ImageBackend, JobFailure,
};

#[derive(Debug, Error)]
pub enum JobError {
    #[error("{0}")]
    Backend(#[from] BackendError),
    #[error("{0}")]
    Persist(#[from] PersistError),
}

impl JobError {
    pub fn to_failure(&self) -> JobFailure {
        let kind = match self {
            JobError::Backend(err) => err.kind(),
            JobError::Persist(_) => FailureKind::Persist,
        };
        JobFailure::new(kind, self.to_string())
    }
}

/// Generates the images for one prompt and writes them under `output_dir`.
/// Returns the number of files written.
///
/// Files are written inline on the calling task, so cancelling the task
/// between awaits never leaves a save running behind it.
pub async fn generate_job(
    backend: &dyn ImageBackend,
    job: &GenerationJob,
    settings: &GenerationSettings,
    output_dir: &Path,
) -> Result<usize, JobError> {
    let request = GenerationRequest::for_job(job, settings);
    let images = backend.generate(&request).await?;

    let timestamp_ms = Utc::now().timestamp_millis();
    let slug = prompt_slug(&job.prompt);
    let saved = save_images(&images, output_dir, timestamp_ms, &slug)?;
    Ok(saved.len())
}

/// Saves in backend order so `_v1`, `_v2`, ... follow the returned sequence.
pub fn save_images(
    images: &[GeneratedImage],
    dir: &Path,
    timestamp_ms: i64,
    slug: &str,
) -> Result<Vec<PathBuf>, PersistError> {
    images
        .iter()
        .enumerate()
        .map(|(i, image)| image.save(dir, &image_filename(timestamp_ms, slug, i + 1)))
        .collect()
}
