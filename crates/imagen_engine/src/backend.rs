use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::persist::{PersistError, ResultsWriter};
use crate::{
    AspectRatio, FailureKind, GenerationJob, GenerationSettings, PersonGeneration,
    SafetyFilterLevel,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("backend not configured: {0}")]
    Config(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("http status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    pub fn kind(&self) -> FailureKind {
        match self {
            BackendError::Config(_) | BackendError::Auth(_) => FailureKind::Auth,
            BackendError::HttpStatus { status, .. } => FailureKind::HttpStatus(*status),
            BackendError::Timeout(_) => FailureKind::Timeout,
            BackendError::Network(_) => FailureKind::Network,
            BackendError::InvalidResponse(_) => FailureKind::InvalidResponse,
        }
    }
}

/// One call to the image model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub number_of_images: u8,
    pub aspect_ratio: AspectRatio,
    pub safety_filter_level: SafetyFilterLevel,
    pub person_generation: PersonGeneration,
}

impl GenerationRequest {
    pub fn for_job(job: &GenerationJob, settings: &GenerationSettings) -> Self {
        Self {
            prompt: job.prompt.clone(),
            number_of_images: settings.variation_count,
            aspect_ratio: settings.aspect_ratio,
            safety_filter_level: settings.safety_filter_level,
            person_generation: settings.person_generation,
        }
    }
}

/// Encoded image bytes as returned by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl GeneratedImage {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Writes the image as `{dir}/{filename}`, creating `dir` if needed.
    pub fn save(&self, dir: &Path, filename: &str) -> Result<PathBuf, PersistError> {
        ResultsWriter::new(dir).write(filename, &self.bytes)
    }
}

/// Remote image model. Shared read-only across workers; calls are independent.
#[async_trait::async_trait]
pub trait ImageBackend: Send + Sync {
    /// Model identifier shown once the backend is ready.
    fn model_name(&self) -> &str;

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<GeneratedImage>, BackendError>;
}
