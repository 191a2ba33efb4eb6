//! Imagen batch engine: image backend, worker pool and file output.
mod backend;
mod engine;
mod filename;
mod folders;
mod job;
mod persist;
mod pool;
mod prompt_file;
mod run_state;
mod types;
mod vertex;

pub use backend::{BackendError, GeneratedImage, GenerationRequest, ImageBackend};
pub use engine::{BackendFactory, EngineHandle, StartError};
pub use filename::{image_filename, prompt_slug, results_folder_name, PROMPT_SLUG_MAX_CHARS};
pub use folders::{create_results_folder, open_in_file_manager};
pub use job::{generate_job, save_images, JobError};
pub use persist::{ensure_results_dir, PersistError, ResultsWriter};
pub use pool::{dispatch_jobs, run_batch, ChannelProgressSink, ProgressSink, RunError};
pub use prompt_file::{load_prompt_file, save_prompt_file};
pub use run_state::{RunPhase, RunState, RunTicket};
pub use types::{
    AspectRatio, EngineEvent, FailureKind, GenerationJob, GenerationSettings, JobFailure,
    JobIndex, PersonGeneration, RunSummary, SafetyFilterLevel, MAX_VARIATIONS, MAX_WORKERS,
};
pub use vertex::{VertexBackend, VertexSettings};
