use std::path::PathBuf;

use crate::{BackendStatus, Confirmation, Dialog, LogEntry, RunPhase, RunProgress, Settings};

#[derive(Debug, Clone, PartialEq)]
pub struct AppViewModel {
    pub phase: RunPhase,
    /// Start is disabled while a run is dispatching, running or draining.
    pub start_enabled: bool,
    pub settings: Settings,
    pub prompt_text: String,
    pub prompt_count: usize,
    pub backend: BackendStatus,
    pub results_dir: PathBuf,
    pub progress_percent: f32,
    pub status: String,
    pub log: Vec<LogEntry>,
    pub run: RunProgress,
    pub confirmation: Option<Confirmation>,
    /// Front of the modal dialog queue.
    pub dialog: Option<Dialog>,
    pub dirty: bool,
}
