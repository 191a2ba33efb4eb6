use std::path::PathBuf;

use crate::{AspectRatio, VariationCount, WorkerCount};

/// Result of one job as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Saved(usize),
    Failed(String),
}

/// Why the engine refused to start a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    AlreadyRunning,
    NoPrompts,
    BackendUnavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the prompt text area.
    PromptsEdited(String),
    /// User appended a single prompt line.
    PromptAdded(String),
    VariationsSelected(VariationCount),
    AspectRatioSelected(AspectRatio),
    WorkersSelected(WorkerCount),
    /// User clicked Start.
    StartClicked,
    LoadPromptsClicked(PathBuf),
    SavePromptsClicked(PathBuf),
    ClearPromptsClicked,
    /// Answer to the pending confirmation question.
    ConfirmationAnswered(bool),
    OpenResultsClicked,
    NewResultsFolderClicked,
    /// The modal dialog at the front of the queue was closed.
    DialogDismissed,

    BackendConnecting,
    BackendReady { model: String },
    BackendFailed { message: String },

    PromptsLoaded { path: PathBuf, text: String },
    PromptsSaved { path: PathBuf },
    FileOperationFailed { title: String, message: String },
    ResultsFolderCreated { path: PathBuf },
    ResultsFolderOpenFailed { message: String },

    /// Engine accepted the run and handed all jobs to the pool.
    RunStarted { total: usize, workers: usize },
    JobStarted {
        index: usize,
        total: usize,
        prompt: String,
    },
    JobFinished {
        index: usize,
        total: usize,
        outcome: JobOutcome,
    },
    RunCompleted {
        images_saved: u64,
        elapsed_ms: u64,
        output_dir: PathBuf,
    },
    RunFailed { message: String },
    RunRejected(RejectReason),

    /// Fallback for placeholder wiring.
    NoOp,
}
