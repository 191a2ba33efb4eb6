//! Imagen batch core: pure state machine, settings and view-model helpers.
mod effect;
mod msg;
mod prompts;
mod settings;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::{JobOutcome, Msg, RejectReason};
pub use prompts::{parse_prompts, prompts_file_text, truncate_chars, SAMPLE_PROMPTS};
pub use settings::{AspectRatio, Settings, VariationCount, WorkerCount};
pub use state::{
    AppState, BackendStatus, Clock, Confirmation, Dialog, DialogKind, LogEntry, RunPhase,
    RunProgress, DEFAULT_RESULTS_DIR,
};
pub use update::update;
pub use view_model::AppViewModel;
