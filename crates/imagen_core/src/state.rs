use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use imagen_logging::format_log_line;

use crate::view_model::AppViewModel;
use crate::{parse_prompts, Settings, SAMPLE_PROMPTS};

pub const DEFAULT_RESULTS_DIR: &str = "results";

/// Run lifecycle as seen by the UI. Mirrors the engine's run state from its events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Idle,
    Dispatching,
    Running,
    Draining,
}

impl RunPhase {
    pub fn is_active(self) -> bool {
        !matches!(self, RunPhase::Idle)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BackendStatus {
    #[default]
    Connecting,
    Ready {
        model: String,
    },
    Failed {
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    pub kind: DialogKind,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    ClearPrompts,
}

/// Live counters for the current (or last) run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunProgress {
    pub total_jobs: usize,
    pub started_jobs: usize,
    pub finished_jobs: usize,
    pub failed_jobs: usize,
    pub images_saved: u64,
}

/// One run-log line, stamped when it was recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub at: DateTime<Local>,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_log_line(&self.at, &self.message))
    }
}

/// Source of log timestamps. Replaceable so tests see fixed times.
#[derive(Clone, Copy)]
pub struct Clock(pub fn() -> DateTime<Local>);

impl Default for Clock {
    fn default() -> Self {
        Clock(Local::now)
    }
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Clock")
    }
}

// The clock is not part of the observable state.
impl PartialEq for Clock {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    settings: Settings,
    prompt_text: String,
    phase: RunPhase,
    backend: BackendStatus,
    results_dir: PathBuf,
    progress_percent: f32,
    status: String,
    log: Vec<LogEntry>,
    clock: Clock,
    run: RunProgress,
    pending_confirmation: Option<Confirmation>,
    dialogs: VecDeque<Dialog>,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            prompt_text: String::new(),
            phase: RunPhase::Idle,
            backend: BackendStatus::Connecting,
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
            progress_percent: 0.0,
            status: "Ready".to_string(),
            log: Vec::new(),
            clock: Clock::default(),
            run: RunProgress::default(),
            pending_confirmation: None,
            dialogs: VecDeque::new(),
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.results_dir = dir.into();
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_sample_prompts(mut self) -> Self {
        self.prompt_text = SAMPLE_PROMPTS.join("\n");
        self
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            phase: self.phase,
            start_enabled: !self.phase.is_active(),
            settings: self.settings,
            prompt_text: self.prompt_text.clone(),
            prompt_count: self.prompts().len(),
            backend: self.backend.clone(),
            results_dir: self.results_dir.clone(),
            progress_percent: self.progress_percent,
            status: self.status.clone(),
            log: self.log.clone(),
            run: self.run,
            confirmation: self.pending_confirmation,
            dialog: self.dialogs.front().cloned(),
            dirty: self.dirty,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    pub fn prompts(&self) -> Vec<String> {
        parse_prompts(&self.prompt_text)
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn settings_mut(&mut self) -> &mut Settings {
        self.dirty = true;
        &mut self.settings
    }

    pub(crate) fn prompt_text(&self) -> &str {
        &self.prompt_text
    }

    pub(crate) fn set_prompt_text(&mut self, text: String) {
        self.prompt_text = text;
        self.dirty = true;
    }

    pub(crate) fn append_prompt(&mut self, prompt: &str) {
        if !self.prompt_text.is_empty() && !self.prompt_text.ends_with('\n') {
            self.prompt_text.push('\n');
        }
        self.prompt_text.push_str(prompt);
        self.dirty = true;
    }

    pub(crate) fn set_phase(&mut self, phase: RunPhase) {
        self.phase = phase;
        self.dirty = true;
    }

    pub(crate) fn backend(&self) -> &BackendStatus {
        &self.backend
    }

    pub(crate) fn set_backend(&mut self, backend: BackendStatus) {
        self.backend = backend;
        self.dirty = true;
    }

    pub(crate) fn set_results_dir(&mut self, dir: PathBuf) {
        self.results_dir = dir;
        self.dirty = true;
    }

    pub(crate) fn set_progress(&mut self, percent: f32) {
        self.progress_percent = percent.clamp(0.0, 100.0);
        self.dirty = true;
    }

    pub(crate) fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
        self.dirty = true;
    }

    pub(crate) fn log(&mut self, line: impl Into<String>) {
        let at = (self.clock.0)();
        self.log.push(LogEntry {
            at,
            message: line.into(),
        });
        self.dirty = true;
    }

    pub(crate) fn run_mut(&mut self) -> &mut RunProgress {
        self.dirty = true;
        &mut self.run
    }

    pub(crate) fn set_confirmation(&mut self, confirmation: Option<Confirmation>) {
        self.pending_confirmation = confirmation;
        self.dirty = true;
    }

    pub(crate) fn take_confirmation(&mut self) -> Option<Confirmation> {
        let taken = self.pending_confirmation.take();
        if taken.is_some() {
            self.dirty = true;
        }
        taken
    }

    pub(crate) fn push_dialog(&mut self, kind: DialogKind, title: &str, message: impl Into<String>) {
        self.dialogs.push_back(Dialog {
            kind,
            title: title.to_string(),
            message: message.into(),
        });
        self.dirty = true;
    }

    pub(crate) fn dismiss_dialog(&mut self) {
        if self.dialogs.pop_front().is_some() {
            self.dirty = true;
        }
    }
}
