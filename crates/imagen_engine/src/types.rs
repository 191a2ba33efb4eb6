use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Zero-based position of a prompt in the submitted sequence.
pub type JobIndex = usize;

pub const MAX_VARIATIONS: u8 = 5;
pub const MAX_WORKERS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AspectRatio {
    #[default]
    Square,
    Widescreen,
    Portrait,
    FourThree,
    ThreeFour,
}

impl AspectRatio {
    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Widescreen => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::FourThree => "4:3",
            AspectRatio::ThreeFour => "3:4",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SafetyFilterLevel {
    BlockMost,
    #[default]
    BlockSome,
    BlockFew,
}

impl SafetyFilterLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            SafetyFilterLevel::BlockMost => "block_most",
            SafetyFilterLevel::BlockSome => "block_some",
            SafetyFilterLevel::BlockFew => "block_few",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersonGeneration {
    DontAllow,
    #[default]
    AllowAdult,
    AllowAll,
}

impl PersonGeneration {
    pub fn as_str(self) -> &'static str {
        match self {
            PersonGeneration::DontAllow => "dont_allow",
            PersonGeneration::AllowAdult => "allow_adult",
            PersonGeneration::AllowAll => "allow_all",
        }
    }
}

/// Parameters shared by every job of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationSettings {
    pub variation_count: u8,
    pub aspect_ratio: AspectRatio,
    pub worker_count: usize,
    pub safety_filter_level: SafetyFilterLevel,
    pub person_generation: PersonGeneration,
}

impl GenerationSettings {
    pub fn new(variation_count: u8, aspect_ratio: AspectRatio, worker_count: usize) -> Self {
        Self {
            variation_count,
            aspect_ratio,
            worker_count,
            safety_filter_level: SafetyFilterLevel::default(),
            person_generation: PersonGeneration::default(),
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self::new(3, AspectRatio::Square, 2)
    }
}

/// One prompt's unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationJob {
    pub index: JobIndex,
    pub prompt: String,
    pub total: usize,
}

/// Run totals reported once the pool drains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub images_saved: u64,
    pub jobs: usize,
    pub failed_jobs: usize,
    pub elapsed: Duration,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    BackendReady {
        model: String,
    },
    BackendFailed {
        message: String,
    },
    RunStarted {
        total: usize,
        workers: usize,
    },
    JobStarted {
        index: JobIndex,
        total: usize,
        prompt: String,
    },
    JobFinished {
        index: JobIndex,
        total: usize,
        result: Result<usize, JobFailure>,
    },
    RunCompleted(RunSummary),
    RunFailed {
        message: String,
    },
}

/// Cloneable description of a failed job, carried in events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl JobFailure {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Auth,
    HttpStatus(u16),
    Timeout,
    Network,
    InvalidResponse,
    Persist,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Auth => write!(f, "authentication"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::InvalidResponse => write!(f, "invalid response"),
            FailureKind::Persist => write!(f, "write error"),
        }
    }
}
