use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex, PoisonError, RwLock};
use std::thread;
use std::time::{Duration, Instant};

use imagen_logging::{imagen_error, imagen_info, imagen_warn};
use thiserror::Error;

use crate::pool::{dispatch_jobs, run_batch, ChannelProgressSink, ProgressSink};
use crate::run_state::{RunPhase, RunState, RunTicket};
use crate::{
    BackendError, EngineEvent, GenerationJob, GenerationSettings, ImageBackend, MAX_VARIATIONS,
    MAX_WORKERS,
};

/// Produces the backend on the engine's blocking pool.
pub type BackendFactory =
    Box<dyn FnOnce() -> Result<Arc<dyn ImageBackend>, BackendError> + Send + 'static>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("a run is already in progress")]
    AlreadyRunning,
    #[error("no prompts to generate")]
    NoPrompts,
    #[error("image backend is not initialized")]
    BackendUnavailable,
    #[error("variation count {0} is outside 1..=5")]
    InvalidVariationCount(u8),
    #[error("worker count {0} is outside 1..=4")]
    InvalidWorkerCount(usize),
    #[error("engine thread has stopped")]
    EngineStopped,
}

enum EngineCommand {
    Initialize(BackendFactory),
    Run(RunRequest),
}

struct RunRequest {
    jobs: Vec<GenerationJob>,
    settings: GenerationSettings,
    output_dir: PathBuf,
    backend: Arc<dyn ImageBackend>,
    ticket: RunTicket,
    dispatched_at: Instant,
}

type SharedBackend = Arc<RwLock<Option<Arc<dyn ImageBackend>>>>;

/// Handle to the background engine thread that owns backend initialization
/// and every run. Cheap to clone; all clones share one event stream.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_tx: mpsc::Sender<EngineEvent>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
    backend: SharedBackend,
    run_state: RunState,
}

impl EngineHandle {
    pub fn new() -> std::io::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<EngineCommand>();
        let (event_tx, event_rx) = mpsc::channel();
        let backend: SharedBackend = Arc::new(RwLock::new(None));
        let run_state = RunState::new();

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(MAX_WORKERS)
            .thread_name("imagen-worker")
            .enable_all()
            .build()?;

        let thread_events = event_tx.clone();
        let thread_backend = backend.clone();
        let thread_state = run_state.clone();
        thread::Builder::new()
            .name("imagen-engine".to_string())
            .spawn(move || {
                while let Ok(command) = cmd_rx.recv() {
                    match command {
                        EngineCommand::Initialize(factory) => {
                            let events = thread_events.clone();
                            let slot = thread_backend.clone();
                            runtime.spawn_blocking(move || initialize_backend(factory, &slot, &events));
                        }
                        EngineCommand::Run(request) => {
                            let events = thread_events.clone();
                            let state = thread_state.clone();
                            runtime.spawn(execute_run(request, events, state));
                        }
                    }
                }
            })?;

        Ok(Self {
            cmd_tx,
            event_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
            backend,
            run_state,
        })
    }

    /// Builds the backend in the background; reports `BackendReady` or `BackendFailed`.
    pub fn initialize<F>(&self, factory: F)
    where
        F: FnOnce() -> Result<Arc<dyn ImageBackend>, BackendError> + Send + 'static,
    {
        if self
            .cmd_tx
            .send(EngineCommand::Initialize(Box::new(factory)))
            .is_err()
        {
            imagen_error!("Engine thread stopped before backend initialization");
        }
    }

    /// Installs an already constructed backend.
    pub fn set_backend(&self, backend: Arc<dyn ImageBackend>) {
        install_backend(backend, &self.backend, &self.event_tx);
    }

    pub fn has_backend(&self) -> bool {
        self.backend
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn phase(&self) -> RunPhase {
        self.run_state.phase()
    }

    /// Validates and submits one run. Rejected, not queued, while another run is active.
    pub fn start_run(
        &self,
        prompts: Vec<String>,
        settings: GenerationSettings,
        output_dir: PathBuf,
    ) -> Result<(), StartError> {
        if prompts.is_empty() {
            return Err(StartError::NoPrompts);
        }
        if !(1..=MAX_VARIATIONS).contains(&settings.variation_count) {
            return Err(StartError::InvalidVariationCount(settings.variation_count));
        }
        if !(1..=MAX_WORKERS).contains(&settings.worker_count) {
            return Err(StartError::InvalidWorkerCount(settings.worker_count));
        }
        let backend = self
            .backend
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(StartError::BackendUnavailable)?;
        let ticket = self.run_state.try_begin().ok_or(StartError::AlreadyRunning)?;
        let dispatched_at = Instant::now();

        let jobs = dispatch_jobs(prompts);
        imagen_info!(
            "Dispatching {} jobs to {} workers, output {:?}",
            jobs.len(),
            settings.worker_count,
            output_dir
        );
        self.cmd_tx
            .send(EngineCommand::Run(RunRequest {
                jobs,
                settings,
                output_dir,
                backend,
                ticket,
                dispatched_at,
            }))
            .map_err(|_| StartError::EngineStopped)
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recv_timeout(timeout)
            .ok()
    }
}

fn initialize_backend(
    factory: BackendFactory,
    slot: &SharedBackend,
    events: &mpsc::Sender<EngineEvent>,
) {
    match factory() {
        Ok(backend) => install_backend(backend, slot, events),
        Err(err) => {
            imagen_error!("Backend initialization failed: {}", err);
            let _ = events.send(EngineEvent::BackendFailed {
                message: err.to_string(),
            });
        }
    }
}

fn install_backend(
    backend: Arc<dyn ImageBackend>,
    slot: &SharedBackend,
    events: &mpsc::Sender<EngineEvent>,
) {
    let model = backend.model_name().to_string();
    *slot.write().unwrap_or_else(PoisonError::into_inner) = Some(backend);
    imagen_info!("Backend ready: {}", model);
    let _ = events.send(EngineEvent::BackendReady { model });
}

async fn execute_run(request: RunRequest, events: mpsc::Sender<EngineEvent>, state: RunState) {
    let RunRequest {
        jobs,
        settings,
        output_dir,
        backend,
        ticket,
        dispatched_at,
    } = request;
    let sink: Arc<dyn ProgressSink> = Arc::new(PhaseTrackingSink {
        inner: ChannelProgressSink::new(events.clone()),
        state,
        total: jobs.len(),
        started: AtomicUsize::new(0),
    });

    let result = run_batch(backend, jobs, settings, &output_dir, sink, dispatched_at).await;
    // Back to Idle before anyone hears about completion, so an immediate restart is accepted.
    drop(ticket);

    let event = match result {
        Ok(summary) => EngineEvent::RunCompleted(summary),
        Err(err) => {
            imagen_error!("Run aborted: {}", err);
            EngineEvent::RunFailed {
                message: err.to_string(),
            }
        }
    };
    if events.send(event).is_err() {
        imagen_warn!("Run finished but nobody is listening for engine events");
    }
}

/// Forwards pool events and advances the run phase as jobs start.
struct PhaseTrackingSink {
    inner: ChannelProgressSink,
    state: RunState,
    total: usize,
    started: AtomicUsize,
}

impl ProgressSink for PhaseTrackingSink {
    fn emit(&self, event: EngineEvent) {
        match &event {
            EngineEvent::RunStarted { .. } => self.state.advance(RunPhase::Running),
            EngineEvent::JobStarted { .. } => {
                if self.started.fetch_add(1, Ordering::SeqCst) + 1 == self.total {
                    self.state.advance(RunPhase::Draining);
                }
            }
            _ => {}
        }
        self.inner.emit(event);
    }
}
