use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use chrono::Local;
use imagen_core::{AspectRatio, Effect, JobOutcome, Msg, RejectReason, Settings};
use imagen_engine::{
    create_results_folder, load_prompt_file, open_in_file_manager, save_prompt_file,
    EngineEvent, EngineHandle, GenerationSettings, ImageBackend, StartError, VertexBackend,
    VertexSettings,
};
use imagen_logging::{imagen_error, imagen_info, imagen_warn};

use super::app::AppInput;

const EVENT_POLL: Duration = Duration::from_millis(100);

/// Runs effects produced by `update` and feeds engine events back as messages.
pub struct EffectRunner {
    engine: EngineHandle,
    msg_tx: mpsc::Sender<AppInput>,
    folders_base: PathBuf,
}

impl EffectRunner {
    /// `folders_base` is where "new results folder" creates its timestamped directories.
    pub fn new(engine: EngineHandle, msg_tx: mpsc::Sender<AppInput>, folders_base: PathBuf) -> Self {
        let runner = Self {
            engine,
            msg_tx,
            folders_base,
        };
        runner.spawn_event_loop();
        runner
    }

    /// Starts backend initialization in the engine's background pool.
    pub fn initialize_backend(&self, settings: VertexSettings) {
        self.send(Msg::BackendConnecting);
        self.engine.initialize(move || {
            VertexBackend::connect(&settings).map(|backend| Arc::new(backend) as Arc<dyn ImageBackend>)
        });
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartRun {
                    prompts,
                    settings,
                    output_dir,
                } => {
                    imagen_info!(
                        "StartRun prompts={} settings={:?} output={:?}",
                        prompts.len(),
                        settings,
                        output_dir
                    );
                    if let Err(err) =
                        self.engine
                            .start_run(prompts, map_settings(settings), output_dir)
                    {
                        imagen_warn!("Engine refused run: {}", err);
                        self.send(map_start_error(err));
                    }
                }
                Effect::LoadPrompts { path } => {
                    self.spawn_io(move || match load_prompt_file(&path) {
                        Ok(text) => Msg::PromptsLoaded { path, text },
                        Err(err) => {
                            imagen_error!("Loading prompts from {:?} failed: {}", path, err);
                            Msg::FileOperationFailed {
                                title: "Error".to_string(),
                                message: format!("Could not load file: {err}"),
                            }
                        }
                    });
                }
                Effect::SavePrompts { path, text } => {
                    self.spawn_io(move || match save_prompt_file(&path, &text) {
                        Ok(()) => Msg::PromptsSaved { path },
                        Err(err) => {
                            imagen_error!("Saving prompts to {:?} failed: {}", path, err);
                            Msg::FileOperationFailed {
                                title: "Error".to_string(),
                                message: format!("Could not save file: {err}"),
                            }
                        }
                    });
                }
                Effect::OpenResultsFolder { path } => {
                    self.spawn_io(move || match open_in_file_manager(&path) {
                        Ok(()) => Msg::NoOp,
                        Err(err) => {
                            imagen_error!("Opening {:?} failed: {}", path, err);
                            Msg::ResultsFolderOpenFailed {
                                message: err.to_string(),
                            }
                        }
                    });
                }
                Effect::CreateResultsFolder => {
                    let base = self.folders_base.clone();
                    self.spawn_io(move || match create_results_folder(&base, &Local::now()) {
                        Ok(path) => Msg::ResultsFolderCreated { path },
                        Err(err) => {
                            imagen_error!("Creating results folder under {:?} failed: {}", base, err);
                            Msg::FileOperationFailed {
                                title: "Error".to_string(),
                                message: format!("Could not create folder: {err}"),
                            }
                        }
                    });
                }
            }
        }
    }

    fn send(&self, msg: Msg) {
        let _ = self.msg_tx.send(AppInput::Msg(msg));
    }

    /// File work stays off the UI thread; the result comes back as a message.
    fn spawn_io<F>(&self, work: F)
    where
        F: FnOnce() -> Msg + Send + 'static,
    {
        let msg_tx = self.msg_tx.clone();
        thread::spawn(move || {
            let _ = msg_tx.send(AppInput::Msg(work()));
        });
    }

    fn spawn_event_loop(&self) {
        let engine = self.engine.clone();
        let msg_tx = self.msg_tx.clone();
        thread::spawn(move || loop {
            let Some(event) = engine.recv_timeout(EVENT_POLL) else {
                continue;
            };
            if msg_tx.send(AppInput::Msg(map_event(event))).is_err() {
                break;
            }
        });
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::BackendReady { model } => Msg::BackendReady { model },
        EngineEvent::BackendFailed { message } => Msg::BackendFailed { message },
        EngineEvent::RunStarted { total, workers } => Msg::RunStarted { total, workers },
        EngineEvent::JobStarted {
            index,
            total,
            prompt,
        } => Msg::JobStarted {
            index,
            total,
            prompt,
        },
        EngineEvent::JobFinished {
            index,
            total,
            result,
        } => Msg::JobFinished {
            index,
            total,
            outcome: match result {
                Ok(count) => JobOutcome::Saved(count),
                Err(failure) => JobOutcome::Failed(failure.message),
            },
        },
        EngineEvent::RunCompleted(summary) => Msg::RunCompleted {
            images_saved: summary.images_saved,
            elapsed_ms: u64::try_from(summary.elapsed.as_millis()).unwrap_or(u64::MAX),
            output_dir: summary.output_dir,
        },
        EngineEvent::RunFailed { message } => Msg::RunFailed { message },
    }
}

fn map_start_error(err: StartError) -> Msg {
    match err {
        StartError::AlreadyRunning => Msg::RunRejected(RejectReason::AlreadyRunning),
        StartError::NoPrompts => Msg::RunRejected(RejectReason::NoPrompts),
        StartError::BackendUnavailable => Msg::RunRejected(RejectReason::BackendUnavailable),
        other => Msg::RunFailed {
            message: other.to_string(),
        },
    }
}

fn map_settings(settings: Settings) -> GenerationSettings {
    GenerationSettings::new(
        settings.variations.get(),
        map_aspect(settings.aspect_ratio),
        usize::from(settings.workers.get()),
    )
}

fn map_aspect(ratio: AspectRatio) -> imagen_engine::AspectRatio {
    match ratio {
        AspectRatio::Square => imagen_engine::AspectRatio::Square,
        AspectRatio::Widescreen => imagen_engine::AspectRatio::Widescreen,
        AspectRatio::Portrait => imagen_engine::AspectRatio::Portrait,
        AspectRatio::FourThree => imagen_engine::AspectRatio::FourThree,
        AspectRatio::ThreeFour => imagen_engine::AspectRatio::ThreeFour,
    }
}
