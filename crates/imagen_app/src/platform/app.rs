use std::io::{self, Write};
use std::path::Path;
use std::sync::mpsc;

use anyhow::Context;
use imagen_core::{update, AppState, Msg};
use imagen_engine::EngineHandle;
use imagen_logging::{imagen_info, imagen_warn};

use super::config::{AppConfig, CONFIG_FILENAME};
use super::effects::EffectRunner;
use super::logging::{self, LogDestination};
use super::ui;
use super::ui::render::TerminalRenderer;

/// Everything the UI thread reacts to.
#[derive(Debug)]
pub enum AppInput {
    Msg(Msg),
    /// Print a read-only listing.
    Show(Listing),
    /// Print a one-off line that does not belong in the run log.
    Notice(String),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    Prompts,
    Settings,
    Help,
}

pub fn run_app() -> anyhow::Result<()> {
    logging::initialize(LogDestination::from_env());
    imagen_info!("imagen_batch starting");

    let config = AppConfig::load_or_default(Path::new(CONFIG_FILENAME));
    let mut state = AppState::new()
        .with_settings(config.initial_settings())
        .with_results_dir(config.results_dir.clone());
    if config.load_sample_prompts {
        state = state.with_sample_prompts();
    }

    let engine = EngineHandle::new().context("starting the engine thread")?;
    let (msg_tx, msg_rx) = mpsc::channel::<AppInput>();
    let effects = EffectRunner::new(engine.clone(), msg_tx.clone(), config.folders_base());
    effects.initialize_backend(config.vertex_settings());
    ui::input::spawn_reader(msg_tx);

    let stdout = io::stdout();
    let mut renderer = TerminalRenderer::new();
    {
        let mut out = stdout.lock();
        writeln!(out, "Imagen batch generator ({})", config.model_id)?;
        writeln!(out, "{}", ui::input::HELP)?;
    }
    state = render(state, &mut renderer, &mut stdout.lock())?;

    while let Ok(input) = msg_rx.recv() {
        match input {
            AppInput::Msg(msg) => {
                let (next, pending) = update(state, msg);
                state = next;
                effects.enqueue(pending);
            }
            AppInput::Show(listing) => {
                let view = state.view();
                let text = match listing {
                    Listing::Prompts => ui::render::prompt_listing(&state.prompts()),
                    Listing::Settings => ui::render::settings_listing(&view),
                    Listing::Help => ui::input::HELP.to_string(),
                };
                writeln!(stdout.lock(), "{text}")?;
            }
            AppInput::Notice(text) => writeln!(stdout.lock(), "{text}")?,
            AppInput::Quit => break,
        }
        state = render(state, &mut renderer, &mut stdout.lock())?;
    }

    if engine.phase() != imagen_engine::RunPhase::Idle {
        imagen_warn!("Exiting with a run in progress; unfinished jobs are abandoned");
    }
    imagen_info!("imagen_batch exiting");
    Ok(())
}

/// Prints pending changes. Dialogs are acknowledged as soon as they are shown.
fn render<W: Write>(
    mut state: AppState,
    renderer: &mut TerminalRenderer,
    out: &mut W,
) -> io::Result<AppState> {
    while state.consume_dirty() {
        let outcome = renderer.render(&state.view(), out)?;
        if outcome.dialog_shown {
            let (next, _) = update(state, Msg::DialogDismissed);
            state = next;
        }
    }
    Ok(state)
}
