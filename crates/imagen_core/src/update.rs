use crate::{
    prompts_file_text, truncate_chars, AppState, BackendStatus, Confirmation, DialogKind, Effect,
    JobOutcome, Msg, RejectReason, RunPhase, RunProgress,
};

const PROMPT_PREVIEW_CHARS: usize = 40;
const ERROR_PREVIEW_CHARS: usize = 50;

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::PromptsEdited(text) => {
            state.set_prompt_text(text);
            Vec::new()
        }
        Msg::PromptAdded(prompt) => {
            let prompt = prompt.trim();
            if !prompt.is_empty() {
                state.append_prompt(prompt);
            }
            Vec::new()
        }
        Msg::VariationsSelected(count) => {
            state.settings_mut().variations = count;
            Vec::new()
        }
        Msg::AspectRatioSelected(ratio) => {
            state.settings_mut().aspect_ratio = ratio;
            Vec::new()
        }
        Msg::WorkersSelected(count) => {
            state.settings_mut().workers = count;
            Vec::new()
        }
        Msg::StartClicked => start_run(&mut state),
        Msg::LoadPromptsClicked(path) => vec![Effect::LoadPrompts { path }],
        Msg::SavePromptsClicked(path) => {
            let text = prompts_file_text(state.prompt_text());
            vec![Effect::SavePrompts { path, text }]
        }
        Msg::ClearPromptsClicked => {
            state.set_confirmation(Some(Confirmation::ClearPrompts));
            Vec::new()
        }
        Msg::ConfirmationAnswered(yes) => {
            if let Some(Confirmation::ClearPrompts) = state.take_confirmation() {
                if yes {
                    state.set_prompt_text(String::new());
                    state.log("Prompts cleared");
                }
            }
            Vec::new()
        }
        Msg::OpenResultsClicked => vec![Effect::OpenResultsFolder {
            path: state.results_dir().to_path_buf(),
        }],
        Msg::NewResultsFolderClicked => vec![Effect::CreateResultsFolder],
        Msg::DialogDismissed => {
            state.dismiss_dialog();
            Vec::new()
        }
        Msg::BackendConnecting => {
            state.set_backend(BackendStatus::Connecting);
            state.log("Initializing image backend...");
            Vec::new()
        }
        Msg::BackendReady { model } => {
            state.log(format!("Image backend ready: {model}"));
            state.set_backend(BackendStatus::Ready { model });
            state.set_status("Ready to generate");
            Vec::new()
        }
        Msg::BackendFailed { message } => {
            state.log(format!("Initialization error: {message}"));
            state.set_backend(BackendStatus::Failed { message });
            state.set_status("Connection error");
            Vec::new()
        }
        Msg::PromptsLoaded { path, text } => {
            state.set_prompt_text(text);
            state.log(format!("Prompts loaded from {}", path.display()));
            Vec::new()
        }
        Msg::PromptsSaved { path } => {
            state.log(format!("Prompts saved to {}", path.display()));
            Vec::new()
        }
        Msg::FileOperationFailed { title, message } => {
            state.push_dialog(DialogKind::Error, &title, message);
            Vec::new()
        }
        Msg::ResultsFolderCreated { path } => {
            state.log(format!("Created folder: {}", path.display()));
            state.push_dialog(
                DialogKind::Info,
                "Folder created",
                format!("Created a new folder:\n{}", path.display()),
            );
            state.set_results_dir(path);
            Vec::new()
        }
        Msg::ResultsFolderOpenFailed { message } => {
            state.push_dialog(
                DialogKind::Error,
                "Error",
                format!("Could not open folder: {message}"),
            );
            Vec::new()
        }
        Msg::RunStarted { total, workers } => {
            state.set_phase(RunPhase::Running);
            state.run_mut().total_jobs = total;
            state.log(format!(
                "Starting generation: {total} prompts, {workers} workers"
            ));
            Vec::new()
        }
        Msg::JobStarted {
            index,
            total,
            prompt,
        } => {
            // Progress follows the dispatch index of the job that just started.
            if total > 0 {
                state.set_progress(index as f32 / total as f32 * 100.0);
            }
            let run = state.run_mut();
            run.started_jobs += 1;
            if run.started_jobs >= total && state.phase() == RunPhase::Running {
                state.set_phase(RunPhase::Draining);
            }
            state.log(format!(
                "[{}/{}] {}...",
                index + 1,
                total,
                truncate_chars(&prompt, PROMPT_PREVIEW_CHARS)
            ));
            Vec::new()
        }
        Msg::JobFinished {
            index,
            total,
            outcome,
        } => {
            let run = state.run_mut();
            run.finished_jobs += 1;
            match outcome {
                JobOutcome::Saved(count) => {
                    run.images_saved += count as u64;
                    state.log(format!("[{}/{}] done: {} files", index + 1, total, count));
                }
                JobOutcome::Failed(message) => {
                    run.failed_jobs += 1;
                    state.log(format!(
                        "[{}/{}] error: {}...",
                        index + 1,
                        total,
                        truncate_chars(&message, ERROR_PREVIEW_CHARS)
                    ));
                }
            }
            Vec::new()
        }
        Msg::RunCompleted {
            images_saved,
            elapsed_ms,
            output_dir,
        } => {
            let seconds = elapsed_ms as f64 / 1000.0;
            state.run_mut().images_saved = images_saved;
            state.log("=".repeat(50));
            state.log("Generation finished");
            state.log(format!("Time: {seconds:.1} s"));
            state.log(format!("Images created: {images_saved}"));
            state.log(format!("Folder: {}", output_dir.display()));
            state.set_progress(100.0);
            state.set_status(format!("Done! {images_saved} images"));
            state.push_dialog(
                DialogKind::Info,
                "Done!",
                format!(
                    "Generation finished!\nImages created: {images_saved}\nTime: {seconds:.1} seconds"
                ),
            );
            state.set_phase(RunPhase::Idle);
            Vec::new()
        }
        Msg::RunFailed { message } => {
            state.log(format!("Critical error: {message}"));
            state.set_status("Generation error");
            state.push_dialog(
                DialogKind::Error,
                "Error",
                format!("Critical error: {message}"),
            );
            state.set_phase(RunPhase::Idle);
            Vec::new()
        }
        Msg::RunRejected(reason) => {
            reject_start(&mut state, &reason);
            // Only roll back a dispatch this state initiated; an engine-side
            // rejection never affects a run that is already in flight.
            if state.phase() == RunPhase::Dispatching {
                state.set_phase(RunPhase::Idle);
            }
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn start_run(state: &mut AppState) -> Vec<Effect> {
    if state.phase().is_active() {
        reject_start(state, &RejectReason::AlreadyRunning);
        return Vec::new();
    }
    let prompts = state.prompts();
    if prompts.is_empty() {
        reject_start(state, &RejectReason::NoPrompts);
        return Vec::new();
    }
    if !matches!(state.backend(), BackendStatus::Ready { .. }) {
        reject_start(state, &RejectReason::BackendUnavailable);
        return Vec::new();
    }

    state.set_phase(RunPhase::Dispatching);
    *state.run_mut() = RunProgress {
        total_jobs: prompts.len(),
        ..RunProgress::default()
    };
    state.set_progress(0.0);
    state.set_status("Generating images...");
    vec![Effect::StartRun {
        prompts,
        settings: state.settings(),
        output_dir: state.results_dir().to_path_buf(),
    }]
}

fn reject_start(state: &mut AppState, reason: &RejectReason) {
    match reason {
        RejectReason::AlreadyRunning => {
            state.push_dialog(DialogKind::Warning, "Warning", "Generation is already running!");
        }
        RejectReason::NoPrompts => {
            state.push_dialog(DialogKind::Warning, "Warning", "Enter at least one prompt!");
        }
        RejectReason::BackendUnavailable => {
            state.log("Image backend is not initialized");
            state.push_dialog(DialogKind::Error, "Error", "Image backend is not initialized!");
        }
    }
    state.mark_dirty();
}
