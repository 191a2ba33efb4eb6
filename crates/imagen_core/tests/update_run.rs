use std::path::PathBuf;
use std::sync::Once;

use imagen_core::{
    update, AppState, BackendStatus, DialogKind, Effect, JobOutcome, Msg, RejectReason, RunPhase,
    Settings,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(imagen_logging::initialize_for_tests);
}

fn ready_state(prompts: &str) -> AppState {
    let (state, _) = update(
        AppState::new(),
        Msg::BackendReady {
            model: "imagen-test".to_string(),
        },
    );
    let (state, _) = update(state, Msg::PromptsEdited(prompts.to_string()));
    state
}

fn job_started(index: usize, total: usize, prompt: &str) -> Msg {
    Msg::JobStarted {
        index,
        total,
        prompt: prompt.to_string(),
    }
}

#[test]
fn start_emits_run_with_trimmed_prompts() {
    init_logging();
    let state = ready_state(" a \n\nb\n");
    let (state, effects) = update(state, Msg::StartClicked);

    assert_eq!(
        effects,
        vec![Effect::StartRun {
            prompts: vec!["a".to_string(), "b".to_string()],
            settings: Settings::default(),
            output_dir: PathBuf::from("results"),
        }]
    );
    let view = state.view();
    assert_eq!(view.phase, RunPhase::Dispatching);
    assert!(!view.start_enabled);
    assert_eq!(view.status, "Generating images...");
}

#[test]
fn start_without_prompts_warns() {
    init_logging();
    let state = ready_state("   \n");
    let (state, effects) = update(state, Msg::StartClicked);

    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.phase, RunPhase::Idle);
    assert_eq!(view.dialog.unwrap().kind, DialogKind::Warning);
}

#[test]
fn start_before_backend_ready_is_an_initialization_error() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::PromptsEdited("a".to_string()));
    let (state, _) = update(
        state,
        Msg::BackendFailed {
            message: "no token".to_string(),
        },
    );
    assert_eq!(
        state.view().backend,
        BackendStatus::Failed {
            message: "no token".to_string()
        }
    );

    let (state, effects) = update(state, Msg::StartClicked);
    assert!(effects.is_empty());
    let dialog = state.view().dialog.unwrap();
    assert_eq!(dialog.kind, DialogKind::Error);
    assert_eq!(dialog.message, "Image backend is not initialized!");
}

#[test]
fn second_start_is_rejected_while_running() {
    init_logging();
    let state = ready_state("a\nb");
    let (state, _) = update(state, Msg::StartClicked);
    let (state, _) = update(state, Msg::RunStarted { total: 2, workers: 1 });

    let (state, effects) = update(state, Msg::StartClicked);
    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.phase, RunPhase::Running);
    assert_eq!(view.dialog.unwrap().message, "Generation is already running!");
}

#[test]
fn progress_follows_dispatch_index_and_totals_accumulate() {
    init_logging();
    let state = ready_state("a\nb\nc\nd");
    let (state, _) = update(state, Msg::StartClicked);
    let (state, _) = update(state, Msg::RunStarted { total: 4, workers: 2 });

    // Job 2 starts first: the bar jumps to its index, not to a completion count.
    let (state, _) = update(state, job_started(2, 4, "c"));
    assert_eq!(state.view().progress_percent, 50.0);
    let (state, _) = update(state, job_started(0, 4, "a"));
    assert_eq!(state.view().progress_percent, 0.0);

    let (state, _) = update(
        state,
        Msg::JobFinished {
            index: 2,
            total: 4,
            outcome: JobOutcome::Saved(3),
        },
    );
    let (state, _) = update(
        state,
        Msg::JobFinished {
            index: 0,
            total: 4,
            outcome: JobOutcome::Failed("quota exceeded".to_string()),
        },
    );

    let view = state.view();
    assert_eq!(view.run.finished_jobs, 2);
    assert_eq!(view.run.failed_jobs, 1);
    assert_eq!(view.run.images_saved, 3);
    assert_eq!(view.log.last().unwrap().message, "[1/4] error: quota exceeded...");
    assert!(view.log.iter().any(|line| line.message == "[3/4] done: 3 files"));
}

#[test]
fn phase_moves_to_draining_once_every_job_started() {
    init_logging();
    let state = ready_state("a\nb");
    let (state, _) = update(state, Msg::StartClicked);
    let (state, _) = update(state, Msg::RunStarted { total: 2, workers: 2 });
    let (state, _) = update(state, job_started(0, 2, "a"));
    assert_eq!(state.phase(), RunPhase::Running);
    let (state, _) = update(state, job_started(1, 2, "b"));
    assert_eq!(state.phase(), RunPhase::Draining);
}

#[test]
fn long_prompts_are_truncated_in_log() {
    init_logging();
    let prompt = "x".repeat(100);
    let state = ready_state(&prompt);
    let (state, _) = update(state, Msg::StartClicked);
    let (state, _) = update(state, job_started(0, 1, &prompt));

    let expected = format!("[1/1] {}...", "x".repeat(40));
    assert_eq!(state.view().log.last().unwrap().message, expected);
}

#[test]
fn completion_reports_totals_and_returns_to_idle() {
    init_logging();
    let state = ready_state("a\nb");
    let (state, _) = update(state, Msg::StartClicked);
    let (state, _) = update(state, Msg::RunStarted { total: 2, workers: 1 });
    let (state, _) = update(
        state,
        Msg::RunCompleted {
            images_saved: 4,
            elapsed_ms: 2_340,
            output_dir: PathBuf::from("/tmp/results"),
        },
    );

    let view = state.view();
    assert_eq!(view.phase, RunPhase::Idle);
    assert!(view.start_enabled);
    assert_eq!(view.progress_percent, 100.0);
    assert_eq!(view.status, "Done! 4 images");
    assert_eq!(view.run.images_saved, 4);
    assert!(view.log.iter().any(|line| line.message == "Time: 2.3 s"));
    assert!(view.log.iter().any(|line| line.message == "Folder: /tmp/results"));
    assert_eq!(view.dialog.unwrap().kind, DialogKind::Info);
}

#[test]
fn fatal_run_error_resets_ui() {
    init_logging();
    let state = ready_state("a");
    let (state, _) = update(state, Msg::StartClicked);
    let (state, _) = update(
        state,
        Msg::RunFailed {
            message: "worker panicked".to_string(),
        },
    );

    let view = state.view();
    assert_eq!(view.phase, RunPhase::Idle);
    assert_eq!(view.status, "Generation error");
    assert_eq!(view.log.last().unwrap().message, "Critical error: worker panicked");
    assert_eq!(view.dialog.unwrap().kind, DialogKind::Error);
}

#[test]
fn engine_rejection_rolls_back_dispatch() {
    init_logging();
    let state = ready_state("a");
    let (state, _) = update(state, Msg::StartClicked);
    let (state, _) = update(state, Msg::RunRejected(RejectReason::AlreadyRunning));

    assert_eq!(state.phase(), RunPhase::Idle);
    assert_eq!(state.view().dialog.unwrap().kind, DialogKind::Warning);
}

#[test]
fn engine_rejection_leaves_active_run_alone() {
    init_logging();
    let state = ready_state("a");
    let (state, _) = update(state, Msg::StartClicked);
    let (state, _) = update(state, Msg::RunStarted { total: 1, workers: 1 });
    let (state, _) = update(state, Msg::RunRejected(RejectReason::AlreadyRunning));

    assert_eq!(state.phase(), RunPhase::Running);
}
