//! Renders view-model changes to a line-oriented terminal.

use std::io::{self, Write};

use imagen_core::{AppViewModel, BackendStatus, Confirmation, Dialog, DialogKind, RunPhase};

const PROGRESS_WIDTH: usize = 30;

/// What the caller must do after a render pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RenderOutcome {
    /// The dialog at the front of the queue was shown and should be dismissed.
    pub dialog_shown: bool,
}

/// Remembers what has already been printed so each pass only prints changes.
#[derive(Debug, Default)]
pub struct TerminalRenderer {
    printed_log_lines: usize,
    status_line: Option<String>,
    confirmation: Option<Confirmation>,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render<W: Write>(&mut self, view: &AppViewModel, out: &mut W) -> io::Result<RenderOutcome> {
        // The core log only grows; a shorter log means a fresh state.
        if view.log.len() < self.printed_log_lines {
            self.printed_log_lines = 0;
        }
        for entry in &view.log[self.printed_log_lines..] {
            writeln!(out, "{entry}")?;
        }
        self.printed_log_lines = view.log.len();

        let status = status_line(view);
        if self.status_line.as_deref() != Some(status.as_str()) {
            writeln!(out, "{status}")?;
            self.status_line = Some(status);
        }

        if view.confirmation != self.confirmation {
            if let Some(Confirmation::ClearPrompts) = view.confirmation {
                writeln!(out, "Clear all prompts? [yes/no]")?;
            }
            self.confirmation = view.confirmation;
        }

        let mut outcome = RenderOutcome::default();
        if let Some(dialog) = &view.dialog {
            write_dialog(out, dialog)?;
            outcome.dialog_shown = true;
        }
        out.flush()?;
        Ok(outcome)
    }
}

/// `[#####.....]  40% | Generating images... | 3/5 jobs | Imagen: ready`
pub fn status_line(view: &AppViewModel) -> String {
    let mut line = format!(
        "{} {:3.0}% | {}",
        progress_bar(view.progress_percent),
        view.progress_percent,
        view.status
    );
    if view.phase != RunPhase::Idle {
        line.push_str(&format!(
            " | {}/{} jobs",
            view.run.finished_jobs, view.run.total_jobs
        ));
    }
    let backend = match &view.backend {
        BackendStatus::Connecting => "connecting",
        BackendStatus::Ready { .. } => "ready",
        BackendStatus::Failed { .. } => "unavailable",
    };
    line.push_str(&format!(" | Imagen: {backend}"));
    line
}

pub fn progress_bar(percent: f32) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * PROGRESS_WIDTH as f32).round() as usize;
    format!(
        "[{}{}]",
        "#".repeat(filled),
        ".".repeat(PROGRESS_WIDTH - filled)
    )
}

fn write_dialog<W: Write>(out: &mut W, dialog: &Dialog) -> io::Result<()> {
    let tag = match dialog.kind {
        DialogKind::Info => "INFO",
        DialogKind::Warning => "WARNING",
        DialogKind::Error => "ERROR",
    };
    writeln!(out, "*** {tag}: {} ***", dialog.title)?;
    for line in dialog.message.lines() {
        writeln!(out, "    {line}")?;
    }
    Ok(())
}

/// Prompt listing for the `prompts` command.
pub fn prompt_listing(prompts: &[String]) -> String {
    if prompts.is_empty() {
        return "No prompts.".to_string();
    }
    prompts
        .iter()
        .enumerate()
        .map(|(i, prompt)| format!("{:>3}. {prompt}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn settings_listing(view: &AppViewModel) -> String {
    format!(
        "Variations: {}\nAspect ratio: {}\nWorkers: {}\nResults folder: {}\nPrompts: {}",
        view.settings.variations,
        view.settings.aspect_ratio,
        view.settings.workers,
        view.results_dir.display(),
        view.prompt_count
    )
}
