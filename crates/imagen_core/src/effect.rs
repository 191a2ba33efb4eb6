use std::path::PathBuf;

use crate::Settings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Hand the prompts to the engine as one run.
    StartRun {
        prompts: Vec<String>,
        settings: Settings,
        output_dir: PathBuf,
    },
    LoadPrompts { path: PathBuf },
    SavePrompts { path: PathBuf, text: String },
    OpenResultsFolder { path: PathBuf },
    CreateResultsFolder,
}
