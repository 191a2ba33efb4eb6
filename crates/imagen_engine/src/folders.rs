use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, TimeZone};
use imagen_logging::{imagen_info, imagen_warn};

use crate::filename::results_folder_name;
use crate::persist::{ensure_results_dir, PersistError};

/// Creates `{base}/results_{YYYYMMDD_HHMMSS}` and returns its absolute path.
/// An existing folder with the same name is reused.
pub fn create_results_folder<Tz: TimeZone>(
    base: &Path,
    at: &DateTime<Tz>,
) -> Result<PathBuf, PersistError>
where
    Tz::Offset: std::fmt::Display,
{
    let folder = base.join(results_folder_name(at));
    ensure_results_dir(&folder)?;
    let absolute = std::path::absolute(&folder)?;
    imagen_info!("Created results folder {:?}", absolute);
    Ok(absolute)
}

/// Creates `dir` if missing and shows it in the platform file manager.
pub fn open_in_file_manager(dir: &Path) -> Result<(), PersistError> {
    ensure_results_dir(dir)?;
    let status = Command::new(file_manager_command()).arg(dir).status()?;
    // explorer.exe reports a non-zero exit code even when the window opened.
    if !status.success() {
        imagen_warn!("File manager exited with {} for {:?}", status, dir);
    }
    Ok(())
}

fn file_manager_command() -> &'static str {
    if cfg!(target_os = "windows") {
        "explorer"
    } else if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    }
}
