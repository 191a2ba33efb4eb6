use std::fs;
use std::path::Path;

use crate::persist::{PersistError, ResultsWriter};

/// Reads a UTF-8 prompt file verbatim. Parsing into prompts happens in the editor.
pub fn load_prompt_file(path: &Path) -> Result<String, PersistError> {
    Ok(fs::read_to_string(path)?)
}

/// Writes prompt text atomically, replacing any existing file.
pub fn save_prompt_file(path: &Path, text: &str) -> Result<(), PersistError> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| PersistError::NotAFile(path.to_path_buf()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    ResultsWriter::new(dir).write(filename, text.as_bytes())?;
    Ok(())
}
