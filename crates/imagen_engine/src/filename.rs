use chrono::{DateTime, TimeZone};

/// Maximum number of prompt characters kept in an image filename.
pub const PROMPT_SLUG_MAX_CHARS: usize = 30;

/// Filename-safe slug of a prompt: keeps alphanumerics, spaces, underscores and
/// hyphens, caps the length, trims, then turns spaces into underscores.
/// A prompt with no allowed characters yields an empty slug.
pub fn prompt_slug(prompt: &str) -> String {
    let kept: String = prompt
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .take(PROMPT_SLUG_MAX_CHARS)
        .collect();
    kept.trim().replace(' ', "_")
}

/// `{timestamp_ms}_{slug}_v{variation}.png`, with `variation` starting at 1.
pub fn image_filename(timestamp_ms: i64, slug: &str, variation: usize) -> String {
    format!("{timestamp_ms}_{slug}_v{variation}.png")
}

/// `results_{YYYYMMDD_HHMMSS}` for the given instant.
pub fn results_folder_name<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("results_{}", at.format("%Y%m%d_%H%M%S"))
}
