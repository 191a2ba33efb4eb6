/// Prompts prefilled into the editor on first start.
pub const SAMPLE_PROMPTS: &[&str] = &[
    "a beautiful sunset over the ocean, photorealistic",
    "futuristic city, neon lights, cyberpunk style",
    "cozy living room with a fireplace, warm light, winter outside the window",
    "a spaceship in a distant galaxy, stars, dramatic lighting",
    "portrait of a woman in vintage style, retro fashion",
    "mountain landscape at dawn, fog, nature photography",
];

/// Splits editor text into prompts: one per line, trimmed, blank lines dropped.
pub fn parse_prompts(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Text written to a prompt file: editor content without trailing blank lines,
/// terminated by a single newline. Empty content stays empty.
pub fn prompts_file_text(raw: &str) -> String {
    let trimmed = raw.trim_end();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}\n")
    }
}

/// Returns at most `max_chars` characters of `text`, respecting char boundaries.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_chars("закат над океаном", 5), "закат");
        assert_eq!(truncate_chars("short", 40), "short");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn file_text_drops_trailing_blank_lines() {
        assert_eq!(prompts_file_text("a\nb\n\n  \n"), "a\nb\n");
        assert_eq!(prompts_file_text("\n\n"), "");
    }
}
