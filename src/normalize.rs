use std::sync::LazyLock;

use regex::Regex;

/// C0/C1 controls, zero-width characters, the BOM and bidi overrides.
static INVISIBLE_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x00-\x1f\x7f-\x9f\u{200b}-\u{200f}\u{feff}\u{202a}-\u{202e}]")
        .expect("Unable to compile cleaning regex")
});

/// Removes every control/zero-width/BOM/bidi-override character from `text`.
pub fn clean_text(text: &str) -> String {
    INVISIBLE_CHARS.replace_all(text, "").into_owned()
}

/// Cleans `text` line by line, keeping the line structure intact.
pub fn clean_block(text: &str) -> String {
    text.lines().map(clean_text).collect::<Vec<_>>().join("\n")
}

fn clean_line(line: &str) -> Option<String> {
    let cleaned = clean_text(line);
    let trimmed = cleaned.trim();

    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Splits raw text into one token per line.
///
/// Each line is cleaned, then trimmed, and dropped if nothing remains.
/// Duplicates are kept so they can be counted later. Whitespace-only input
/// yields an empty vector.
pub fn normalize_lines(text: &str) -> Vec<String> {
    text.lines().filter_map(clean_line).collect()
}

/// Same cleaning as [`normalize_lines`] applied to already-split tokens.
pub fn normalize_tokens<'a, I>(tokens: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    tokens.into_iter().filter_map(clean_line).collect()
}
