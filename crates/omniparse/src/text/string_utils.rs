//! Word counting and reading-time helpers.

use once_cell::sync::Lazy;
use regex::Regex;

/// Whitespace-token word count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Estimated reading time in minutes, never below 1.
pub fn estimate_reading_time(words: usize, wpm: u32) -> u32 {
    let wpm = wpm.max(1);
    let minutes = (words as f64 / wpm as f64).round() as u32;
    minutes.max(1)
}

static CODE_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"```[\s\S]*?```").unwrap());
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`[^`]+`").unwrap());
static BARE_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());
static IMAGE_SYNTAX: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\([^)]+\)").unwrap());
static LINK_SYNTAX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").unwrap());
static HEADING_MARKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6}\s+").unwrap());
static EMPHASIS_DOUBLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\*\*|__)(.*?)(\*\*|__)").unwrap());
static EMPHASIS_SINGLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([*_])([^*_]*?)([*_])").unwrap());
static TABLE_SEPARATOR_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\|?[\s:|-]+\|[\s:|-]*$").unwrap());

/// Word count that ignores Markdown syntax.
///
/// Strips fenced code blocks, inline code, bare URLs, image/link syntax
/// (keeping alt/link text), heading marks, emphasis markers, table pipes and
/// separator rows, and backslash escapes before tokenizing.
pub fn markdown_word_count(text: &str) -> usize {
    let text = CODE_BLOCK.replace_all(text, "");
    let text = INLINE_CODE.replace_all(&text, "");
    let text = IMAGE_SYNTAX.replace_all(&text, "$1");
    let text = LINK_SYNTAX.replace_all(&text, "$1");
    let text = BARE_URL.replace_all(&text, "");
    let text = HEADING_MARKS.replace_all(&text, "");
    let text = TABLE_SEPARATOR_ROW.replace_all(&text, "");
    let text = EMPHASIS_DOUBLE.replace_all(&text, "$2");
    let text = EMPHASIS_SINGLE.replace_all(&text, "$2");
    let text = text.replace('\\', "");

    text.split_whitespace()
        .filter(|token| !token.chars().all(|c| c == '|' || c == '-' || c == ':'))
        .count()
}
