//! Markdown heading and list-marker normalization.
//!
//! Setext headings are rewritten as ATX (`=` underlines to `#`, `-`
//! underlines to `##`), `*` list markers become `-`, and 3+ newline runs
//! collapse to 2. The dash-underline conversion only fires when the underline
//! length is within 50% of the title length, so horizontal rules survive.
//! Normalizing twice yields the same text.

use once_cell::sync::Lazy;
use regex::Regex;

static SETEXT_H1: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^([^\n]+)\n=+[ \t]*$").unwrap());
static SETEXT_H2: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^([^\n]+)\n(-{3,})[ \t]*$").unwrap());
static STAR_LIST: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^(\s*)\*(\s+)").unwrap());
static MULTI_NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Normalize heading styles and list markers.
pub fn normalize_markdown(text: &str) -> String {
    let text = SETEXT_H1.replace_all(text, |caps: &regex::Captures| {
        let title = caps[1].trim();
        if title.is_empty() || title.starts_with('#') {
            return caps[0].to_string();
        }
        format!("# {}", title)
    });

    let text = SETEXT_H2.replace_all(&text, |caps: &regex::Captures| {
        let title = caps[1].trim();
        let underline = &caps[2];
        if title.is_empty() || title.starts_with('#') {
            return caps[0].to_string();
        }
        // Underline within 50% of the title length; a long dash run under a
        // short line is a horizontal rule, not a heading.
        let diff = (underline.len() as i64 - title.len() as i64).abs() as f64;
        if diff <= title.len() as f64 * 0.5 {
            format!("## {}", title)
        } else {
            caps[0].to_string()
        }
    });

    let text = STAR_LIST.replace_all(&text, "$1-$2");
    MULTI_NEWLINE.replace_all(&text, "\n\n").into_owned()
}
