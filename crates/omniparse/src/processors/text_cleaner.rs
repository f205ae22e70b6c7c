//! Text cleaning from a configured pattern table.
//!
//! Cleaning runs four steps in order: mojibake repair, removal patterns,
//! transformation patterns, whitespace normalization. The pattern table is
//! loaded from YAML once per process and cached; a missing or unparseable
//! config degrades to empty pattern lists with a warning instead of failing
//! the parse. The whole operation is idempotent on its own output.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

/// Bundled default pattern table; used unless `OMNIPARSE_CLEANING_PATTERNS`
/// points at an external file.
const DEFAULT_PATTERNS_YAML: &str = include_str!("../../config/cleaning_patterns.yaml");

#[derive(Debug, Deserialize)]
struct PatternFile {
    #[serde(default)]
    removal_patterns: Vec<PatternEntry>,
    #[serde(default)]
    transformation_patterns: Vec<PatternEntry>,
}

#[derive(Debug, Deserialize)]
struct PatternEntry {
    pattern: String,
    #[serde(default)]
    flags: Option<String>,
    #[serde(default)]
    replacement: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    description: Option<String>,
}

/// A compiled pattern table.
#[derive(Debug, Default)]
pub struct CompiledPatterns {
    removals: Vec<Regex>,
    transformations: Vec<(Regex, String)>,
}

impl CompiledPatterns {
    /// Compile a pattern table from YAML text. Entries that fail to compile
    /// are skipped with a warning; they never fail the load.
    pub fn from_yaml(yaml: &str) -> Self {
        let parsed: PatternFile = match serde_yaml_ng::from_str(yaml) {
            Ok(file) => file,
            Err(e) => {
                warn!("Failed to parse cleaning patterns: {}. Using empty patterns.", e);
                return Self::default();
            }
        };

        let mut compiled = Self::default();
        for entry in parsed.removal_patterns {
            match compile_entry(&entry) {
                Some(regex) => compiled.removals.push(regex),
                None => warn!(pattern = %entry.pattern, "Skipping invalid removal pattern"),
            }
        }
        for entry in parsed.transformation_patterns {
            let Some(replacement) = entry.replacement.clone() else {
                warn!(pattern = %entry.pattern, "Transformation pattern without replacement, skipping");
                continue;
            };
            match compile_entry(&entry) {
                Some(regex) => compiled.transformations.push((regex, replacement)),
                None => warn!(pattern = %entry.pattern, "Skipping invalid transformation pattern"),
            }
        }

        info!(
            removals = compiled.removals.len(),
            transformations = compiled.transformations.len(),
            "Loaded cleaning patterns"
        );
        compiled
    }

    /// Load from a file path, degrading to empty patterns on any failure.
    pub fn from_path(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(yaml) => Self::from_yaml(&yaml),
            Err(e) => {
                warn!(
                    "Failed to load cleaning patterns from {}: {}. Using empty patterns.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }
}

fn compile_entry(entry: &PatternEntry) -> Option<Regex> {
    let mut inline_flags = String::new();
    if let Some(flags) = &entry.flags {
        for flag in flags.split('|').map(str::trim) {
            match flag {
                "MULTILINE" => inline_flags.push('m'),
                "IGNORECASE" => inline_flags.push('i'),
                "DOTALL" => inline_flags.push('s'),
                "" => {}
                other => warn!(flag = other, "Unknown pattern flag, ignoring"),
            }
        }
    }
    let source = if inline_flags.is_empty() {
        entry.pattern.clone()
    } else {
        format!("(?{}){}", inline_flags, entry.pattern)
    };
    Regex::new(&source).ok()
}

/// Process-wide compiled pattern cache.
static PATTERNS: Lazy<CompiledPatterns> = Lazy::new(|| {
    match std::env::var("OMNIPARSE_CLEANING_PATTERNS") {
        Ok(path) => CompiledPatterns::from_path(Path::new(&path)),
        Err(_) => CompiledPatterns::from_yaml(DEFAULT_PATTERNS_YAML),
    }
});

/// Ordered mojibake repairs for the common UTF-8-read-as-Latin-1 artifacts.
/// Longer sequences first so prefixes do not shadow them.
const MOJIBAKE_TABLE: &[(&str, &str)] = &[
    ("\u{00e2}\u{20ac}\u{2122}", "\u{2019}"), // â€™ -> right single quote
    ("\u{00e2}\u{20ac}\u{0153}", "\u{201c}"), // â€œ -> left double quote
    ("\u{00e2}\u{20ac}\u{009d}", "\u{201d}"), // â€ + 0x9d -> right double quote
    ("\u{00e2}\u{20ac}\u{201c}", "\u{2013}"), // â€“ -> en dash
    ("\u{00e2}\u{20ac}\u{201d}", "\u{2014}"), // â€” -> em dash
    ("\u{00e2}\u{20ac}\u{00a6}", "\u{2026}"), // â€¦ -> ellipsis
    ("\u{00c3}\u{00a9}", "\u{00e9}"),         // Ã© -> é
    ("\u{00c3}\u{00a8}", "\u{00e8}"),         // Ã¨ -> è
    ("\u{00c3}\u{00a4}", "\u{00e4}"),         // Ã¤ -> ä
    ("\u{00c3}\u{00b6}", "\u{00f6}"),         // Ã¶ -> ö
    ("\u{00c3}\u{00bc}", "\u{00fc}"),         // Ã¼ -> ü
    ("\u{00c3}\u{00b1}", "\u{00f1}"),         // Ã± -> ñ
    ("\u{00c3}\u{00a7}", "\u{00e7}"),         // Ã§ -> ç
    ("\u{00c2}\u{00a0}", " "),                // Â + nbsp -> space
];

static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r" +").unwrap());
static MULTI_NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Clean text using the process-wide pattern table.
pub fn clean_text(text: &str) -> String {
    clean_text_with(text, &PATTERNS)
}

/// Clean text with an explicit pattern table (used by tests and callers that
/// manage their own configuration).
pub fn clean_text_with(text: &str, patterns: &CompiledPatterns) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut text = fix_mojibake(text);

    for regex in &patterns.removals {
        text = regex.replace_all(&text, "").into_owned();
    }
    for (regex, replacement) in &patterns.transformations {
        text = regex.replace_all(&text, replacement.as_str()).into_owned();
    }

    normalize_whitespace(&text)
}

/// Repair the common mojibake sequences.
pub fn fix_mojibake(text: &str) -> String {
    let mut fixed = text.to_string();
    for (broken, repaired) in MOJIBAKE_TABLE {
        if fixed.contains(broken) {
            fixed = fixed.replace(broken, repaired);
        }
    }
    fixed
}

fn normalize_whitespace(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').map(str::trim).collect();
    let joined = lines.join("\n");
    let collapsed = MULTI_SPACE.replace_all(&joined, " ");
    let collapsed = MULTI_NEWLINE.replace_all(&collapsed, "\n\n");
    collapsed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_patterns() -> CompiledPatterns {
        CompiledPatterns::from_yaml(DEFAULT_PATTERNS_YAML)
    }

    #[test]
    fn test_footnote_markers_removed() {
        let patterns = default_patterns();
        let cleaned = clean_text_with("Hello [1] world [23]", &patterns);
        assert_eq!(cleaned, "Hello world");
    }

    #[test]
    fn test_page_number_lines_removed() {
        let patterns = default_patterns();
        let cleaned = clean_text_with("text before\n42\ntext after", &patterns);
        assert!(!cleaned.contains("42"));
        assert!(cleaned.contains("text before"));
        assert!(cleaned.contains("text after"));
    }

    #[test]
    fn test_punctuation_normalized() {
        let patterns = default_patterns();
        assert_eq!(clean_text_with("Hello\u{2014}world", &patterns), "Hello -- world");
        assert_eq!(clean_text_with("wait\u{2026}", &patterns), "wait...");
        assert_eq!(
            clean_text_with("\u{201c}quoted\u{201d} \u{2018}single\u{2019}", &patterns),
            "\"quoted\" 'single'"
        );
    }

    #[test]
    fn test_whitespace_normalized() {
        let patterns = default_patterns();
        assert_eq!(
            clean_text_with("Hello   world\n\n\n\nNext paragraph", &patterns),
            "Hello world\n\nNext paragraph"
        );
    }

    #[test]
    fn test_mojibake_repaired() {
        let broken = "caf\u{00c3}\u{00a9} \u{00e2}\u{20ac}\u{2122}";
        let fixed = fix_mojibake(broken);
        assert!(fixed.contains("caf\u{00e9}"));
        assert!(fixed.contains('\u{2019}'));
    }

    #[test]
    fn test_cleaning_is_idempotent() {
        let patterns = default_patterns();
        let input = "Hello [1]\u{2014}world\u{2026}  with   \u{201c}stuff\u{201d}\n\n\n\nmore";
        let once = clean_text_with(input, &patterns);
        let twice = clean_text_with(&once, &patterns);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_unparseable_config_degrades_to_empty() {
        let patterns = CompiledPatterns::from_yaml(": not [ valid yaml");
        let cleaned = clean_text_with("Hello [1] \u{2014} world", &patterns);
        // No pattern work, but whitespace normalization still applies.
        assert_eq!(cleaned, "Hello [1] \u{2014} world");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn test_invalid_single_pattern_skipped() {
        let yaml = r#"
removal_patterns:
  - pattern: '['
    description: "broken"
  - pattern: '\[\d+\]'
"#;
        let patterns = CompiledPatterns::from_yaml(yaml);
        assert_eq!(clean_text_with("a [1] b", &patterns), "a b");
    }
}
