//! Frontmatter extraction and metadata mapping for Markdown files.
//!
//! Supports, in detection order: YAML (`---` fences), TOML (`+++` fences),
//! and a leading JSON object found by a balanced-brace, string-aware scan.
//! Parsed values map into [`Metadata`] with case-insensitive field names;
//! unknown fields land in `custom_fields`.

use crate::processors::metadata_extractor::parse_publication_date;
use crate::types::Metadata;
use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

static YAML_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\A---\n(.*?)\n---\n").unwrap());
static TOML_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\A\+\+\+\n(.*?)\n\+\+\+\n").unwrap());

/// Fields that are common misspellings of real ones. They are kept verbatim
/// in custom fields, with a warning suggesting the correct spelling.
const KNOWN_TYPOS: &[(&str, &str)] = &[("titel", "title"), ("autor", "author")];

/// Extract frontmatter, returning the parsed map (as JSON) and the remaining
/// content. Returns `(None, original)` when nothing parseable leads the file.
pub fn extract_frontmatter(content: &str, warnings: &mut Vec<String>) -> (Option<serde_json::Map<String, serde_json::Value>>, String) {
    if let Some(caps) = YAML_FENCE.captures(content) {
        let body = caps.get(1).expect("group 1").as_str();
        let rest = content[caps.get(0).expect("group 0").end()..].to_string();
        match serde_yaml_ng::from_str::<serde_json::Value>(body) {
            Ok(serde_json::Value::Object(map)) => return (Some(map), rest),
            Ok(_) => {
                warnings.push("YAML frontmatter is not a mapping; discarded".to_string());
                return (None, rest);
            }
            Err(e) => {
                warnings.push(format!("Unparseable YAML frontmatter discarded: {}", e));
                return (None, content.to_string());
            }
        }
    }

    if let Some(caps) = TOML_FENCE.captures(content) {
        let body = caps.get(1).expect("group 1").as_str();
        let rest = content[caps.get(0).expect("group 0").end()..].to_string();
        match toml::from_str::<toml::Value>(body) {
            Ok(value) => match toml_to_json(value) {
                serde_json::Value::Object(map) => return (Some(map), rest),
                _ => {
                    warnings.push("TOML frontmatter is not a table; discarded".to_string());
                    return (None, rest);
                }
            },
            Err(e) => {
                warnings.push(format!("Unparseable TOML frontmatter discarded: {}", e));
                return (None, content.to_string());
            }
        }
    }

    if content.starts_with('{')
        && let Some(end) = find_json_object_end(content)
    {
        let body = &content[..end];
        let rest = content[end..].trim_start_matches('\n').to_string();
        match serde_json::from_str::<serde_json::Value>(body) {
            Ok(serde_json::Value::Object(map)) => return (Some(map), rest),
            Ok(_) => {
                warnings.push("JSON frontmatter is not an object; discarded".to_string());
                return (None, rest);
            }
            Err(e) => {
                warnings.push(format!("Unparseable JSON frontmatter discarded: {}", e));
                return (None, content.to_string());
            }
        }
    }

    (None, content.to_string())
}

/// Balanced-brace scan that is aware of JSON strings and escapes.
fn find_json_object_end(content: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (idx, c) in content.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(idx + 1);
                }
            }
            _ => {}
        }
    }
    None
}

fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => serde_json::Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

/// Map a frontmatter object into document metadata.
pub fn metadata_from_frontmatter(
    frontmatter: serde_json::Map<String, serde_json::Value>,
    warnings: &mut Vec<String>,
) -> Metadata {
    let mut metadata = Metadata::new("markdown");

    for (key, value) in frontmatter {
        let lower = key.to_lowercase();
        match lower.as_str() {
            "title" => metadata.title = value_as_string(&value),
            "author" => {
                if let Some(author) = value_as_string(&value) {
                    metadata = metadata.with_author(author);
                }
            }
            "authors" => {
                let authors = value_as_string_list(&value);
                if !authors.is_empty() {
                    metadata.author = Some(authors[0].clone());
                    metadata.authors = authors;
                }
            }
            "date" | "publication_date" | "published" => {
                match value_as_string(&value).as_deref().and_then(parse_date_lenient) {
                    Some(date) => metadata.publication_date = Some(date),
                    None => warnings.push(format!(
                        "Could not parse frontmatter date: {:?}",
                        value
                    )),
                }
            }
            "tags" | "keywords" => {
                let tags = value_as_string_list(&value);
                if !tags.is_empty() {
                    metadata.tags = tags;
                }
            }
            "description" | "summary" => metadata.description = value_as_string(&value),
            "language" | "lang" => metadata.language = value_as_string(&value),
            "publisher" => metadata.publisher = value_as_string(&value),
            "isbn" => metadata.isbn = value_as_string(&value),
            _ => {
                if let Some((typo, correct)) = KNOWN_TYPOS.iter().find(|(typo, _)| *typo == lower)
                {
                    let message = format!(
                        "Frontmatter field '{}' looks like a typo of '{}'",
                        typo, correct
                    );
                    warn!("{}", message);
                    warnings.push(message);
                }
                metadata.custom_fields.insert(key, value);
            }
        }
    }

    metadata
}

fn value_as_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A list value, or a comma/semicolon-separated string.
fn value_as_string_list(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(value_as_string)
            .collect(),
        serde_json::Value::String(s) => s
            .split([',', ';'])
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Date parsing across the formats that show up in real frontmatter.
fn parse_date_lenient(raw: &str) -> Option<DateTime<Utc>> {
    if let Some(date) = parse_publication_date(raw) {
        return Some(date);
    }
    for format in ["%d.%m.%Y", "%m/%d/%Y", "%B %d, %Y", "%d %B %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw.trim(), format) {
            return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_frontmatter() {
        let content = "---\ntitle: T\nauthor: A\ntags: [x, y]\n---\n\n# Body\n";
        let mut warnings = Vec::new();
        let (fm, rest) = extract_frontmatter(content, &mut warnings);
        let metadata = metadata_from_frontmatter(fm.unwrap(), &mut warnings);

        assert_eq!(metadata.title.as_deref(), Some("T"));
        assert_eq!(metadata.author.as_deref(), Some("A"));
        assert_eq!(metadata.tags, vec!["x", "y"]);
        assert!(rest.contains("# Body"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_toml_frontmatter() {
        let content = "+++\ntitle = \"T\"\ntags = [\"a\", \"b\"]\n+++\nBody\n";
        let mut warnings = Vec::new();
        let (fm, rest) = extract_frontmatter(content, &mut warnings);
        let metadata = metadata_from_frontmatter(fm.unwrap(), &mut warnings);
        assert_eq!(metadata.title.as_deref(), Some("T"));
        assert_eq!(metadata.tags, vec!["a", "b"]);
        assert_eq!(rest.trim(), "Body");
    }

    #[test]
    fn test_json_frontmatter_balanced_braces() {
        let content = "{\"title\": \"Braces { } in \\\"strings\\\"\", \"lang\": \"en\"}\nBody here\n";
        let mut warnings = Vec::new();
        let (fm, rest) = extract_frontmatter(content, &mut warnings);
        let metadata = metadata_from_frontmatter(fm.unwrap(), &mut warnings);
        assert!(metadata.title.unwrap().contains("Braces"));
        assert_eq!(metadata.language.as_deref(), Some("en"));
        assert_eq!(rest.trim(), "Body here");
    }

    #[test]
    fn test_no_frontmatter_passthrough() {
        let mut warnings = Vec::new();
        let (fm, rest) = extract_frontmatter("# Just a doc\n", &mut warnings);
        assert!(fm.is_none());
        assert_eq!(rest, "# Just a doc\n");
    }

    #[test]
    fn test_broken_yaml_discarded_with_warning() {
        let content = "---\ntitle: [unclosed\n---\nBody\n";
        let mut warnings = Vec::new();
        let (fm, rest) = extract_frontmatter(content, &mut warnings);
        assert!(fm.is_none());
        assert_eq!(rest, content);
        assert!(!warnings.is_empty());
    }

    #[test]
    fn test_non_mapping_yaml_discarded() {
        let content = "---\n- just\n- a list\n---\nBody\n";
        let mut warnings = Vec::new();
        let (fm, _) = extract_frontmatter(content, &mut warnings);
        assert!(fm.is_none());
        assert!(warnings.iter().any(|w| w.contains("not a mapping")));
    }

    #[test]
    fn test_case_insensitive_fields() {
        let mut warnings = Vec::new();
        let mut map = serde_json::Map::new();
        map.insert("Title".to_string(), serde_json::json!("Caps"));
        map.insert("LANG".to_string(), serde_json::json!("de"));
        let metadata = metadata_from_frontmatter(map, &mut warnings);
        assert_eq!(metadata.title.as_deref(), Some("Caps"));
        assert_eq!(metadata.language.as_deref(), Some("de"));
    }

    #[test]
    fn test_known_typos_warn_and_keep() {
        let mut warnings = Vec::new();
        let mut map = serde_json::Map::new();
        map.insert("titel".to_string(), serde_json::json!("Tippfehler"));
        let metadata = metadata_from_frontmatter(map, &mut warnings);
        assert!(metadata.title.is_none());
        assert_eq!(metadata.custom_fields["titel"], serde_json::json!("Tippfehler"));
        assert!(warnings.iter().any(|w| w.contains("typo")));
    }

    #[test]
    fn test_tag_string_splitting() {
        let mut warnings = Vec::new();
        let mut map = serde_json::Map::new();
        map.insert("keywords".to_string(), serde_json::json!("a, b; c"));
        let metadata = metadata_from_frontmatter(map, &mut warnings);
        assert_eq!(metadata.tags, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_date_formats() {
        let mut warnings = Vec::new();
        for raw in ["2023-01-15", "2023-01-15T10:00:00Z", "15.01.2023", "01/15/2023"] {
            let mut map = serde_json::Map::new();
            map.insert("date".to_string(), serde_json::json!(raw));
            let metadata = metadata_from_frontmatter(map, &mut warnings);
            assert!(metadata.publication_date.is_some(), "failed for {}", raw);
        }
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_unparseable_date_warns() {
        let mut warnings = Vec::new();
        let mut map = serde_json::Map::new();
        map.insert("date".to_string(), serde_json::json!("sometime soon"));
        let metadata = metadata_from_frontmatter(map, &mut warnings);
        assert!(metadata.publication_date.is_none());
        assert!(warnings.iter().any(|w| w.contains("date")));
    }

    #[test]
    fn test_unknown_fields_into_custom() {
        let mut warnings = Vec::new();
        let mut map = serde_json::Map::new();
        map.insert("series".to_string(), serde_json::json!("Hainish"));
        let metadata = metadata_from_frontmatter(map, &mut warnings);
        assert_eq!(metadata.custom_fields["series"], serde_json::json!("Hainish"));
    }
}
