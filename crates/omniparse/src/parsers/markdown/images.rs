//! Image reference extraction from Markdown.
//!
//! Handles inline images (`![alt](src "title")`) and reference-style images
//! (`![alt][ref]` with `[ref]: url` definition lines). Relative paths resolve
//! against the source file's directory; data URIs and HTTP(S) URLs are kept
//! verbatim. References are deduplicated by resolved path.

use crate::types::ImageReference;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::collections::HashSet;
use std::path::Path;

static INLINE_IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"!\[([^\]]*)\]\(\s*(<[^>]*>|[^)\s]+)(?:\s+"[^"]*")?\s*\)"#).unwrap());
static REFERENCE_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\[([^\]]+)\]").unwrap());
static REFERENCE_DEFINITION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^\s*\[([^\]]+)\]:\s*(\S+)(?:\s+"[^"]*")?\s*$"#).unwrap());

/// Extract image references from markdown content.
///
/// `source_dir` is the directory of the markdown file, used to resolve
/// relative paths to absolute ones.
pub fn extract_image_references(content: &str, source_dir: Option<&Path>) -> Vec<ImageReference> {
    let definitions: HashMap<String, String> = REFERENCE_DEFINITION
        .captures_iter(content)
        .map(|caps| (caps[1].to_lowercase(), caps[2].to_string()))
        .collect();

    let mut seen: HashSet<String> = HashSet::new();
    let mut references = Vec::new();

    let mut push = |alt: &str, src: &str, position: usize, references: &mut Vec<ImageReference>| {
        let src = src.trim_start_matches('<').trim_end_matches('>').trim();
        if src.is_empty() {
            return;
        }
        let resolved = resolve_source(src, source_dir);
        if !seen.insert(resolved.clone()) {
            return;
        }
        let mut image = ImageReference::new(format!("img_{:03}", references.len() + 1));
        image.position = position;
        image.format = detect_format(src);
        image.file_path = Some(resolved);
        image.alt_text = if alt.trim().is_empty() {
            None
        } else {
            Some(alt.trim().to_string())
        };
        references.push(image);
    };

    for caps in INLINE_IMAGE.captures_iter(content) {
        let position = caps.get(0).expect("group 0").start();
        push(&caps[1], &caps[2], position, &mut references);
    }

    for caps in REFERENCE_IMAGE.captures_iter(content) {
        let position = caps.get(0).expect("group 0").start();
        let key = caps[2].to_lowercase();
        if let Some(url) = definitions.get(&key) {
            push(&caps[1], url, position, &mut references);
        }
    }

    references
}

fn resolve_source(src: &str, source_dir: Option<&Path>) -> String {
    let lower = src.to_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("data:") {
        return src.to_string();
    }
    if Path::new(src).is_absolute() {
        return src.to_string();
    }
    match source_dir {
        Some(dir) => dir.join(src).to_string_lossy().into_owned(),
        None => src.to_string(),
    }
}

/// Format from file extension, data-URI media type, or a `format=`/`fmt=`
/// query parameter; `"unknown"` otherwise.
fn detect_format(src: &str) -> String {
    let lower = src.to_lowercase();

    if let Some(rest) = lower.strip_prefix("data:image/") {
        let media = rest.split([';', ',']).next().unwrap_or("");
        if !media.is_empty() {
            return media.to_string();
        }
    }

    if let Some(query) = lower.split_once('?').map(|(_, q)| q) {
        for param in query.split('&') {
            if let Some(value) = param
                .strip_prefix("format=")
                .or_else(|| param.strip_prefix("fmt="))
                && !value.is_empty()
            {
                return value.to_string();
            }
        }
    }

    let path_part = lower.split(['?', '#']).next().unwrap_or(&lower);
    if let Some(ext) = Path::new(path_part).extension().and_then(|e| e.to_str())
        && matches!(ext, "png" | "jpg" | "jpeg" | "gif" | "bmp" | "webp" | "tiff" | "svg")
    {
        return if ext == "jpg" { "jpeg".to_string() } else { ext.to_string() };
    }

    "unknown".to_string()
}
