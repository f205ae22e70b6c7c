//! Chapter detection for plain text via marker patterns.
//!
//! Looks for conventional chapter markers (`Chapter 1`, `CHAPTER IV`,
//! `Part One`, `Section A`, `II. Methods`, `3. Results`) at line starts.
//! Fewer than two markers means the text is treated as a single chapter.

use crate::text::string_utils::word_count;
use crate::types::Chapter;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// Ordered marker patterns; first match wins per line. All matching is
/// case-insensitive.
static CHAPTER_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    let table: &[(&str, &str)] = &[
        (r"^Chapter\s+(\d+)", "Chapter"),
        (
            r"^Chapter\s+(One|Two|Three|Four|Five|Six|Seven|Eight|Nine|Ten|Eleven|Twelve|Thirteen|Fourteen|Fifteen|Sixteen|Seventeen|Eighteen|Nineteen|Twenty)",
            "Chapter",
        ),
        (r"^CHAPTER\s+(\d+|[IVX]+)", "Chapter"),
        (r"^Part\s+(\d+|[IVX]+|One|Two|Three|Four|Five)", "Part"),
        (r"^Section\s+(\d+|[A-Z])", "Section"),
        (r"^([IVX]+)\.\s+[A-Z]", "Section"),
        (r"^(\d+)\.\s+[A-Z][a-z]+", "Chapter"),
    ];
    table
        .iter()
        .map(|(pattern, kind)| {
            (
                Regex::new(&format!("(?i){}", pattern)).expect("valid chapter pattern"),
                *kind,
            )
        })
        .collect()
});

/// A chapter marker found in the text.
#[derive(Debug, Clone)]
struct Marker {
    line_number: usize,
    title: String,
    pattern_type: &'static str,
}

fn find_markers(lines: &[&str]) -> Vec<Marker> {
    let mut markers = Vec::new();
    for (line_number, line) in lines.iter().enumerate() {
        let stripped = line.trim();
        if stripped.is_empty() {
            continue;
        }
        for (pattern, kind) in CHAPTER_PATTERNS.iter() {
            if pattern.is_match(stripped) {
                markers.push(Marker {
                    line_number,
                    title: stripped.to_string(),
                    pattern_type: kind,
                });
                break;
            }
        }
    }
    markers
}

/// Detect chapters in plain text.
///
/// With fewer than two markers the whole text becomes one chapter titled from
/// the first non-empty line (when it is 100 chars or shorter) or the file
/// stem.
pub fn detect_text_chapters(content: &str, file_path: &Path) -> Vec<Chapter> {
    if content.trim().is_empty() {
        return Vec::new();
    }

    let lines: Vec<&str> = content.split('\n').collect();
    let markers = find_markers(&lines);

    if markers.len() < 2 {
        let mut metadata = IndexMap::new();
        metadata.insert(
            "detection_method".to_string(),
            serde_json::json!("single_chapter"),
        );
        return vec![Chapter {
            chapter_id: 1,
            title: single_chapter_title(content, file_path),
            content: content.to_string(),
            start_position: 0,
            end_position: content.len(),
            word_count: word_count(content),
            level: 1,
            metadata: Some(metadata),
        }];
    }

    // Cumulative character offset of each line start (len(line) + 1 per line).
    let mut line_offsets = Vec::with_capacity(lines.len());
    let mut offset = 0usize;
    for line in &lines {
        line_offsets.push(offset);
        offset += line.len() + 1;
    }
    let total_len = content.len();

    let mut chapters = Vec::with_capacity(markers.len());
    for (idx, marker) in markers.iter().enumerate() {
        let start = line_offsets[marker.line_number];
        let end = markers
            .get(idx + 1)
            .map(|next| line_offsets[next.line_number])
            .unwrap_or(total_len)
            .min(total_len);
        let chapter_content = &content[start..end];

        let mut metadata = IndexMap::new();
        metadata.insert("detection_method".to_string(), serde_json::json!("pattern"));
        metadata.insert(
            "pattern_type".to_string(),
            serde_json::json!(marker.pattern_type),
        );
        metadata.insert(
            "line_number".to_string(),
            serde_json::json!(marker.line_number),
        );

        chapters.push(Chapter {
            chapter_id: idx + 1,
            title: marker.title.clone(),
            content: chapter_content.to_string(),
            start_position: start,
            end_position: end,
            word_count: word_count(chapter_content),
            level: 1,
            metadata: Some(metadata),
        });
    }

    chapters
}

fn single_chapter_title(content: &str, file_path: &Path) -> String {
    let first_line = content.lines().map(str::trim).find(|line| !line.is_empty());
    match first_line {
        Some(line) if line.len() <= 100 => line.to_string(),
        _ => file_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Document".to_string()),
    }
}
