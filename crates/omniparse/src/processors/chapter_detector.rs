//! Chapter detection from markdown heading hierarchy.
//!
//! Scans ATX headings (`#` through `######`), keeps the ones inside the
//! requested level band, and slices the content at heading positions into
//! [`Chapter`]s with position tracking and word counts. A document with no
//! qualifying headings becomes a single "Full Document" chapter.

use crate::text::string_utils::word_count;
use crate::types::Chapter;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

static ATX_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^(#{1,6})\s+(.+?)\s*$").unwrap());

/// A heading found in markdown text: level, title, byte position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: u8,
    pub title: String,
    pub position: usize,
}

/// Extract all ATX headings with level, title, and character position.
pub fn extract_headings(text: &str) -> Vec<Heading> {
    ATX_HEADING
        .captures_iter(text)
        .map(|caps| {
            let hashes = caps.get(1).expect("group 1 always present");
            Heading {
                level: hashes.as_str().len() as u8,
                title: caps[2].trim().to_string(),
                position: caps.get(0).expect("group 0 always present").start(),
            }
        })
        .collect()
}

/// Detect chapters from markdown text based on heading hierarchy.
///
/// Only headings with `min_level <= level <= max_level` become chapter
/// boundaries. Each chapter spans from its heading to the next qualifying
/// heading (or end of text). Empty input yields an empty list; input with no
/// qualifying headings yields one auto-generated full-document chapter.
pub fn detect_chapters(text: &str, min_level: u8, max_level: u8) -> Vec<Chapter> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let chapter_headings: Vec<Heading> = extract_headings(text)
        .into_iter()
        .filter(|h| h.level >= min_level && h.level <= max_level)
        .collect();

    if chapter_headings.is_empty() {
        let mut metadata = IndexMap::new();
        metadata.insert("auto_generated".to_string(), serde_json::json!(true));
        metadata.insert(
            "detection_method".to_string(),
            serde_json::json!("auto_generated"),
        );
        return vec![Chapter {
            chapter_id: 1,
            title: "Full Document".to_string(),
            content: text.to_string(),
            start_position: 0,
            end_position: text.len(),
            word_count: word_count(text),
            level: 1,
            metadata: Some(metadata),
        }];
    }

    let mut chapters = Vec::with_capacity(chapter_headings.len());
    for (idx, heading) in chapter_headings.iter().enumerate() {
        let start = heading.position;
        let end = chapter_headings
            .get(idx + 1)
            .map(|next| next.position)
            .unwrap_or(text.len());
        let content = &text[start..end];

        chapters.push(Chapter {
            chapter_id: idx + 1,
            title: heading.title.clone(),
            content: content.to_string(),
            start_position: start,
            end_position: end,
            word_count: word_count(content),
            level: heading.level,
            metadata: None,
        });
    }

    chapters
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_headings_levels_and_positions() {
        let text = "# Chapter 1\n\nContent\n\n## Section 1.1";
        let headings = extract_headings(text);
        assert_eq!(headings.len(), 2);
        assert_eq!(headings[0].level, 1);
        assert_eq!(headings[0].title, "Chapter 1");
        assert_eq!(headings[0].position, 0);
        assert_eq!(headings[1].level, 2);
        assert_eq!(headings[1].title, "Section 1.1");
        assert_eq!(headings[1].position, 22);
    }

    #[test]
    fn test_detect_chapters_level_band() {
        let md = "# Intro\n\nintro text\n\n## Background\n\nbg text\n\n# Chapter 1\n\nmain text\n";
        let chapters = detect_chapters(md, 1, 1);
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].title, "Intro");
        assert!(chapters[0].content.contains("Background"));
        assert_eq!(chapters[1].title, "Chapter 1");
    }

    #[test]
    fn test_chapter_positions_slice_content() {
        let md = "# A\n\none two\n\n# B\n\nthree\n";
        let chapters = detect_chapters(md, 1, 2);
        assert_eq!(chapters.len(), 2);
        for chapter in &chapters {
            assert_eq!(
                &md[chapter.start_position..chapter.end_position],
                chapter.content
            );
            assert!(chapter.end_position > chapter.start_position);
        }
        assert_eq!(chapters[0].word_count, 3);
        assert_eq!(chapters[1].word_count, 2);
    }

    #[test]
    fn test_no_headings_single_full_document() {
        let chapters = detect_chapters("just prose, no structure at all", 1, 2);
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, "Full Document");
        assert_eq!(chapters[0].level, 1);
        let metadata = chapters[0].metadata.as_ref().unwrap();
        assert_eq!(metadata["auto_generated"], serde_json::json!(true));
    }

    #[test]
    fn test_empty_input_yields_no_chapters() {
        assert!(detect_chapters("", 1, 2).is_empty());
        assert!(detect_chapters("   \n\n  ", 1, 2).is_empty());
    }

    #[test]
    fn test_chapter_ids_are_contiguous() {
        let md = "# A\n\nx\n\n# B\n\ny\n\n# C\n\nz\n";
        let chapters = detect_chapters(md, 1, 2);
        let ids: Vec<usize> = chapters.iter().map(|c| c.chapter_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_detector_is_stable_on_reconstructed_content() {
        let md = "# A\n\nalpha beta\n\n## A.1\n\ngamma\n\n# B\n\ndelta\n";
        let first = detect_chapters(md, 1, 1);
        let reconstructed: String = first.iter().map(|c| c.content.as_str()).collect();
        let second = detect_chapters(&reconstructed, 1, 1);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.title, b.title);
            assert_eq!(a.word_count, b.word_count);
        }
    }

    #[test]
    fn test_deeper_headings_ignored_outside_band() {
        let md = "### Deep\n\ncontent";
        let chapters = detect_chapters(md, 1, 2);
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, "Full Document");
    }
}
