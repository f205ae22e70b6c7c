//! EPUB chapter extraction: TOC-aligned slicing with a spine fallback.
//!
//! The TOC path concatenates spine-item text in reading order, records where
//! each file starts in the buffer, and slices chapters at the TOC entries'
//! file boundaries. Without a usable TOC, each spine item becomes one
//! chapter. Post-processing drops short chapters, disambiguates duplicate
//! titles, and renumbers ids.

use crate::text::html_text;
use crate::text::string_utils::word_count;
use crate::types::Chapter;
use ahash::AHashMap;
use epub::doc::{EpubDoc, NavPoint};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::io::{Read, Seek};
use tracing::{debug, info, warn};

static H1_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").expect("valid selector"));
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("valid selector"));

/// One flattened TOC entry: title, target file, nesting depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub title: String,
    pub href: String,
    pub level: u8,
}

/// Flatten the book's TOC tree, preserving nesting depth as `level`.
///
/// Uses an explicit worklist instead of recursion so deep TOCs cannot blow
/// the stack. Returns `None` when the book has no usable TOC.
pub fn flatten_toc<R: Read + Seek>(doc: &EpubDoc<R>) -> Option<Vec<TocEntry>> {
    if doc.toc.is_empty() {
        return None;
    }

    let mut entries = Vec::new();
    // Stack of (nav_point, level); children pushed in reverse so the
    // traversal emits document order.
    let mut worklist: Vec<(&NavPoint, u8)> = doc.toc.iter().rev().map(|np| (np, 1)).collect();
    while let Some((nav_point, level)) = worklist.pop() {
        let title = nav_point.label.trim().to_string();
        let href = nav_point.content.to_string_lossy().into_owned();
        if !title.is_empty() && !href.is_empty() {
            entries.push(TocEntry {
                title,
                href,
                level: level.min(6),
            });
        }
        for child in nav_point.children.iter().rev() {
            worklist.push((child, level.saturating_add(1)));
        }
    }

    if entries.is_empty() { None } else { Some(entries) }
}

/// Strip a fragment from a TOC href, keeping the file part only.
fn href_file(href: &str) -> &str {
    href.split('#').next().unwrap_or(href)
}

/// Text of every spine item in reading order plus a file → buffer-offset map.
fn concatenate_spine<R: Read + Seek>(
    doc: &mut EpubDoc<R>,
    warnings: &mut Vec<String>,
) -> (String, AHashMap<String, usize>, Vec<(String, String)>) {
    let mut position_map: AHashMap<String, usize> = AHashMap::new();
    let mut parts: Vec<String> = Vec::new();
    let mut raw_items: Vec<(String, String)> = Vec::new();
    let mut cumulative = 0usize;
    let mut item_index = 0usize;

    doc.set_current_chapter(0);
    loop {
        let Some((html, _mime)) = doc.get_current_str() else {
            warnings.push(format!("Failed to read spine item {}", item_index));
            if !doc.go_next() {
                break;
            }
            item_index += 1;
            continue;
        };
        let file_name = doc
            .get_current_path()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("item_{}.xhtml", item_index));

        let text = html_text::extract_text(&html);
        position_map.insert(file_name.clone(), cumulative);
        raw_items.push((file_name, html));

        cumulative += text.len() + 2;
        parts.push(text);

        if !doc.go_next() {
            break;
        }
        item_index += 1;
    }

    (parts.join("\n\n"), position_map, raw_items)
}

/// TOC-based chapter extraction (the preferred path).
pub fn extract_chapters_from_toc<R: Read + Seek>(
    doc: &mut EpubDoc<R>,
    toc_entries: &[TocEntry],
    warnings: &mut Vec<String>,
) -> (String, Vec<Chapter>) {
    let (full_content, position_map, _raw_items) = concatenate_spine(doc, warnings);
    if full_content.trim().is_empty() {
        warn!("No spine content found in EPUB");
        return (String::new(), Vec::new());
    }

    // Resolve each TOC entry to a start offset; entries whose file is not in
    // the spine map are skipped.
    let mut resolved: Vec<(&TocEntry, usize)> = Vec::new();
    for entry in toc_entries {
        let file = href_file(&entry.href);
        let position = position_map.get(file).copied().or_else(|| {
            // Fall back to matching on the file name component alone.
            let name = file.rsplit('/').next().unwrap_or(file);
            position_map
                .iter()
                .find(|(key, _)| key.rsplit('/').next() == Some(name))
                .map(|(_, pos)| *pos)
        });
        match position {
            Some(position) => resolved.push((entry, position)),
            None => {
                warnings.push(format!(
                    "TOC entry '{}' targets unknown file '{}', skipped",
                    entry.title, file
                ));
            }
        }
    }

    let mut chapters = Vec::with_capacity(resolved.len());
    for (idx, (entry, start)) in resolved.iter().enumerate() {
        let end = resolved
            .get(idx + 1)
            .map(|(_, next_start)| *next_start)
            .unwrap_or(full_content.len())
            .min(full_content.len());
        let start = (*start).min(end);
        let content = full_content[start..end].to_string();

        let mut chapter_metadata = IndexMap::new();
        chapter_metadata.insert("detection_method".to_string(), serde_json::json!("toc"));
        chapter_metadata.insert(
            "source_file_name".to_string(),
            serde_json::json!(href_file(&entry.href)),
        );

        chapters.push(Chapter {
            chapter_id: idx + 1,
            title: entry.title.clone(),
            word_count: word_count(&content),
            content,
            start_position: start,
            end_position: end,
            level: entry.level,
            metadata: Some(chapter_metadata),
        });
    }

    info!(
        chapters = chapters.len(),
        characters = full_content.len(),
        "Extracted chapters using TOC"
    );
    (full_content, chapters)
}

/// Spine-based fallback: one chapter per spine item.
pub fn extract_chapters_from_spine<R: Read + Seek>(
    doc: &mut EpubDoc<R>,
    warnings: &mut Vec<String>,
) -> (String, Vec<Chapter>) {
    let (full_content, position_map, raw_items) = concatenate_spine(doc, warnings);
    if full_content.trim().is_empty() {
        warn!("No spine content found in EPUB");
        return (String::new(), Vec::new());
    }

    // Reconstruct per-item boundaries from the position map.
    let mut chapters = Vec::with_capacity(raw_items.len());
    for (idx, (file_name, html)) in raw_items.iter().enumerate() {
        let start = position_map.get(file_name).copied().unwrap_or(0);
        let end = raw_items
            .get(idx + 1)
            .and_then(|(next_file, _)| position_map.get(next_file))
            .map(|next_start| next_start.saturating_sub(2))
            .unwrap_or(full_content.len())
            .min(full_content.len());
        let start = start.min(end);
        let content = full_content[start..end].to_string();

        let title = spine_item_title(html).unwrap_or_else(|| format!("Chapter {}", idx + 1));

        let mut chapter_metadata = IndexMap::new();
        chapter_metadata.insert("detection_method".to_string(), serde_json::json!("spine"));
        chapter_metadata.insert("source_file_name".to_string(), serde_json::json!(file_name));

        chapters.push(Chapter {
            chapter_id: idx + 1,
            title,
            word_count: word_count(&content),
            content,
            start_position: start,
            end_position: end,
            level: 1,
            metadata: Some(chapter_metadata),
        });
        debug!(chapter = idx + 1, file = %file_name, "Created spine chapter");
    }

    info!(
        chapters = chapters.len(),
        characters = full_content.len(),
        "Extracted chapters using spine"
    );
    (full_content, chapters)
}

/// Title for a spine item: first `<h1>`, then `<title>`.
fn spine_item_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    for selector in [&*H1_SELECTOR, &*TITLE_SELECTOR] {
        if let Some(element) = document.select(selector).next() {
            let title = element.text().collect::<String>().trim().to_string();
            if !title.is_empty() {
                return Some(title);
            }
        }
    }
    None
}

/// Drop short chapters, disambiguate duplicate titles, renumber ids.
pub fn postprocess_chapters(
    chapters: Vec<Chapter>,
    min_chapter_length: usize,
    warnings: &mut Vec<String>,
) -> Vec<Chapter> {
    let mut kept = Vec::with_capacity(chapters.len());
    for chapter in chapters {
        if chapter.word_count < min_chapter_length {
            warnings.push(format!(
                "Filtered short chapter: '{}' ({} words)",
                chapter.title, chapter.word_count
            ));
        } else {
            kept.push(chapter);
        }
    }

    let mut title_counts: AHashMap<String, usize> = AHashMap::new();
    for chapter in kept.iter_mut() {
        let count = title_counts.entry(chapter.title.clone()).or_insert(0);
        *count += 1;
        if *count > 1 {
            chapter.title = format!("{} ({})", chapter.title, *count);
        }
    }

    for (idx, chapter) in kept.iter_mut().enumerate() {
        chapter.chapter_id = idx + 1;
    }
    kept
}
