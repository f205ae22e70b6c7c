//! Font-statistics heading detection for PDF text.
//!
//! Headings have no markup in a PDF; they are inferred from font metadata.
//! A span is a heading candidate when its font size clears `mean + 1.5·stdev`
//! or it is bold and larger than the mean. Candidate levels come from the
//! rank of the span's font size among all unique sizes. Detected headings are
//! injected into the text as ATX markers, processed in reverse position order
//! so earlier offsets stay valid.

use tracing::{debug, info};

/// Window (chars) searched around a span's recorded offset during injection.
pub const HEADING_SEARCH_WINDOW: usize = 100;

/// One text span with font metadata, as collected during extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub font_size: f32,
    pub is_bold: bool,
    /// 1-based page number.
    pub page: usize,
    /// Character offset into the concatenated output.
    pub position: usize,
}

/// A detected heading: text, level 1-6, position in the extracted text.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedHeading {
    pub text: String,
    pub level: u8,
    pub position: usize,
}

/// Detect headings from font-size statistics.
pub fn detect_headings_from_fonts(spans: &[TextSpan], max_heading_words: usize) -> Vec<DetectedHeading> {
    if spans.is_empty() {
        return Vec::new();
    }

    let sizes: Vec<f32> = spans.iter().map(|s| s.font_size).collect();
    let mean = sizes.iter().sum::<f32>() / sizes.len() as f32;
    let stdev = if sizes.len() > 1 {
        let variance =
            sizes.iter().map(|s| (s - mean).powi(2)).sum::<f32>() / (sizes.len() - 1) as f32;
        variance.sqrt()
    } else {
        0.0
    };
    let threshold = mean + 1.5 * stdev;

    // Unique sizes, descending; a heading's level is its size's rank.
    let mut unique_sizes: Vec<f32> = Vec::new();
    for &size in &sizes {
        if !unique_sizes.iter().any(|s| (s - size).abs() < f32::EPSILON) {
            unique_sizes.push(size);
        }
    }
    unique_sizes.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

    let mut headings = Vec::new();
    for span in spans {
        let is_candidate =
            span.font_size >= threshold || (span.is_bold && span.font_size > mean);
        if !is_candidate {
            continue;
        }
        let text = span.text.trim();
        let token_count = text.split_whitespace().count();
        if token_count < 1 || token_count > max_heading_words {
            continue;
        }
        headings.push(DetectedHeading {
            text: text.to_string(),
            level: level_for_size(span.font_size, &unique_sizes),
            position: span.position,
        });
    }

    info!(
        mean = format!("{:.1}", mean),
        stdev = format!("{:.1}", stdev),
        threshold = format!("{:.1}", threshold),
        candidates = headings.len(),
        "Font analysis complete"
    );
    headings
}

/// Rank a font size among the unique sizes (descending): biggest is level 1.
/// Unknown sizes map to level 3.
fn level_for_size(font_size: f32, unique_sizes: &[f32]) -> u8 {
    match unique_sizes
        .iter()
        .position(|s| (s - font_size).abs() < f32::EPSILON)
    {
        Some(index) => ((index + 1).min(6)) as u8,
        None => 3,
    }
}

/// Rewrite detected headings as ATX markers inside the extracted text.
///
/// Headings are processed in descending position order so replacements never
/// shift the offsets of the ones still pending. The heading text is located
/// within a small window around its recorded offset; if that fails, a single
/// plain substring replacement is the fallback.
pub fn inject_markdown_headings(text: &str, headings: &[DetectedHeading]) -> String {
    if headings.is_empty() {
        return text.to_string();
    }

    let mut sorted: Vec<&DetectedHeading> = headings.iter().collect();
    sorted.sort_by(|a, b| b.position.cmp(&a.position));

    let mut result = text.to_string();
    for heading in sorted {
        let marker = format!("\n{} {}\n", "#".repeat(heading.level as usize), heading.text);

        let search_start = heading.position.saturating_sub(HEADING_SEARCH_WINDOW);
        let search_end =
            (heading.position + heading.text.len() + HEADING_SEARCH_WINDOW).min(result.len());
        let search_start = floor_char_boundary(&result, search_start.min(search_end));
        let search_end = floor_char_boundary(&result, search_end);

        if let Some(found) = result[search_start..search_end].find(&heading.text) {
            let at = search_start + found;
            result.replace_range(at..at + heading.text.len(), &marker);
        } else {
            debug!(heading = %heading.text, "Window search missed, using plain replacement");
            result = result.replacen(&heading.text, &marker, 1);
        }
    }

    result
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    index = index.min(s.len());
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}
