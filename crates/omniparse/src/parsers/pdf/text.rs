//! PDF text-layer extraction with font metadata.

use super::headings::TextSpan;
use pdfium_render::prelude::*;
use tracing::debug;

/// Pages sampled for the scanned-vs-text decision.
const SCAN_SAMPLE_PAGES: usize = 3;

/// Result of walking the text layer.
#[derive(Debug, Default)]
pub struct ExtractedText {
    pub content: String,
    pub spans: Vec<TextSpan>,
}

/// Decide whether the document is scanned: sample up to the first three
/// pages and compare the average stripped character count per page against
/// the configured threshold.
pub fn is_scanned(document: &PdfDocument, min_chars_per_page: usize) -> bool {
    let pages = document.pages();
    let sample_count = (pages.len() as usize).min(SCAN_SAMPLE_PAGES);
    if sample_count == 0 {
        return true;
    }

    let mut total_chars = 0usize;
    for index in 0..sample_count {
        if let Ok(page) = pages.get(index as u16)
            && let Ok(text) = page.text()
        {
            total_chars += text.all().trim().chars().count();
        }
    }

    let average = total_chars / sample_count;
    debug!(average, threshold = min_chars_per_page, "Scan-type decision");
    average < min_chars_per_page
}

/// Walk pages and text objects, collecting `(text, font_size, is_bold, page,
/// position)` spans where `position` is the offset into the concatenated
/// output. Optionally injects `--- Page N ---` markers between pages.
pub fn extract_text_spans(
    document: &PdfDocument,
    max_pages: Option<usize>,
    include_page_markers: bool,
) -> ExtractedText {
    let mut extracted = ExtractedText::default();

    for (page_index, page) in document.pages().iter().enumerate() {
        if let Some(cap) = max_pages
            && page_index >= cap
        {
            break;
        }
        let page_number = page_index + 1;

        if include_page_markers {
            extracted
                .content
                .push_str(&format!("\n\n--- Page {} ---\n\n", page_number));
        }

        for object in page.objects().iter() {
            let Some(text_object) = object.as_text_object() else {
                continue;
            };
            let text = text_object.text();
            let trimmed = text.trim();
            if trimmed.is_empty() {
                continue;
            }

            let font = text_object.font();
            let font_size = text_object.unscaled_font_size().value;
            let is_bold = span_is_bold(&font);

            extracted.spans.push(TextSpan {
                text: trimmed.to_string(),
                font_size,
                is_bold,
                page: page_number,
                position: extracted.content.len(),
            });
            extracted.content.push_str(trimmed);
            extracted.content.push('\n');
        }

        extracted.content.push('\n');
    }

    extracted.content = extracted.content.trim().to_string();
    extracted
}

/// Bold detection: heavy font weight, or "Bold" in the font family name.
fn span_is_bold(font: &PdfFont) -> bool {
    let heavy = matches!(
        font.weight(),
        Ok(PdfFontWeight::Weight700Bold) | Ok(PdfFontWeight::Weight800) | Ok(PdfFontWeight::Weight900)
    ) || matches!(font.weight(), Ok(PdfFontWeight::Custom(weight)) if weight >= 700);
    heavy || font.family().contains("Bold")
}
