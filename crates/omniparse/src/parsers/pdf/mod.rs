//! PDF pipeline: text-layer extraction with font-statistics heading
//! detection, table and image extraction, OCR fallback for scanned
//! documents, and optional QR detection.

pub mod headings;
mod images;
mod tables;
mod text;

#[cfg(feature = "ocr")]
mod ocr;

#[cfg(feature = "qr")]
mod qr;

pub use headings::{DetectedHeading, TextSpan, detect_headings_from_fonts, inject_markdown_headings};
pub use tables::{PageTable, render_tables_section};

use crate::core::config::ParseOptions;
use crate::core::io::{read_bytes, validate_input_file};
use crate::plugins::{FormatParser, Plugin};
use crate::processors::chapter_detector::detect_chapters;
use crate::processors::text_cleaner;
use crate::text::string_utils::{estimate_reading_time, word_count};
use crate::types::{Document, ImageReference, Metadata, ProcessingInfo};
use crate::{OmniparseError, Result};
use async_trait::async_trait;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{info, warn};

const WORDS_PER_MINUTE: u32 = 200;
/// PDF font hierarchies are richer, so the default chapter band is deeper.
const DEFAULT_MAX_CHAPTER_LEVEL: u8 = 3;
/// DPI used when pages are rendered only for QR scanning.
#[cfg(feature = "qr")]
const QR_RENDER_DPI: u32 = 150;

/// Everything the pdfium stage produces; the document handle never outlives
/// this sync stage, so the async part of the pipeline stays `Send`.
struct PdfiumExtraction {
    metadata: Metadata,
    page_count: usize,
    scanned: bool,
    text: text::ExtractedText,
    tables: Vec<PageTable>,
    images: Vec<ImageReference>,
    /// Pages rendered for OCR (scanned docs) or QR scanning.
    rendered_pages: Vec<DynamicImage>,
    #[cfg(feature = "qr")]
    qr_codes: Vec<crate::types::QrCodeReference>,
}

/// PDF format parser.
pub struct PdfParser;

impl PdfParser {
    pub fn new() -> Self {
        Self
    }

    fn extract_with_pdfium(
        &self,
        bytes: &[u8],
        options: &ParseOptions,
        warnings: &mut Vec<String>,
    ) -> Result<PdfiumExtraction> {
        let bindings = Pdfium::bind_to_system_library()
            .or_else(|_| {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            })
            .map_err(|e| {
                OmniparseError::parsing(format!("Cannot bind pdfium library: {}", e), "pdf")
            })?;
        let pdfium = Pdfium::new(bindings);

        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| OmniparseError::parsing(format!("Failed to open PDF: {}", e), "pdf"))?;

        let page_count = document.pages().len() as usize;
        let metadata = extract_metadata(&document, page_count);

        let scanned = text::is_scanned(&document, options.min_chars_per_page);

        let mut extraction = PdfiumExtraction {
            metadata,
            page_count,
            scanned,
            text: text::ExtractedText::default(),
            tables: Vec::new(),
            images: Vec::new(),
            rendered_pages: Vec::new(),
            #[cfg(feature = "qr")]
            qr_codes: Vec::new(),
        };

        if scanned {
            info!("PDF has no usable text layer, treating as scanned");
            if options.use_ocr && cfg!(feature = "ocr") {
                extraction.rendered_pages =
                    render_pages(&document, options.ocr_dpi, options.max_pages, warnings);
            } else {
                warnings.push(
                    "Scanned PDF but OCR is disabled or unavailable; no text extracted"
                        .to_string(),
                );
            }
        } else {
            extraction.text = text::extract_text_spans(
                &document,
                options.max_pages,
                options.include_page_markers,
            );

            if options.extract_tables {
                for (page_index, page) in document.pages().iter().enumerate() {
                    if let Some(cap) = options.max_pages
                        && page_index >= cap
                    {
                        break;
                    }
                    extraction
                        .tables
                        .extend(tables::extract_page_tables(&page, page_index + 1));
                }
            }

            if options.extract_images {
                match &options.image_output_dir {
                    Some(dir) => {
                        for (page_index, page) in document.pages().iter().enumerate() {
                            if let Some(cap) = options.max_pages
                                && page_index >= cap
                            {
                                break;
                            }
                            let saved = extraction.images.len();
                            extraction.images.extend(images::extract_page_images(
                                &page,
                                page_index + 1,
                                dir,
                                saved,
                                warnings,
                            ));
                        }
                    }
                    None => {
                        warnings.push(
                            "Image extraction skipped: no image_output_dir configured".to_string(),
                        );
                    }
                }
            }
        }

        #[cfg(feature = "qr")]
        if options.detect_qr_codes {
            if extraction.rendered_pages.is_empty() {
                extraction.rendered_pages =
                    render_pages(&document, QR_RENDER_DPI, options.max_pages, warnings);
            }
            extraction.qr_codes = qr::scan_pages(&extraction.rendered_pages);
            // Scanned documents keep the renders for OCR.
            if !scanned {
                extraction.rendered_pages.clear();
            }
        }

        Ok(extraction)
    }
}

impl Default for PdfParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for PdfParser {
    fn name(&self) -> &str {
        "pdf"
    }

    fn description(&self) -> &str {
        "Parses PDF documents with font-statistics heading detection and OCR fallback"
    }
}

#[async_trait]
impl FormatParser for PdfParser {
    async fn parse_file(&self, path: &Path, options: &ParseOptions) -> Result<Document> {
        let mut warnings = Vec::new();
        let file_size = validate_input_file(path, &["pdf"], &mut warnings)?;
        let bytes = read_bytes(path)?;

        // All pdfium work happens synchronously here; the handle is closed
        // before the first await point.
        let mut extraction = self.extract_with_pdfium(&bytes, options, &mut warnings)?;
        extraction.metadata.file_size = file_size;

        let (mut content, heading_count) = if extraction.scanned {
            #[cfg(feature = "ocr")]
            {
                if options.use_ocr && !extraction.rendered_pages.is_empty() {
                    let pages = std::mem::take(&mut extraction.rendered_pages);
                    let ocr_text = ocr::recognize_pages(
                        pages,
                        &options.ocr_language,
                        options.ocr_timeout,
                        &mut warnings,
                    )
                    .await?;
                    (ocr_text, 0)
                } else {
                    (String::new(), 0)
                }
            }
            #[cfg(not(feature = "ocr"))]
            {
                (String::new(), 0)
            }
        } else {
            let detected =
                detect_headings_from_fonts(&extraction.text.spans, options.max_heading_words);
            let count = detected.len();
            let content = inject_markdown_headings(&extraction.text.content, &detected);
            (content, count)
        };
        if heading_count > 0 {
            info!(headings = heading_count, "Injected markdown headings");
        }

        if let Some(section) = render_tables_section(&extraction.tables) {
            content.push_str("\n\n");
            content.push_str(&section);
        }

        let mut chapters = if options.detect_chapters {
            let (min_level, max_level) =
                options.chapter_level_band(1, DEFAULT_MAX_CHAPTER_LEVEL);
            detect_chapters(&content, min_level, max_level)
        } else {
            Vec::new()
        };

        if options.clean_text {
            content = text_cleaner::clean_text(&content);
            for chapter in chapters.iter_mut() {
                chapter.content = text_cleaner::clean_text(&chapter.content);
                chapter.word_count = word_count(&chapter.content);
            }
        }

        let mut processing_info = ProcessingInfo::new(self.name(), self.version());
        processing_info.warnings = warnings;
        processing_info.options_used = options.as_record();

        let words = word_count(&content);
        let mut document = Document::new(extraction.metadata, processing_info);
        document.content = content;
        document.chapters = chapters;
        document.images = extraction.images;
        document.word_count = words;
        document.estimated_reading_time = estimate_reading_time(words, WORDS_PER_MINUTE);

        #[cfg(feature = "qr")]
        if !extraction.qr_codes.is_empty() {
            let mut codes = extraction.qr_codes;
            crate::processors::qr_merger::skip_non_url_codes(&mut codes);
            crate::processors::qr_merger::merge_qr_content(&mut document, codes);
        }

        Ok(document)
    }

    fn extensions(&self) -> &[&str] {
        &[".pdf"]
    }

    fn supports(&self, path: &Path) -> bool {
        crate::core::format::detect_format_from_file(path) == Some("pdf")
    }

    fn priority(&self) -> i32 {
        50
    }
}

/// Document information dictionary into metadata.
fn extract_metadata(document: &PdfDocument, page_count: usize) -> Metadata {
    let mut metadata = Metadata::new("pdf");

    let tag_value = |tag: PdfDocumentMetadataTagType| {
        document
            .metadata()
            .get(tag)
            .map(|t| t.value().trim().to_string())
            .filter(|v| !v.is_empty())
    };

    metadata.title = tag_value(PdfDocumentMetadataTagType::Title);
    if let Some(author) = tag_value(PdfDocumentMetadataTagType::Author) {
        metadata = metadata.with_author(author);
    }
    metadata.description = tag_value(PdfDocumentMetadataTagType::Subject);
    if let Some(keywords) = tag_value(PdfDocumentMetadataTagType::Keywords) {
        metadata.tags = keywords
            .split([';', ','])
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
    }
    if let Some(creator) = tag_value(PdfDocumentMetadataTagType::Creator) {
        metadata
            .custom_fields
            .insert("creator".to_string(), serde_json::json!(creator));
    }
    metadata
        .custom_fields
        .insert("page_count".to_string(), serde_json::json!(page_count));

    metadata
}

/// Render pages to images at the given DPI.
fn render_pages(
    document: &PdfDocument,
    dpi: u32,
    max_pages: Option<usize>,
    warnings: &mut Vec<String>,
) -> Vec<DynamicImage> {
    const POINTS_PER_INCH: f32 = 72.0;
    let scale = dpi as f32 / POINTS_PER_INCH;

    let mut rendered = Vec::new();
    for (page_index, page) in document.pages().iter().enumerate() {
        if let Some(cap) = max_pages
            && page_index >= cap
        {
            break;
        }
        let config = PdfRenderConfig::new()
            .set_target_width(((page.width().value * scale) as i32).max(1))
            .set_target_height(((page.height().value * scale) as i32).max(1));
        match page.render_with_config(&config) {
            Ok(bitmap) => rendered.push(DynamicImage::ImageRgb8(bitmap.as_image().into_rgb8())),
            Err(e) => {
                warn!(page = page_index + 1, "Failed to render page: {}", e);
                warnings.push(format!("Failed to render page {}: {}", page_index + 1, e));
            }
        }
    }
    rendered
}
