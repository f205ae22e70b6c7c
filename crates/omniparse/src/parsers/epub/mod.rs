//! EPUB pipeline: container loading, Dublin Core metadata, TOC↔spine-aligned
//! chapter extraction, and image extraction.

mod chapters;
mod images;
mod metadata;

pub use chapters::{
    TocEntry, extract_chapters_from_spine, extract_chapters_from_toc, flatten_toc,
    postprocess_chapters,
};
pub use metadata::{extract_isbn, parse_epub_date};

use crate::core::config::ParseOptions;
use crate::core::io::validate_input_file;
use crate::plugins::{FormatParser, Plugin};
use crate::processors::text_cleaner;
use crate::text::string_utils::{estimate_reading_time, word_count};
use crate::types::{Document, ProcessingInfo};
use crate::{OmniparseError, Result};
use async_trait::async_trait;
use epub::doc::EpubDoc;
use std::path::Path;
use tracing::info;

const WORDS_PER_MINUTE: u32 = 200;
const DEFAULT_MIN_CHAPTER_LENGTH: usize = 100;

/// EPUB format parser.
pub struct EpubParser;

impl EpubParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EpubParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for EpubParser {
    fn name(&self) -> &str {
        "epub"
    }

    fn description(&self) -> &str {
        "Parses EPUB books with TOC-aligned chapter extraction and Dublin Core metadata"
    }
}

#[async_trait]
impl FormatParser for EpubParser {
    async fn parse_file(&self, path: &Path, options: &ParseOptions) -> Result<Document> {
        let mut warnings = Vec::new();
        let file_size = validate_input_file(path, &["epub"], &mut warnings)?;

        let mut doc = EpubDoc::new(path).map_err(|e| {
            OmniparseError::parsing(
                format!("Failed to open EPUB {}: {}", path.display(), e),
                "epub",
            )
        })?;

        let mut doc_metadata = metadata::extract_metadata(&doc, file_size, &mut warnings);

        // Chapter source: TOC when present and allowed, spine otherwise.
        let toc_entries = if options.use_toc { flatten_toc(&doc) } else { None };
        let (mut content, chapters) = match toc_entries {
            Some(entries) => {
                info!(entries = entries.len(), "Using TOC-based chapter detection");
                extract_chapters_from_toc(&mut doc, &entries, &mut warnings)
            }
            None if options.use_spine_fallback => {
                info!("Using spine-based chapter detection (no TOC)");
                extract_chapters_from_spine(&mut doc, &mut warnings)
            }
            None => {
                warnings.push(
                    "No TOC available and spine fallback disabled; no chapters extracted"
                        .to_string(),
                );
                (String::new(), Vec::new())
            }
        };

        let mut chapters = if options.detect_chapters {
            postprocess_chapters(
                chapters,
                options.min_chapter_length_or(DEFAULT_MIN_CHAPTER_LENGTH),
                &mut warnings,
            )
        } else {
            Vec::new()
        };

        // Images need a persistent destination; without one no references are
        // emitted (a temp dir would leave dangling paths in the result).
        let image_references = match (&options.extract_images, &options.image_output_dir) {
            (true, Some(dir)) => images::extract_images(&mut doc, dir, &mut warnings),
            (true, None) => {
                warnings
                    .push("Image extraction skipped: no image_output_dir configured".to_string());
                Vec::new()
            }
            _ => Vec::new(),
        };

        if options.clean_text {
            content = text_cleaner::clean_text(&content);
            for chapter in chapters.iter_mut() {
                chapter.content = text_cleaner::clean_text(&chapter.content);
                chapter.word_count = word_count(&chapter.content);
            }
        }

        if doc_metadata.title.is_none() {
            doc_metadata.title = path.file_stem().map(|s| s.to_string_lossy().into_owned());
        }

        let mut processing_info = ProcessingInfo::new(self.name(), self.version());
        processing_info.warnings = warnings;
        processing_info.options_used = options.as_record();

        let words = word_count(&content);
        let mut document = Document::new(doc_metadata, processing_info);
        document.content = content;
        document.chapters = chapters;
        document.images = image_references;
        document.word_count = words;
        document.estimated_reading_time = estimate_reading_time(words, WORDS_PER_MINUTE);
        Ok(document)
    }

    fn extensions(&self) -> &[&str] {
        &[".epub"]
    }

    fn supports(&self, path: &Path) -> bool {
        crate::core::format::detect_format_from_file(path) == Some("epub")
    }

    fn priority(&self) -> i32 {
        50
    }
}
