//! HTML pipeline: fetch or read, main-content extraction with fallback,
//! Markdown conversion, metadata, and concurrent image downloads.

mod content;
mod fetcher;
mod images;

pub use content::{ExtractionPath, extract_main_content};
pub use fetcher::ContentFetcher;
pub use images::{collect_image_tasks, download_images, reference_only_images, resolve_image_url};

use crate::core::config::ParseOptions;
use crate::core::io::{read_bytes, validate_input_file};
use crate::plugins::{FormatParser, Plugin};
use crate::processors::chapter_detector::detect_chapters;
use crate::processors::markdown_converter::{ConvertOptions, html_to_markdown};
use crate::processors::metadata_extractor::extract_html_metadata;
use crate::text::string_utils::{estimate_reading_time, word_count};
use crate::types::{Document, ProcessingInfo};
use crate::{OmniparseError, Result};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use url::Url;

const WORDS_PER_MINUTE: u32 = 225;

/// HTML format parser; handles both local files and URLs.
pub struct HtmlParser;

impl HtmlParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a web page by URL. The dispatcher routes `http(s)://` sources
    /// here directly, without any file checks.
    pub async fn parse_url(&self, url: &str, options: &ParseOptions) -> Result<Document> {
        let parsed_url = Url::parse(url)
            .map_err(|e| OmniparseError::validation_with_source(format!("Invalid URL: {}", url), e))?;

        let fetcher = Arc::new(ContentFetcher::new(options)?);
        let html = fetcher.fetch_text(url).await?;
        self.build_document(&html, Some(&parsed_url), Some(fetcher), options)
            .await
    }

    async fn build_document(
        &self,
        html: &str,
        base_url: Option<&Url>,
        fetcher: Option<Arc<ContentFetcher>>,
        options: &ParseOptions,
    ) -> Result<Document> {
        let mut warnings = Vec::new();

        let (main_html, _path) = extract_main_content(html, &mut warnings)?;

        let convert_options = ConvertOptions {
            preserve_links: options.preserve_links,
            preserve_images: options.preserve_images,
        };
        let markdown = html_to_markdown(&main_html, &convert_options);

        // Metadata comes from the original HTML so meta tags survive.
        let mut metadata = extract_html_metadata(html, base_url.map(Url::as_str));
        metadata.file_size = html.len() as u64;

        let images = if options.extract_images {
            let tasks = collect_image_tasks(html, base_url);
            match (&options.image_output_dir, &fetcher) {
                (Some(dir), Some(fetcher)) => {
                    download_images(
                        tasks,
                        Arc::clone(fetcher),
                        dir,
                        options.max_image_workers,
                        &mut warnings,
                    )
                    .await
                }
                _ => reference_only_images(&tasks),
            }
        } else {
            Vec::new()
        };

        let chapters = if options.detect_chapters {
            let (min_level, max_level) = options.chapter_level_band(1, 2);
            detect_chapters(&markdown, min_level, max_level)
        } else {
            Vec::new()
        };

        let mut processing_info = ProcessingInfo::new(self.name(), self.version());
        processing_info.warnings = warnings;
        processing_info.options_used = options.as_record();

        let words = word_count(&markdown);
        let mut document = Document::new(metadata, processing_info);
        document.content = markdown;
        document.chapters = chapters;
        document.images = images;
        document.word_count = words;
        document.estimated_reading_time = estimate_reading_time(words, WORDS_PER_MINUTE);
        Ok(document)
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for HtmlParser {
    fn name(&self) -> &str {
        "html"
    }

    fn description(&self) -> &str {
        "Parses HTML files and web pages with main-content extraction and Markdown conversion"
    }
}

#[async_trait]
impl FormatParser for HtmlParser {
    async fn parse_file(&self, path: &Path, options: &ParseOptions) -> Result<Document> {
        let mut warnings = Vec::new();
        validate_input_file(path, &["html", "htm", "xhtml"], &mut warnings)?;

        let bytes = read_bytes(path)?;
        let html = String::from_utf8_lossy(&bytes).into_owned();

        let mut document = self.build_document(&html, None, None, options).await?;
        document.processing_info.warnings.splice(0..0, warnings);
        document.metadata.file_size = bytes.len() as u64;
        Ok(document)
    }

    fn extensions(&self) -> &[&str] {
        &[".html", ".htm", ".xhtml"]
    }

    fn priority(&self) -> i32 {
        50
    }
}
