//! Parse options shared by every pipeline.
//!
//! One flat options struct is passed through the dispatcher verbatim; each
//! pipeline reads the knobs it cares about and ignores the rest. Unknown keys
//! in a deserialized options object are collected into `extra` and ignored
//! rather than rejected.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default User-Agent for HTML fetches.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; omniparse/0.3; +https://github.com/omniparse-dev/omniparse)";

/// Options recognized by the parsing pipelines. Unknown options are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    // ---- shared ----
    /// Emit [`crate::ImageReference`]s.
    pub extract_images: bool,
    /// Persistent image destination. When `None`, EPUB/PDF pipelines skip
    /// image extraction entirely rather than emit dangling temp paths.
    pub image_output_dir: Option<PathBuf>,
    /// Run the text cleaner over content and chapters.
    pub clean_text: bool,
    /// Enable chapter extraction.
    pub detect_chapters: bool,
    /// Drop chapters with fewer words (EPUB defaults to 100, plain text
    /// to 50 when unset).
    pub min_chapter_length: Option<usize>,
    /// Heading-level band for chapter detection. Unset fields take the
    /// pipeline default: 1..2 everywhere except PDF, which allows 1..3.
    pub min_chapter_level: Option<u8>,
    pub max_chapter_level: Option<u8>,

    // ---- EPUB ----
    pub use_toc: bool,
    pub use_spine_fallback: bool,

    // ---- PDF ----
    pub use_ocr: bool,
    pub ocr_language: String,
    /// Wall-clock OCR timeout in seconds.
    pub ocr_timeout: u64,
    pub ocr_dpi: u32,
    pub max_pages: Option<usize>,
    pub extract_tables: bool,
    /// Inject `--- Page N ---` markers between pages.
    pub include_page_markers: bool,
    /// Scanned-page decision threshold: average chars/page below this means
    /// the text layer is unusable.
    pub min_chars_per_page: usize,
    /// Maximum token count for a font-statistics heading candidate.
    pub max_heading_words: usize,
    /// Scan rendered pages for QR codes (requires the `qr` feature).
    pub detect_qr_codes: bool,

    // ---- HTML ----
    /// HTTP timeout in seconds.
    pub timeout: u64,
    /// Minimum delay between requests sharing one fetcher, in seconds.
    pub rate_limit_delay: f64,
    pub user_agent: String,
    /// Bounded worker count for parallel image downloads.
    pub max_image_workers: usize,
    /// Keep `[text](href)` links when converting HTML to Markdown.
    pub preserve_links: bool,
    /// Keep `![alt](src)` images when converting HTML to Markdown.
    pub preserve_images: bool,

    // ---- DOCX ----
    pub extract_lists: bool,
    pub extract_hyperlinks: bool,

    // ---- Markdown ----
    pub extract_frontmatter: bool,
    pub normalize_headings: bool,

    // ---- plain text ----
    pub auto_detect_encoding: bool,
    /// Force a specific encoding instead of detecting one.
    pub encoding: Option<String>,

    /// Unrecognized options, preserved but never interpreted.
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            extract_images: true,
            image_output_dir: None,
            clean_text: true,
            detect_chapters: true,
            min_chapter_length: None,
            min_chapter_level: None,
            max_chapter_level: None,
            use_toc: true,
            use_spine_fallback: true,
            use_ocr: true,
            ocr_language: "eng".to_string(),
            ocr_timeout: 300,
            ocr_dpi: 300,
            max_pages: None,
            extract_tables: true,
            include_page_markers: false,
            min_chars_per_page: 100,
            max_heading_words: 25,
            detect_qr_codes: false,
            timeout: 10,
            rate_limit_delay: 0.0,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_image_workers: 5,
            preserve_links: true,
            preserve_images: true,
            extract_lists: true,
            extract_hyperlinks: true,
            extract_frontmatter: true,
            normalize_headings: true,
            auto_detect_encoding: true,
            encoding: None,
            extra: IndexMap::new(),
        }
    }
}

impl ParseOptions {
    /// Effective minimum chapter length for a pipeline default.
    pub fn min_chapter_length_or(&self, pipeline_default: usize) -> usize {
        self.min_chapter_length.unwrap_or(pipeline_default)
    }

    /// Effective heading-level band for a pipeline default.
    pub fn chapter_level_band(&self, default_min: u8, default_max: u8) -> (u8, u8) {
        (
            self.min_chapter_level.unwrap_or(default_min),
            self.max_chapter_level.unwrap_or(default_max),
        )
    }

    /// Snapshot of the effective options for `ProcessingInfo::options_used`.
    pub fn as_record(&self) -> IndexMap<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map.into_iter().collect(),
            _ => IndexMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_table() {
        let opts = ParseOptions::default();
        assert!(opts.extract_images);
        assert!(opts.image_output_dir.is_none());
        assert!(opts.clean_text);
        assert!(opts.detect_chapters);
        assert_eq!(opts.chapter_level_band(1, 2), (1, 2));
        assert_eq!(opts.chapter_level_band(1, 3), (1, 3));
        assert!(opts.use_toc);
        assert!(opts.use_spine_fallback);
        assert_eq!(opts.ocr_language, "eng");
        assert_eq!(opts.ocr_timeout, 300);
        assert_eq!(opts.ocr_dpi, 300);
        assert!(opts.extract_tables);
        assert_eq!(opts.timeout, 10);
        assert_eq!(opts.rate_limit_delay, 0.0);
        assert_eq!(opts.max_image_workers, 5);
        assert!(opts.extract_frontmatter);
        assert!(opts.normalize_headings);
        assert!(opts.auto_detect_encoding);
        assert!(opts.encoding.is_none());
    }

    #[test]
    fn test_unknown_options_are_ignored_not_rejected() {
        let opts: ParseOptions = serde_json::from_str(
            r#"{"clean_text": false, "some_future_option": 42, "another": "x"}"#,
        )
        .unwrap();
        assert!(!opts.clean_text);
        assert_eq!(opts.extra.len(), 2);
        assert_eq!(opts.extra["some_future_option"], serde_json::json!(42));
    }

    #[test]
    fn test_min_chapter_length_pipeline_defaults() {
        let opts = ParseOptions::default();
        assert_eq!(opts.min_chapter_length_or(100), 100);
        assert_eq!(opts.min_chapter_length_or(50), 50);

        let opts = ParseOptions {
            min_chapter_length: Some(10),
            ..Default::default()
        };
        assert_eq!(opts.min_chapter_length_or(100), 10);
    }

    #[test]
    fn test_explicit_level_band_overrides_pipeline_default() {
        let opts = ParseOptions {
            min_chapter_level: Some(2),
            max_chapter_level: Some(4),
            ..Default::default()
        };
        assert_eq!(opts.chapter_level_band(1, 3), (2, 4));
    }

    #[test]
    fn test_options_record_is_a_json_object() {
        let record = ParseOptions::default().as_record();
        assert!(record.contains_key("extract_images"));
        assert!(record.contains_key("ocr_language"));
    }
}
