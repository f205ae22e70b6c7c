//! Markdown pipeline: frontmatter, heading normalization, chapters, and
//! image references.

mod frontmatter;
mod images;
mod normalize;

pub use frontmatter::{extract_frontmatter, metadata_from_frontmatter};
pub use images::extract_image_references;
pub use normalize::normalize_markdown;

use crate::core::config::ParseOptions;
use crate::core::io::{read_bytes, validate_input_file};
use crate::plugins::{FormatParser, Plugin};
use crate::processors::chapter_detector::detect_chapters;
use crate::text::encoding::{DecodedWith, decode_bytes};
use crate::text::string_utils::{estimate_reading_time, markdown_word_count};
use crate::types::{Document, Metadata, ProcessingInfo};
use crate::Result;
use async_trait::async_trait;
use std::path::Path;

const WORDS_PER_MINUTE: u32 = 200;

/// Markdown format parser.
pub struct MarkdownParser;

impl MarkdownParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for MarkdownParser {
    fn name(&self) -> &str {
        "markdown"
    }

    fn description(&self) -> &str {
        "Parses Markdown files with YAML/TOML/JSON frontmatter, heading normalization, and image references"
    }
}

#[async_trait]
impl FormatParser for MarkdownParser {
    async fn parse_file(&self, path: &Path, options: &ParseOptions) -> Result<Document> {
        let mut warnings = Vec::new();
        let file_size = validate_input_file(path, &["md", "markdown", "mdown"], &mut warnings)?;

        let bytes = read_bytes(path)?;
        let (raw_content, decoded_with) = decode_bytes(&bytes, None);
        if decoded_with != DecodedWith::Utf8 {
            warnings.push(format!("Decoded with {}", decoded_with.describe()));
        }

        let (frontmatter_map, body) = if options.extract_frontmatter {
            extract_frontmatter(&raw_content, &mut warnings)
        } else {
            (None, raw_content)
        };

        let mut metadata = match frontmatter_map {
            Some(map) => metadata_from_frontmatter(map, &mut warnings),
            None => Metadata::new("markdown"),
        };
        metadata.file_size = file_size;

        let content = if options.normalize_headings {
            normalize_markdown(&body)
        } else {
            body
        };

        let chapters = if options.detect_chapters {
            let (min_level, max_level) = options.chapter_level_band(1, 2);
            detect_chapters(&content, min_level, max_level)
        } else {
            Vec::new()
        };

        let images = if options.extract_images {
            extract_image_references(&content, path.parent())
        } else {
            Vec::new()
        };

        let mut processing_info = ProcessingInfo::new(self.name(), self.version());
        processing_info.warnings = warnings;
        processing_info.options_used = options.as_record();

        let words = markdown_word_count(&content);
        let mut document = Document::new(metadata, processing_info);
        document.content = content;
        document.chapters = chapters;
        document.images = images;
        document.word_count = words;
        document.estimated_reading_time = estimate_reading_time(words, WORDS_PER_MINUTE);
        Ok(document)
    }

    fn extensions(&self) -> &[&str] {
        &[".md", ".markdown", ".mdown"]
    }

    fn priority(&self) -> i32 {
        50
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn test_frontmatter_and_chapters() {
        let md = "---\ntitle: T\nauthor: A\ntags: [x, y]\n---\n\n# One\n\nhello world\n\n## One.a\n\nmore\n\n# Two\n\nend.\n";
        let (_dir, path) = write_temp(md);
        let doc = MarkdownParser::new()
            .parse_file(&path, &ParseOptions::default())
            .await
            .unwrap();

        assert_eq!(doc.metadata.title.as_deref(), Some("T"));
        assert_eq!(doc.metadata.author.as_deref(), Some("A"));
        assert_eq!(doc.metadata.tags, vec!["x", "y"]);

        // Band [1,2]: both # and ## headings open chapters.
        let titles: Vec<&str> = doc.chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["One", "One.a", "Two"]);
        assert_eq!(doc.estimated_reading_time, 1);
    }

    #[tokio::test]
    async fn test_level_band_excludes_subheadings() {
        let md = "# One\n\nhello\n\n## Sub\n\nmore\n\n# Two\n\nend\n";
        let (_dir, path) = write_temp(md);
        let options = ParseOptions {
            max_chapter_level: Some(1),
            ..Default::default()
        };
        let doc = MarkdownParser::new().parse_file(&path, &options).await.unwrap();
        assert_eq!(doc.chapters.len(), 2);
        assert_eq!(doc.chapters[0].title, "One");
        assert!(doc.chapters[0].content.contains("Sub"));
    }

    #[tokio::test]
    async fn test_setext_normalization_applied() {
        let md = "Title\n=====\n\nbody text\n";
        let (_dir, path) = write_temp(md);
        let doc = MarkdownParser::new()
            .parse_file(&path, &ParseOptions::default())
            .await
            .unwrap();
        assert!(doc.content.starts_with("# Title"));
        assert_eq!(doc.chapters.len(), 1);
        assert_eq!(doc.chapters[0].title, "Title");
    }

    #[tokio::test]
    async fn test_images_extracted_and_resolved() {
        let md = "# Doc\n\n![pic](img/a.png)\n\n![ref][r]\n\n[r]: https://x.y/b.jpg\n";
        let (dir, path) = write_temp(md);
        let doc = MarkdownParser::new()
            .parse_file(&path, &ParseOptions::default())
            .await
            .unwrap();

        assert_eq!(doc.images.len(), 2);
        let expected = dir.path().join("img/a.png");
        assert_eq!(
            doc.images[0].file_path.as_deref(),
            Some(expected.to_str().unwrap())
        );
        assert_eq!(doc.images[1].file_path.as_deref(), Some("https://x.y/b.jpg"));
    }

    #[tokio::test]
    async fn test_frontmatter_disabled_leaves_fences() {
        let md = "---\ntitle: T\n---\n\n# Body\n";
        let (_dir, path) = write_temp(md);
        let options = ParseOptions {
            extract_frontmatter: false,
            ..Default::default()
        };
        let doc = MarkdownParser::new().parse_file(&path, &options).await.unwrap();
        assert!(doc.metadata.title.is_none());
        assert!(doc.content.contains("title: T"));
    }

    #[tokio::test]
    async fn test_word_count_is_markdown_aware() {
        let md = "# One\n\nhello world\n\n";
        let (_dir, path) = write_temp(md);
        let doc = MarkdownParser::new()
            .parse_file(&path, &ParseOptions::default())
            .await
            .unwrap();
        // "One", "hello", "world" — the hash marks are not words.
        assert_eq!(doc.word_count, 3);
    }
}
