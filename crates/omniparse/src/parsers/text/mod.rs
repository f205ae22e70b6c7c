//! Plain-text pipeline: encoding detection, marker-based chapters.

mod chapters;

pub use chapters::detect_text_chapters;

use crate::core::config::ParseOptions;
use crate::core::io::{read_bytes, validate_input_file};
use crate::plugins::{FormatParser, Plugin};
use crate::processors::text_cleaner;
use crate::text::encoding::{DecodedWith, decode_bytes};
use crate::text::string_utils::{estimate_reading_time, word_count};
use crate::types::{Document, Metadata, ProcessingInfo};
use crate::Result;
use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

const WORDS_PER_MINUTE: u32 = 200;
const DEFAULT_MIN_CHAPTER_LENGTH: usize = 50;

/// Plain-text format parser.
pub struct TextParser;

impl TextParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for TextParser {
    fn name(&self) -> &str {
        "text"
    }

    fn description(&self) -> &str {
        "Parses plain text files with encoding detection and pattern-based chapter markers"
    }
}

#[async_trait]
impl FormatParser for TextParser {
    async fn parse_file(&self, path: &Path, options: &ParseOptions) -> Result<Document> {
        let mut warnings = Vec::new();
        let file_size = validate_input_file(path, &["txt", "text"], &mut warnings)?;

        let bytes = read_bytes(path)?;
        let forced = if options.auto_detect_encoding {
            options.encoding.as_deref()
        } else {
            options.encoding.as_deref().or(Some("utf-8"))
        };
        let (raw_content, decoded_with) = decode_bytes(&bytes, forced);
        if decoded_with != DecodedWith::Utf8 {
            warnings.push(format!("Decoded with {}", decoded_with.describe()));
        }
        debug!(encoding = %decoded_with.describe(), "Decoded text file");

        let content = if options.clean_text {
            text_cleaner::clean_text(&raw_content)
        } else {
            raw_content
        };

        let mut chapters = if options.detect_chapters {
            detect_text_chapters(&content, path)
        } else {
            Vec::new()
        };

        // Drop short pattern-detected chapters; a lone single_chapter stays.
        if chapters.len() > 1 {
            let min_length = options.min_chapter_length_or(DEFAULT_MIN_CHAPTER_LENGTH);
            let before = chapters.len();
            chapters.retain(|chapter| {
                if chapter.word_count < min_length {
                    warnings.push(format!(
                        "Filtered short chapter: '{}' ({} words)",
                        chapter.title, chapter.word_count
                    ));
                    false
                } else {
                    true
                }
            });
            if chapters.len() != before {
                for (idx, chapter) in chapters.iter_mut().enumerate() {
                    chapter.chapter_id = idx + 1;
                }
            }
        }

        let mut metadata = Metadata::new("text");
        metadata.file_size = file_size;
        metadata.title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned());
        metadata.custom_fields.insert(
            "encoding_info".to_string(),
            serde_json::json!(decoded_with.describe()),
        );

        let mut processing_info = ProcessingInfo::new(self.name(), self.version());
        processing_info.warnings = warnings;
        processing_info.options_used = options.as_record();

        let words = word_count(&content);
        let mut document = Document::new(metadata, processing_info);
        document.content = content;
        document.chapters = chapters;
        document.word_count = words;
        document.estimated_reading_time = estimate_reading_time(words, WORDS_PER_MINUTE);
        Ok(document)
    }

    fn extensions(&self) -> &[&str] {
        &[".txt", ".text"]
    }

    fn priority(&self) -> i32 {
        50
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OmniparseError;

    fn write_temp(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("story.txt");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn test_basic_parse_with_chapters() {
        let (_dir, path) = write_temp("Chapter 1\n\na b c d e\n\nChapter 2\n\nf g h\n");
        let options = ParseOptions {
            min_chapter_length: Some(0),
            ..Default::default()
        };
        let doc = TextParser::new().parse_file(&path, &options).await.unwrap();

        assert_eq!(doc.chapters.len(), 2);
        assert_eq!(doc.chapters[0].title, "Chapter 1");
        assert_eq!(doc.chapters[1].title, "Chapter 2");
        assert_eq!(doc.metadata.original_format, "text");
        assert_eq!(doc.estimated_reading_time, 1);
        assert!(doc.word_count >= 8);
    }

    #[tokio::test]
    async fn test_whitespace_only_file_single_chapter() {
        let (_dir, path) = write_temp("   \n\n   \n");
        let doc = TextParser::new()
            .parse_file(&path, &ParseOptions::default())
            .await
            .unwrap();
        // Cleaning strips it to nothing: no chapters, reading time floor.
        assert_eq!(doc.word_count, 0);
        assert_eq!(doc.estimated_reading_time, 1);
    }

    #[tokio::test]
    async fn test_empty_file_is_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::File::create(&path).unwrap();
        let err = TextParser::new()
            .parse_file(&path, &ParseOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, OmniparseError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_latin1_bytes_recorded_in_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin.txt");
        std::fs::write(&path, [b'c', b'a', b'f', 0xE9, b'\n']).unwrap();
        let doc = TextParser::new()
            .parse_file(&path, &ParseOptions::default())
            .await
            .unwrap();
        assert!(
            doc.processing_info
                .warnings
                .iter()
                .any(|w| w.contains("Decoded with"))
        );
    }

    #[tokio::test]
    async fn test_short_chapters_filtered_and_renumbered() {
        let body = "Chapter 1\n\n".to_string()
            + &"word ".repeat(60)
            + "\n\nChapter 2\n\ntiny\n\nChapter 3\n\n"
            + &"word ".repeat(55);
        let (_dir, path) = write_temp(&body);
        let doc = TextParser::new()
            .parse_file(&path, &ParseOptions::default())
            .await
            .unwrap();

        assert_eq!(doc.chapters.len(), 2);
        assert_eq!(doc.chapters[0].title, "Chapter 1");
        assert_eq!(doc.chapters[1].title, "Chapter 3");
        assert_eq!(doc.chapters[1].chapter_id, 2);
        assert!(
            doc.processing_info
                .warnings
                .iter()
                .any(|w| w.contains("Filtered short chapter"))
        );
    }

    #[tokio::test]
    async fn test_detect_chapters_disabled() {
        let (_dir, path) = write_temp("Chapter 1\n\nbody\n\nChapter 2\n\nbody\n");
        let options = ParseOptions {
            detect_chapters: false,
            ..Default::default()
        };
        let doc = TextParser::new().parse_file(&path, &options).await.unwrap();
        assert!(doc.chapters.is_empty());
    }
}
