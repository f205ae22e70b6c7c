//! DOCX pipeline: OOXML body traversal to Markdown, core-properties
//! metadata, and relationship-based images.
//!
//! The pipeline emits `chapters = []` by design: DOCX has no explicit
//! chapter structure, and callers that want chapters run the shared Markdown
//! chapter detector over the emitted content.

mod content;
mod images;
mod metadata;

pub use content::{ContentOptions, extract_content, parse_image_relationships, parse_numbering, parse_relationships};
pub use metadata::{CoreProperties, metadata_from_core_properties, parse_core_properties};

use crate::core::config::ParseOptions;
use crate::core::io::{read_bytes, validate_input_file};
use crate::plugins::{FormatParser, Plugin};
use crate::text::string_utils::{estimate_reading_time, markdown_word_count};
use crate::types::{Document, Metadata, ProcessingInfo};
use crate::{OmniparseError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;
use zip::ZipArchive;

const WORDS_PER_MINUTE: u32 = 225;

/// DOCX format parser.
pub struct DocxParser;

impl DocxParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocxParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for DocxParser {
    fn name(&self) -> &str {
        "docx"
    }

    fn description(&self) -> &str {
        "Parses DOCX documents with style-aware Markdown conversion, tables, and core properties"
    }
}

fn read_zip_entry<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Option<String> {
    let mut entry = archive.by_name(name).ok()?;
    let mut content = String::new();
    entry.read_to_string(&mut content).ok()?;
    Some(content)
}

#[async_trait]
impl FormatParser for DocxParser {
    async fn parse_file(&self, path: &Path, options: &ParseOptions) -> Result<Document> {
        let mut warnings = Vec::new();
        let file_size = validate_input_file(path, &["docx"], &mut warnings)?;

        let bytes = read_bytes(path)?;
        let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| {
            OmniparseError::parsing_with_source("Failed to open DOCX as ZIP", "docx", e)
        })?;

        let document_xml = read_zip_entry(&mut archive, "word/document.xml").ok_or_else(|| {
            OmniparseError::parsing("DOCX has no word/document.xml", "docx")
        })?;

        let relationships = read_zip_entry(&mut archive, "word/_rels/document.xml.rels")
            .map(|xml| parse_relationships(&xml))
            .unwrap_or_default();
        let image_targets = read_zip_entry(&mut archive, "word/_rels/document.xml.rels")
            .map(|xml| parse_image_relationships(&xml))
            .unwrap_or_default();
        let ordered_lists: HashMap<String, bool> =
            read_zip_entry(&mut archive, "word/numbering.xml")
                .map(|xml| parse_numbering(&xml))
                .unwrap_or_default();

        let doc_metadata: Metadata = match read_zip_entry(&mut archive, "docProps/core.xml") {
            Some(xml) => metadata_from_core_properties(parse_core_properties(&xml), file_size),
            None => {
                warnings.push("DOCX has no docProps/core.xml".to_string());
                let mut metadata = Metadata::new("docx");
                metadata.file_size = file_size;
                metadata
            }
        };

        let content_options = ContentOptions {
            extract_tables: options.extract_tables,
            extract_lists: options.extract_lists,
            extract_hyperlinks: options.extract_hyperlinks,
        };
        let markdown = extract_content(&document_xml, &relationships, &ordered_lists, &content_options);

        let image_references = match (&options.extract_images, &options.image_output_dir) {
            (true, Some(dir)) => {
                let base_name = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "docx".to_string());
                images::extract_images(&mut archive, &image_targets, dir, &base_name, &mut warnings)
            }
            _ => Vec::new(),
        };

        let mut processing_info = ProcessingInfo::new(self.name(), self.version());
        processing_info.warnings = warnings;
        processing_info.options_used = options.as_record();

        let words = markdown_word_count(&markdown);
        let mut document = Document::new(doc_metadata, processing_info);
        document.content = markdown;
        document.images = image_references;
        document.word_count = words;
        document.estimated_reading_time = estimate_reading_time(words, WORDS_PER_MINUTE);
        Ok(document)
    }

    fn extensions(&self) -> &[&str] {
        &[".docx"]
    }

    fn supports(&self, path: &Path) -> bool {
        crate::core::format::detect_format_from_file(path) == Some("docx")
    }

    fn priority(&self) -> i32 {
        50
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Minimal DOCX on disk: two Heading 1 paragraphs with a table between.
    fn build_docx(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("report.docx");
        let file = std::fs::File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let stored = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);

        zip.start_file("[Content_Types].xml", stored).unwrap();
        zip.write_all(
            br#"<?xml version="1.0"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="xml" ContentType="application/xml"/>
</Types>"#,
        )
        .unwrap();

        zip.start_file("docProps/core.xml", stored).unwrap();
        zip.write_all(
            br#"<?xml version="1.0"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties"
                   xmlns:dc="http://purl.org/dc/elements/1.1/"
                   xmlns:dcterms="http://purl.org/dc/terms/">
  <dc:title>Doc Title</dc:title>
  <dc:creator>Doc Author</dc:creator>
  <cp:keywords>one;two</cp:keywords>
  <dcterms:created>2024-01-15T10:00:00Z</dcterms:created>
</cp:coreProperties>"#,
        )
        .unwrap();

        zip.start_file("word/document.xml", stored).unwrap();
        zip.write_all(
            br#"<?xml version="1.0"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Introduction</w:t></w:r></w:p>
    <w:p><w:r><w:t>Opening </w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>remarks</w:t></w:r></w:p>
    <w:tbl>
      <w:tr><w:tc><w:p><w:r><w:t>K</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>V</w:t></w:r></w:p></w:tc></w:tr>
      <w:tr><w:tc><w:p><w:r><w:t>a</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>1</w:t></w:r></w:p></w:tc></w:tr>
    </w:tbl>
    <w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Conclusion</w:t></w:r></w:p>
  </w:body>
</w:document>"#,
        )
        .unwrap();

        zip.finish().unwrap();
        path
    }

    #[tokio::test]
    async fn test_headings_table_and_empty_chapters() {
        let dir = tempfile::tempdir().unwrap();
        let path = build_docx(dir.path());
        let doc = DocxParser::new()
            .parse_file(&path, &ParseOptions::default())
            .await
            .unwrap();

        assert!(doc.content.contains("# Introduction"));
        assert!(doc.content.contains("# Conclusion"));
        assert!(doc.content.contains("| K | V |"));
        assert!(doc.content.contains("| --- | --- |"));
        assert!(doc.content.contains("**remarks**"));

        // Table sits between the two headings.
        let intro = doc.content.find("# Introduction").unwrap();
        let table = doc.content.find("| K | V |").unwrap();
        let conclusion = doc.content.find("# Conclusion").unwrap();
        assert!(intro < table && table < conclusion);

        // The DOCX pipeline itself does not materialize chapters.
        assert!(doc.chapters.is_empty());

        assert_eq!(doc.metadata.title.as_deref(), Some("Doc Title"));
        assert_eq!(doc.metadata.author.as_deref(), Some("Doc Author"));
        assert_eq!(doc.metadata.tags, vec!["one", "two"]);
        assert_eq!(doc.estimated_reading_time, 1);
        assert!(doc.word_count > 0);
    }

    #[tokio::test]
    async fn test_tables_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let path = build_docx(dir.path());
        let options = ParseOptions {
            extract_tables: false,
            ..Default::default()
        };
        let doc = DocxParser::new().parse_file(&path, &options).await.unwrap();
        assert!(!doc.content.contains("| K | V |"));
        assert!(doc.content.contains("# Introduction"));
    }

    #[tokio::test]
    async fn test_not_a_zip_is_parsing_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.docx");
        std::fs::write(&path, b"not a zip").unwrap();
        let err = DocxParser::new()
            .parse_file(&path, &ParseOptions::default())
            .await
            .unwrap_err();
        match err {
            OmniparseError::Parsing { parser, .. } => assert_eq!(parser, "docx"),
            other => panic!("expected Parsing, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wrong_extension_is_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, b"hello").unwrap();
        let err = DocxParser::new()
            .parse_file(&path, &ParseOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, OmniparseError::Validation { .. }));
    }
}
