//! DOCX pipeline end-to-end against generated fixtures.

#![cfg(feature = "office")]

use omniparse::processors::chapter_detector::detect_chapters;
use omniparse::{ParseOptions, parse_document};
use std::io::Write;
use std::path::{Path, PathBuf};

fn build_docx(dir: &Path) -> PathBuf {
    let path = dir.join("fixture.docx");
    let file = std::fs::File::create(&path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let stored =
        zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

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
  <dc:title>Fixture Report</dc:title>
  <dc:creator>Fixture Author</dc:creator>
  <cp:keywords>alpha; beta</cp:keywords>
  <dcterms:created>2024-03-01T09:00:00Z</dcterms:created>
</cp:coreProperties>"#,
    )
    .unwrap();

    zip.start_file("word/_rels/document.xml.rels", stored).unwrap();
    zip.write_all(
        br#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/more" TargetMode="External"/>
</Relationships>"#,
    )
    .unwrap();

    zip.start_file("word/document.xml", stored).unwrap();
    zip.write_all(
        br#"<?xml version="1.0"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"
            xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <w:body>
    <w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Overview</w:t></w:r></w:p>
    <w:p><w:r><w:t>Plain text with a </w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>bold run</w:t></w:r><w:r><w:t> inside.</w:t></w:r></w:p>
    <w:tbl>
      <w:tr><w:tc><w:p><w:r><w:t>Metric</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>Value</w:t></w:r></w:p></w:tc></w:tr>
      <w:tr><w:tc><w:p><w:r><w:t>Uptime</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>99.9</w:t></w:r></w:p></w:tc></w:tr>
    </w:tbl>
    <w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Details</w:t></w:r></w:p>
    <w:p><w:hyperlink r:id="rId1"><w:r><w:t>read more</w:t></w:r></w:hyperlink></w:p>
  </w:body>
</w:document>"#,
    )
    .unwrap();

    zip.finish().unwrap();
    path
}

#[tokio::test]
async fn test_docx_to_markdown_shape() {
    let dir = tempfile::tempdir().unwrap();
    let source = build_docx(dir.path());
    let doc = parse_document(source.to_str().unwrap(), &ParseOptions::default())
        .await
        .unwrap();

    // Two headings with a pipe table between them.
    let overview = doc.content.find("# Overview").unwrap();
    let table = doc.content.find("| Metric | Value |").unwrap();
    let details = doc.content.find("# Details").unwrap();
    assert!(overview < table && table < details);
    assert!(doc.content.contains("| --- | --- |"));
    assert!(doc.content.contains("**bold run**"));
    assert!(doc.content.contains("[read more](https://example.com/more)"));

    // Chapters are empty at the DOCX pipeline boundary.
    assert!(doc.chapters.is_empty());

    assert_eq!(doc.metadata.title.as_deref(), Some("Fixture Report"));
    assert_eq!(doc.metadata.author.as_deref(), Some("Fixture Author"));
    assert_eq!(doc.metadata.tags, vec!["alpha", "beta"]);
    assert!(doc.metadata.publication_date.is_some());
}

#[tokio::test]
async fn test_callers_detect_chapters_from_emitted_markdown() {
    let dir = tempfile::tempdir().unwrap();
    let source = build_docx(dir.path());
    let doc = parse_document(source.to_str().unwrap(), &ParseOptions::default())
        .await
        .unwrap();

    // The documented pattern: run the shared detector over the content.
    let chapters = detect_chapters(&doc.content, 1, 2);
    assert_eq!(chapters.len(), 2);
    assert_eq!(chapters[0].title, "Overview");
    assert_eq!(chapters[1].title, "Details");
}
