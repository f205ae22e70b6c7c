//! HTML pipeline end-to-end (file-based; URL fetching is covered by the
//! fetcher's own tests).

#![cfg(feature = "html")]

use omniparse::{OmniparseError, ParseOptions, parse_document};

fn write_html(dir: &tempfile::TempDir, html: &str) -> String {
    let path = dir.path().join("page.html");
    std::fs::write(&path, html).unwrap();
    path.to_string_lossy().into_owned()
}

#[tokio::test]
async fn test_metadata_priority_and_content() {
    let dir = tempfile::tempdir().unwrap();
    let body = "Body. ".repeat(30);
    let source = write_html(
        &dir,
        &format!(
            r#"<html lang="en"><head><meta property="og:title" content="OG"><meta property="og:article:tag" content="a"><meta property="og:article:tag" content="b"><title>Title</title></head><body><h1>H</h1><p>{}</p></body></html>"#,
            body
        ),
    );

    let doc = parse_document(&source, &ParseOptions::default()).await.unwrap();

    assert_eq!(doc.metadata.title.as_deref(), Some("OG"));
    assert_eq!(doc.metadata.tags, vec!["a", "b"]);
    assert_eq!(doc.metadata.language.as_deref(), Some("en"));
    assert_eq!(doc.metadata.original_format, "html");
    assert!(doc.content.contains("# H"));
    assert!(doc.content.contains("Body."));
    assert!(!doc.chapters.is_empty());
}

#[tokio::test]
async fn test_insufficient_content_is_parsing_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_html(&dir, "<html><body><p>x</p></body></html>");
    let err = parse_document(&source, &ParseOptions::default()).await.unwrap_err();
    match err {
        OmniparseError::Parsing { parser, .. } => assert_eq!(parser, "html"),
        other => panic!("expected Parsing, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fallback_path_recorded_in_warnings() {
    let dir = tempfile::tempdir().unwrap();
    // No semantic containers: primary fails, fallback succeeds.
    let body = "All the words of the piece live in a plain div here. ".repeat(5);
    let source = write_html(
        &dir,
        &format!("<html><body><div><p>{}</p></div></body></html>", body),
    );

    let doc = parse_document(&source, &ParseOptions::default()).await.unwrap();
    assert!(
        doc.processing_info
            .warnings
            .iter()
            .any(|w| w.contains("fallback"))
    );
    assert!(doc.content.contains("All the words"));
}

#[tokio::test]
async fn test_tables_preserved_in_markdown() {
    let dir = tempfile::tempdir().unwrap();
    let body = "Context paragraph text. ".repeat(10);
    let source = write_html(
        &dir,
        &format!(
            "<html><body><article><p>{}</p><table><tr><th>K</th><th>V</th></tr><tr><td>a</td><td>1</td></tr></table></article></body></html>",
            body
        ),
    );

    let doc = parse_document(&source, &ParseOptions::default()).await.unwrap();
    assert!(doc.content.contains("| K | V |"));
    assert!(doc.content.contains("| --- | --- |"));
}
