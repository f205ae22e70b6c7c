//! HTML metadata extraction with priority resolution.
//!
//! Merges OpenGraph, Dublin Core, and standard meta tags plus the `<title>`
//! element into a [`Metadata`]. Per field, the first non-empty source wins in
//! the order OG → DC → standard → `<title>`; `publisher` comes from Dublin
//! Core only and `language` from `<html lang>`.

use crate::types::Metadata;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

static META_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("meta").expect("valid selector"));
static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("title").expect("valid selector"));
static HTML_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("html").expect("valid selector"));

/// Meta tag values collected in one pass over the document.
#[derive(Debug, Default)]
struct MetaTags {
    /// `property` attribute → contents, repeats preserved in order.
    properties: Vec<(String, String)>,
    /// `name` attribute → contents.
    names: Vec<(String, String)>,
}

impl MetaTags {
    fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, v)| k.eq_ignore_ascii_case(key) && !v.trim().is_empty())
            .map(|(_, v)| v.trim())
    }

    fn properties_all(&self, key: &str) -> Vec<String> {
        self.properties
            .iter()
            .filter(|(k, v)| k.eq_ignore_ascii_case(key) && !v.trim().is_empty())
            .map(|(_, v)| v.trim().to_string())
            .collect()
    }

    fn name(&self, key: &str) -> Option<&str> {
        self.names
            .iter()
            .find(|(k, v)| k.eq_ignore_ascii_case(key) && !v.trim().is_empty())
            .map(|(_, v)| v.trim())
    }
}

/// Extract document metadata from raw HTML.
///
/// `source_url` is recorded in `custom_fields.url` when given. The *original*
/// HTML should be passed here, not a content-extracted subset, so meta tags
/// are still present.
pub fn extract_html_metadata(html: &str, source_url: Option<&str>) -> Metadata {
    let document = Html::parse_document(html);
    let tags = collect_meta_tags(&document);

    let mut metadata = Metadata::new("html");

    // Title: OG -> DC -> <title>.
    metadata.title = tags
        .property("og:title")
        .or_else(|| tags.name("DC.title"))
        .map(str::to_string)
        .or_else(|| {
            document
                .select(&TITLE_SELECTOR)
                .next()
                .map(|t| t.text().collect::<String>().trim().to_string())
                .filter(|t| !t.is_empty())
        });

    // Author: OG article author -> DC creator -> standard author meta.
    let author = tags
        .property("og:article:author")
        .or_else(|| tags.property("article:author"))
        .or_else(|| tags.name("DC.creator"))
        .or_else(|| tags.name("author"))
        .map(str::to_string);
    if let Some(author) = author {
        metadata = metadata.with_author(author);
    }

    // Description: OG -> DC -> standard.
    metadata.description = tags
        .property("og:description")
        .or_else(|| tags.name("DC.description"))
        .or_else(|| tags.name("description"))
        .map(str::to_string);

    // Publisher: Dublin Core only.
    metadata.publisher = tags.name("DC.publisher").map(str::to_string);

    // Tags: first non-empty list among OG article tags, DC.subject, keywords.
    let og_tags = tags.properties_all("og:article:tag");
    metadata.tags = if !og_tags.is_empty() {
        og_tags
    } else if let Some(subject) = tags.name("DC.subject") {
        split_tag_list(subject)
    } else if let Some(keywords) = tags.name("keywords") {
        split_tag_list(keywords)
    } else {
        Vec::new()
    };

    // Publication date: OG article time -> DC.date, ISO-8601 tolerant to Z.
    metadata.publication_date = tags
        .property("og:article:published_time")
        .or_else(|| tags.property("article:published_time"))
        .or_else(|| tags.name("DC.date"))
        .and_then(parse_publication_date);

    // Language from <html lang>.
    metadata.language = document
        .select(&HTML_SELECTOR)
        .next()
        .and_then(|html_el| html_el.value().attr("lang"))
        .map(|lang| lang.trim().to_string())
        .filter(|lang| !lang.is_empty());

    if let Some(og_image) = tags.property("og:image") {
        metadata
            .custom_fields
            .insert("og_image".to_string(), serde_json::json!(og_image));
    }
    if let Some(url) = source_url {
        metadata
            .custom_fields
            .insert("url".to_string(), serde_json::json!(url));
    }

    metadata
}

fn collect_meta_tags(document: &Html) -> MetaTags {
    let mut tags = MetaTags::default();
    for meta in document.select(&META_SELECTOR) {
        let Some(content) = meta.value().attr("content") else {
            continue;
        };
        if let Some(property) = meta.value().attr("property") {
            tags.properties.push((property.to_string(), content.to_string()));
        }
        if let Some(name) = meta.value().attr("name") {
            tags.names.push((name.to_string(), content.to_string()));
        }
    }
    tags
}

fn split_tag_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse an ISO-8601-ish date, tolerating `Z`, missing offsets, and bare dates.
pub fn parse_publication_date(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_og_beats_title_element() {
        let html = r#"<html><head>
            <meta property="og:title" content="OG Title">
            <title>Element Title</title>
        </head><body></body></html>"#;
        let metadata = extract_html_metadata(html, None);
        assert_eq!(metadata.title.as_deref(), Some("OG Title"));
    }

    #[test]
    fn test_dc_beats_title_element() {
        let html = r#"<html><head>
            <meta name="DC.title" content="DC Title">
            <title>Element Title</title>
        </head></html>"#;
        let metadata = extract_html_metadata(html, None);
        assert_eq!(metadata.title.as_deref(), Some("DC Title"));
    }

    #[test]
    fn test_title_element_fallback() {
        let html = "<html><head><title>Just a Title</title></head></html>";
        let metadata = extract_html_metadata(html, None);
        assert_eq!(metadata.title.as_deref(), Some("Just a Title"));
    }

    #[test]
    fn test_repeated_og_article_tags() {
        let html = r#"<html><head>
            <meta property="og:article:tag" content="a">
            <meta property="og:article:tag" content="b">
        </head></html>"#;
        let metadata = extract_html_metadata(html, None);
        assert_eq!(metadata.tags, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_keywords_fallback_comma_split() {
        let html = r#"<html><head>
            <meta name="keywords" content="rust, parsing , documents">
        </head></html>"#;
        let metadata = extract_html_metadata(html, None);
        assert_eq!(metadata.tags, vec!["rust", "parsing", "documents"]);
    }

    #[test]
    fn test_language_from_html_lang() {
        let html = r#"<html lang="en"><head></head><body></body></html>"#;
        let metadata = extract_html_metadata(html, None);
        assert_eq!(metadata.language.as_deref(), Some("en"));
    }

    #[test]
    fn test_publisher_is_dc_only() {
        let html = r#"<html><head>
            <meta name="publisher" content="Not This One">
            <meta name="DC.publisher" content="Actual Press">
        </head></html>"#;
        let metadata = extract_html_metadata(html, None);
        assert_eq!(metadata.publisher.as_deref(), Some("Actual Press"));
    }

    #[test]
    fn test_publication_date_tolerates_z() {
        let html = r#"<html><head>
            <meta property="og:article:published_time" content="2023-06-01T10:30:00Z">
        </head></html>"#;
        let metadata = extract_html_metadata(html, None);
        let date = metadata.publication_date.unwrap();
        assert_eq!(date.to_rfc3339(), "2023-06-01T10:30:00+00:00");
    }

    #[test]
    fn test_bare_date_parses() {
        assert!(parse_publication_date("2021-03-14").is_some());
        assert!(parse_publication_date("not a date").is_none());
    }

    #[test]
    fn test_url_and_og_image_in_custom_fields() {
        let html = r#"<html><head>
            <meta property="og:image" content="https://example.com/cover.jpg">
        </head></html>"#;
        let metadata = extract_html_metadata(html, Some("https://example.com/post"));
        assert_eq!(
            metadata.custom_fields["og_image"],
            serde_json::json!("https://example.com/cover.jpg")
        );
        assert_eq!(
            metadata.custom_fields["url"],
            serde_json::json!("https://example.com/post")
        );
        assert_eq!(metadata.original_format, "html");
    }

    #[test]
    fn test_author_mirrored_to_authors() {
        let html = r#"<html><head><meta name="author" content="Jo Writer"></head></html>"#;
        let metadata = extract_html_metadata(html, None);
        assert_eq!(metadata.author.as_deref(), Some("Jo Writer"));
        assert_eq!(metadata.authors, vec!["Jo Writer".to_string()]);
    }
}
