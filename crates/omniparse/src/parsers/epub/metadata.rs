//! Dublin Core metadata extraction from the EPUB package document.

use crate::types::Metadata;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use epub::doc::EpubDoc;
use std::io::{Read, Seek};
use tracing::debug;

/// Extract document metadata from an opened EPUB.
pub fn extract_metadata<R: Read + Seek>(
    doc: &EpubDoc<R>,
    file_size: u64,
    warnings: &mut Vec<String>,
) -> Metadata {
    let mut metadata = Metadata::new("epub");
    metadata.file_size = file_size;

    metadata.title = doc.mdata("title").map(|m| m.value.clone());

    let creators: Vec<String> = doc
        .metadata
        .iter()
        .filter(|n| n.property == "creator")
        .map(|n| n.value.clone())
        .collect();
    if let Some(first) = creators.first() {
        metadata.author = Some(first.clone());
    }
    metadata.authors = creators;

    metadata.publisher = doc.mdata("publisher").map(|m| m.value.clone());
    metadata.language = doc.mdata("language").map(|m| m.value.clone());
    metadata.description = doc.mdata("description").map(|m| m.value.clone());

    if let Some(date_raw) = doc.mdata("date").map(|m| m.value.clone()) {
        match parse_epub_date(&date_raw) {
            Some(date) => metadata.publication_date = Some(date),
            None => {
                debug!(raw = %date_raw, "Unparseable EPUB date");
                warnings.push(format!("Could not parse publication date: {}", date_raw));
            }
        }
    }

    // Identifiers: keep the one that looks like an ISBN.
    let identifiers: Vec<String> = doc
        .metadata
        .iter()
        .filter(|n| n.property == "identifier")
        .map(|n| n.value.clone())
        .collect();
    metadata.isbn = identifiers.iter().find_map(|id| extract_isbn(id));

    metadata.tags = doc
        .metadata
        .iter()
        .filter(|n| n.property == "subject")
        .map(|n| n.value.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    metadata
}

/// EPUB `dc:date` values come in several shapes; try them in order.
pub fn parse_epub_date(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    if trimmed.len() == 4
        && let Ok(year) = trimmed.parse::<i32>()
    {
        return NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0).map(|d| d.and_utc());
    }
    None
}

/// Pull an ISBN out of a Dublin Core identifier, stripping common prefixes.
pub fn extract_isbn(identifier: &str) -> Option<String> {
    let cleaned = identifier
        .trim()
        .trim_start_matches("urn:isbn:")
        .trim_start_matches("URN:ISBN:")
        .trim_start_matches("isbn:")
        .trim_start_matches("ISBN:")
        .trim()
        .to_string();
    let digits: String = cleaned.chars().filter(|c| c.is_ascii_digit() || *c == 'X').collect();
    if digits.len() == 10 || digits.len() == 13 {
        Some(cleaned)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_epub_date_formats() {
        assert!(parse_epub_date("2020-05-01T10:00:00+02:00").is_some());
        assert!(parse_epub_date("2020-05-01T10:00:00Z").is_some());
        assert!(parse_epub_date("2020-05-01T10:00:00").is_some());
        assert!(parse_epub_date("2020-05-01").is_some());
        assert!(parse_epub_date("2020").is_some());
        assert!(parse_epub_date("around 2020").is_none());
    }

    #[test]
    fn test_isbn_prefix_stripping() {
        assert_eq!(
            extract_isbn("urn:isbn:9783161484100").as_deref(),
            Some("9783161484100")
        );
        assert_eq!(extract_isbn("isbn:0316769487").as_deref(), Some("0316769487"));
        assert_eq!(
            extract_isbn("978-3-16-148410-0").as_deref(),
            Some("978-3-16-148410-0")
        );
        assert_eq!(extract_isbn("uuid:deadbeef"), None);
        assert_eq!(extract_isbn("12345"), None);
    }
}
