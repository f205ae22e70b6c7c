//! Merging fetched QR-code content into a document.
//!
//! The URL fetch itself is an external collaborator; callers hand the fetch
//! outcome to [`apply_fetch_result`] and then merge with
//! [`merge_qr_content`], which appends formatted content sections, refreshes
//! the word count, and records QR summaries in
//! `metadata.custom_fields.qr_codes`.

use crate::text::string_utils::word_count;
use crate::types::{Document, QrCodeReference, QrDataType, QrFetchStatus};
use tracing::debug;

/// Outcome of fetching one QR code's URL, as reported by the external fetcher.
#[derive(Debug, Clone)]
pub struct QrFetchResult {
    pub status: QrFetchStatus,
    pub content: Option<String>,
    pub notes: Option<String>,
    pub source: Option<String>,
}

/// Mark non-URL codes as skipped; they have nothing to fetch.
pub fn skip_non_url_codes(qr_codes: &mut [QrCodeReference]) {
    for qr in qr_codes.iter_mut() {
        if qr.data_type != QrDataType::Url && qr.fetch_status == QrFetchStatus::Pending {
            qr.fetch_status = QrFetchStatus::Skipped;
            qr.fetch_notes = Some(format!("Non-URL QR code ({:?}), fetch skipped", qr.data_type));
        }
    }
}

/// Apply one fetch result to its QR reference.
pub fn apply_fetch_result(qr: &mut QrCodeReference, result: QrFetchResult) {
    qr.fetch_status = result.status;
    qr.fetched_content = result.content;

    let mut notes = Vec::new();
    if let Some(content) = &qr.fetched_content {
        notes.push(format!("Retrieved {} characters", content.len()));
    }
    if let Some(source) = &result.source {
        notes.push(format!("Content source: {}", source));
    }
    if let Some(extra) = result.notes {
        notes.push(extra);
    }
    if !notes.is_empty() {
        qr.fetch_notes = Some(notes.join("; "));
    }
}

/// Format one QR code's fetched content as a Markdown section.
pub fn format_qr_section(qr: &QrCodeReference) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "## Content from QR Code {} (Page {})",
        qr.qr_id, qr.page_number
    ));
    lines.push(String::new());
    if let Some(content) = &qr.fetched_content {
        lines.push(content.clone());
        lines.push(String::new());
    }
    lines.push("---".to_string());
    lines.push(format!("> **Source:** {}", qr.raw_data));
    lines.push(format!("> **Status:** {:?}", qr.fetch_status));
    if let Some(notes) = &qr.fetch_notes {
        lines.push(format!("> **Notes:** {}", notes));
    }
    lines.join("\n")
}

/// Merge QR codes into the document: append successful fetches as content
/// sections, refresh the word count, and store summaries in custom fields.
pub fn merge_qr_content(document: &mut Document, qr_codes: Vec<QrCodeReference>) {
    if qr_codes.is_empty() {
        return;
    }

    let mut summaries = Vec::with_capacity(qr_codes.len());
    for qr in &qr_codes {
        summaries.push(serde_json::json!({
            "qr_id": qr.qr_id,
            "data_type": qr.data_type,
            "raw_data": qr.raw_data,
            "page_number": qr.page_number,
            "fetch_status": qr.fetch_status,
        }));

        if qr.fetch_status == QrFetchStatus::Success && qr.fetched_content.is_some() {
            let section = format_qr_section(qr);
            document.content.push_str("\n\n");
            document.content.push_str(&section);
            debug!(qr_id = %qr.qr_id, "Merged QR content section");
        }
    }

    document.word_count = word_count(&document.content);
    document
        .metadata
        .custom_fields
        .insert("qr_codes".to_string(), serde_json::Value::Array(summaries));
    document.qr_codes = qr_codes;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Metadata, ProcessingInfo};

    fn document_with_content(content: &str) -> Document {
        let mut doc = Document::new(
            Metadata::new("pdf"),
            ProcessingInfo::new("pdf", "0.3.0"),
        );
        doc.content = content.to_string();
        doc.word_count = word_count(content);
        doc
    }

    #[test]
    fn test_non_url_codes_skipped() {
        let mut codes = vec![
            QrCodeReference::new("qr_001", "https://example.com", 1),
            QrCodeReference::new("qr_002", "just text", 2),
        ];
        skip_non_url_codes(&mut codes);
        assert_eq!(codes[0].fetch_status, QrFetchStatus::Pending);
        assert_eq!(codes[1].fetch_status, QrFetchStatus::Skipped);
    }

    #[test]
    fn test_apply_fetch_result_records_notes() {
        let mut qr = QrCodeReference::new("qr_001", "https://example.com", 1);
        apply_fetch_result(
            &mut qr,
            QrFetchResult {
                status: QrFetchStatus::Success,
                content: Some("fetched body".to_string()),
                notes: None,
                source: Some("article".to_string()),
            },
        );
        assert_eq!(qr.fetch_status, QrFetchStatus::Success);
        let notes = qr.fetch_notes.unwrap();
        assert!(notes.contains("12 characters"));
        assert!(notes.contains("article"));
    }

    #[test]
    fn test_merge_appends_sections_and_updates_word_count() {
        let mut doc = document_with_content("original body text");
        let before = doc.word_count;

        let mut qr = QrCodeReference::new("qr_001", "https://example.com", 2);
        apply_fetch_result(
            &mut qr,
            QrFetchResult {
                status: QrFetchStatus::Success,
                content: Some("linked page words here".to_string()),
                notes: None,
                source: None,
            },
        );
        merge_qr_content(&mut doc, vec![qr]);

        assert!(doc.content.contains("## Content from QR Code qr_001 (Page 2)"));
        assert!(doc.content.contains("linked page words here"));
        assert!(doc.word_count > before);
        assert!(doc.metadata.custom_fields.contains_key("qr_codes"));
        assert_eq!(doc.qr_codes.len(), 1);
    }

    #[test]
    fn test_failed_fetches_not_merged_into_content() {
        let mut doc = document_with_content("body");
        let mut qr = QrCodeReference::new("qr_001", "https://example.com", 1);
        qr.fetch_status = QrFetchStatus::Failed;
        merge_qr_content(&mut doc, vec![qr]);
        assert!(!doc.content.contains("## Content from QR Code"));
        // Summary is still recorded.
        assert!(doc.metadata.custom_fields.contains_key("qr_codes"));
    }
}
