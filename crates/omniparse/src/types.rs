//! The normalized document model.
//!
//! Every format pipeline produces the same shape: a [`Document`] owning its
//! chapters, image references, metadata, and processing info. All entities are
//! plain value types with serde round-tripping; instants serialize as ISO-8601
//! strings and non-ASCII content is preserved as UTF-8.

use crate::{OmniparseError, Result};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A reference to an image extracted from (or referenced by) a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageReference {
    /// Stable identifier, typically `img_001`, `img_002`, ...
    pub image_id: String,

    /// Character offset into the full content, or 0 when untracked.
    #[serde(default)]
    pub position: usize,

    /// Absolute filesystem path or URL. None when the image was not persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,

    /// Alternative text, when the source format carries it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,

    /// `(width, height)` in pixels, when probe succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<(u32, u32)>,

    /// Lowercase short format name (`"png"`, `"jpeg"`, ...), `"unknown"` otherwise.
    #[serde(default = "default_image_format")]
    pub format: String,
}

fn default_image_format() -> String {
    "unknown".to_string()
}

impl ImageReference {
    pub fn new(image_id: impl Into<String>) -> Self {
        Self {
            image_id: image_id.into(),
            position: 0,
            file_path: None,
            alt_text: None,
            size: None,
            format: default_image_format(),
        }
    }
}

/// One chapter of a document, carved out of the full content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    /// 1-based sequence number; re-numbered after post-processing filters.
    pub chapter_id: usize,

    /// Non-empty title; duplicates are disambiguated with a `" (n)"` suffix.
    pub title: String,

    /// The chapter's text slice.
    pub content: String,

    /// Character offset of the chapter start within the document content.
    pub start_position: usize,

    /// Character offset one past the chapter end; always > `start_position`.
    pub end_position: usize,

    /// Whitespace-token count of `content`.
    pub word_count: usize,

    /// Heading depth 1-6, matching markdown heading levels.
    pub level: u8,

    /// Free-form per-chapter metadata. Carries at least a `detection_method`
    /// tag (`"toc"`, `"spine"`, `"pattern"`, `"single_chapter"`,
    /// `"auto_generated"`, `"qr_code"`) for chapters produced by a detector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<IndexMap<String, serde_json::Value>>,
}

/// Universal document metadata.
///
/// All fields are optional except `file_size` and `original_format`;
/// format-specific extras live in `custom_fields`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Primary author.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// All authors, primary first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<DateTime<Utc>>,

    /// BCP-47-ish language tag (`"en"`, `"de-DE"`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Source file size in bytes, 0 when unknown.
    #[serde(default)]
    pub file_size: u64,

    /// Lowercase source format name (`"epub"`, `"pdf"`, ...). Always set.
    pub original_format: String,

    /// Format-specific extras (`page_count`, `og_image`, `url`,
    /// `encoding_info`, ...). Insertion order is preserved.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub custom_fields: IndexMap<String, serde_json::Value>,
}

impl Metadata {
    /// Thin constructor unifying Metadata creation across parsers.
    pub fn new(original_format: impl Into<String>) -> Self {
        Self {
            original_format: original_format.into(),
            ..Default::default()
        }
    }

    /// Set the primary author, mirroring it into `authors` when empty.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        let author = author.into();
        if self.authors.is_empty() {
            self.authors.push(author.clone());
        }
        self.author = Some(author);
        self
    }
}

/// Record of how a parse went: which parser ran, how long it took, and what
/// non-fatal problems came up along the way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingInfo {
    pub parser_used: String,
    pub parser_version: String,

    /// Wall-clock seconds; set once at the end of the parse.
    #[serde(default)]
    pub processing_time: f64,

    pub timestamp: DateTime<Utc>,

    /// Ordered, human-readable warnings accumulated during the parse.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    /// Copy of the effective options, for reproducibility.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub options_used: IndexMap<String, serde_json::Value>,
}

impl ProcessingInfo {
    pub fn new(parser_used: impl Into<String>, parser_version: impl Into<String>) -> Self {
        Self {
            parser_used: parser_used.into(),
            parser_version: parser_version.into(),
            processing_time: 0.0,
            timestamp: Utc::now(),
            warnings: Vec::new(),
            options_used: IndexMap::new(),
        }
    }
}

/// Classification of a decoded QR payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QrDataType {
    Url,
    Text,
    Vcard,
    Wifi,
    Email,
    Phone,
    Geo,
}

impl QrDataType {
    /// Classify raw QR payload text.
    pub fn classify(raw: &str) -> Self {
        let trimmed = raw.trim();
        let lower = trimmed.to_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url
        } else if lower.starts_with("begin:vcard") {
            Self::Vcard
        } else if lower.starts_with("wifi:") {
            Self::Wifi
        } else if lower.starts_with("mailto:") {
            Self::Email
        } else if lower.starts_with("tel:") {
            Self::Phone
        } else if lower.starts_with("geo:") {
            Self::Geo
        } else {
            Self::Text
        }
    }
}

/// Outcome of the external URL fetch for a QR code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QrFetchStatus {
    Pending,
    Success,
    Partial,
    Failed,
    Skipped,
}

/// Bounding box of a detected QR code on its source page image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QrBoundingBox {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

/// A QR code detected in a document (PDF pages only, and only when QR
/// detection is enabled).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrCodeReference {
    pub qr_id: String,
    pub raw_data: String,
    pub data_type: QrDataType,

    /// Identifier of the page image the code was found on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_image: Option<String>,

    #[serde(default)]
    pub position: QrBoundingBox,

    /// 1-based page number.
    pub page_number: usize,

    /// Content returned by the external URL fetcher, when any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_content: Option<String>,

    pub fetch_status: QrFetchStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_notes: Option<String>,
}

impl QrCodeReference {
    pub fn new(qr_id: impl Into<String>, raw_data: impl Into<String>, page_number: usize) -> Self {
        let raw_data = raw_data.into();
        let data_type = QrDataType::classify(&raw_data);
        Self {
            qr_id: qr_id.into(),
            raw_data,
            data_type,
            source_image: None,
            position: QrBoundingBox::default(),
            page_number,
            fetched_content: None,
            fetch_status: QrFetchStatus::Pending,
            fetch_notes: None,
        }
    }
}

/// The normalized parse result: full content plus structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique id, a UUID v4 unless the caller supplies one.
    pub document_id: String,

    /// Full text or Markdown content.
    pub content: String,

    #[serde(default)]
    pub chapters: Vec<Chapter>,

    #[serde(default)]
    pub images: Vec<ImageReference>,

    pub metadata: Metadata,

    pub processing_info: ProcessingInfo,

    /// Whitespace-token count of `content`. Chapters may not cover 100% of it
    /// because heading-marker normalization adds tokens outside chapters.
    pub word_count: usize,

    /// Minutes, never below 1.
    pub estimated_reading_time: u32,

    /// QR codes detected in the document; empty unless QR detection ran.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qr_codes: Vec<QrCodeReference>,
}

impl Document {
    /// Fresh document with a generated id and empty structure.
    pub fn new(metadata: Metadata, processing_info: ProcessingInfo) -> Self {
        Self {
            document_id: uuid::Uuid::new_v4().to_string(),
            content: String::new(),
            chapters: Vec::new(),
            images: Vec::new(),
            metadata,
            processing_info,
            word_count: 0,
            estimated_reading_time: 1,
            qr_codes: Vec::new(),
        }
    }

    /// Serialize to a JSON value (the dictionary form).
    pub fn to_dict(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Reconstruct a document from its dictionary form.
    pub fn from_dict(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Save as pretty-printed JSON (2-space indent, UTF-8 preserved).
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Load a document previously written by [`Document::save_json`].
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|e| {
            OmniparseError::file_read_with_source(format!("cannot read {}", path.display()), e)
        })?;
        Ok(serde_json::from_str(&data)?)
    }
}
