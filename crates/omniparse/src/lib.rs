//! Omniparse - Universal Document Parsing Engine
//!
//! Omniparse ingests heterogeneous document formats and emits a single,
//! normalized document model: full content, a chapter outline with positional
//! anchors, image references, metadata, and a processing-info record.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use omniparse::{ParseOptions, parse_document_sync};
//!
//! # fn main() -> omniparse::Result<()> {
//! let options = ParseOptions::default();
//! let document = parse_document_sync("book.epub", &options)?;
//! println!("{} chapters, {} words", document.chapters.len(), document.word_count);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Core** (`core`): dispatch, options, format detection, IO validation
//! - **Plugin system** (`plugins`): the `FormatParser` trait and the
//!   priority-arbitrated parser registry
//! - **Parsers** (`parsers`): the format pipelines (EPUB, PDF, DOCX, HTML,
//!   Markdown, plain text, photo)
//! - **Processors** (`processors`): shared cross-format stages (chapter
//!   detection, text cleaning, HTML→Markdown, metadata extraction, image
//!   persistence, QR merge)
//!
//! Format support is feature-gated the same way heavyweight dependencies
//! are: `office` (EPUB + DOCX), `html`, `photo`, `pdf`, `ocr`, `qr`.

#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod parsers;
pub mod plugins;
pub mod processors;
pub mod text;
pub mod types;

pub use error::{OmniparseError, Result};
pub use types::*;

pub use crate::core::config::ParseOptions;
pub use crate::core::dispatcher::{get_supported_formats, is_format_supported, parse_document};

#[cfg(feature = "tokio-runtime")]
pub use crate::core::dispatcher::parse_document_sync;

pub use parsers::{ensure_initialized, register_builtin_parsers};
pub use plugins::registry::{ParserInfo, ParserRegistry, global_registry};
pub use plugins::{FormatParser, Plugin};
