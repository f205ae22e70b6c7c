//! Plugin architecture: the parser trait and the process-wide registry.
//!
//! Built-in pipelines and caller-supplied parsers implement the same
//! [`FormatParser`] trait and register through the same
//! [`registry::ParserRegistry`], so external formats are first-class.

pub mod registry;

use crate::Result;
use crate::core::config::ParseOptions;
use crate::types::Document;
use async_trait::async_trait;
use std::path::Path;

/// Base trait for all plugins: identity plus lifecycle.
///
/// `initialize` runs at registration; a failure there rejects the
/// registration. `shutdown` runs at unregistration. Both take `&self` so
/// implementations behind `Arc<dyn ...>` use interior mutability when they
/// need state.
pub trait Plugin: Send + Sync {
    /// Unique kebab-case identifier (`"epub"`, `"pdf"`, ...).
    fn name(&self) -> &str;

    /// Semantic version of this parser.
    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    /// Human-readable description for listings and logs.
    fn description(&self) -> &str {
        ""
    }

    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

/// A format pipeline: validates and parses one family of file formats into
/// the normalized [`Document`] model.
#[async_trait]
pub trait FormatParser: Plugin {
    /// Parse a local file into a document.
    ///
    /// # Errors
    ///
    /// - `Validation` for wrong extension / empty file / integrity failures
    /// - `FileRead` for unreadable paths
    /// - `Parsing` for format-library failures, tagged with the parser name
    async fn parse_file(&self, path: &Path, options: &ParseOptions) -> Result<Document>;

    /// Extensions this parser handles, lowercase and dotted (`".epub"`).
    fn extensions(&self) -> &[&str];

    /// Content-based detection hook consulted when the extension is missing
    /// or unrecognized (magic bytes, container sniffing). Default: no.
    fn supports(&self, _path: &Path) -> bool {
        false
    }

    /// Priority for extension-collision arbitration; higher wins.
    /// Built-in parsers use 50.
    fn priority(&self) -> i32 {
        50
    }
}
