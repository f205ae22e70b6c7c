//! Built-in format pipelines.
//!
//! All pipelines implement the [`crate::plugins::FormatParser`] trait and are
//! registered with the global registry on first use.

use crate::Result;
use crate::plugins::registry::global_registry;
use once_cell::sync::Lazy;
use std::sync::Arc;

pub mod markdown;
pub mod text;

#[cfg(feature = "office")]
pub mod docx;

#[cfg(feature = "office")]
pub mod epub;

#[cfg(feature = "html")]
pub mod html;

#[cfg(feature = "pdf")]
pub mod pdf;

#[cfg(feature = "photo")]
pub mod photo;

pub use markdown::MarkdownParser;
pub use text::TextParser;

#[cfg(feature = "office")]
pub use docx::DocxParser;

#[cfg(feature = "office")]
pub use epub::EpubParser;

#[cfg(feature = "html")]
pub use html::HtmlParser;

#[cfg(feature = "pdf")]
pub use pdf::PdfParser;

#[cfg(feature = "photo")]
pub use photo::PhotoParser;

/// One-shot registration guard; consulted on first parse operation.
static PARSERS_INITIALIZED: Lazy<Result<()>> = Lazy::new(register_builtin_parsers);

/// Ensure the built-in parsers are registered. Safe to call repeatedly.
pub fn ensure_initialized() -> Result<()> {
    PARSERS_INITIALIZED
        .as_ref()
        .map(|_| ())
        .map_err(|e| crate::OmniparseError::Plugin {
            message: format!("Failed to register built-in parsers: {}", e),
            plugin_name: "built-in-parsers".to_string(),
        })
}

/// Register all built-in parsers with the global registry.
///
/// Called automatically on first parse; explicit calling is optional.
pub fn register_builtin_parsers() -> Result<()> {
    let registry = global_registry();
    let mut registry = registry
        .write()
        .map_err(|e| crate::OmniparseError::LockPoisoned(format!("parser registry: {}", e)))?;

    registry.register(Arc::new(TextParser::new()))?;
    registry.register(Arc::new(MarkdownParser::new()))?;

    #[cfg(feature = "office")]
    {
        registry.register(Arc::new(EpubParser::new()))?;
        registry.register(Arc::new(DocxParser::new()))?;
    }

    #[cfg(feature = "html")]
    registry.register(Arc::new(HtmlParser::new()))?;

    #[cfg(feature = "pdf")]
    registry.register(Arc::new(PdfParser::new()))?;

    #[cfg(feature = "photo")]
    registry.register(Arc::new(PhotoParser::new()))?;

    Ok(())
}
