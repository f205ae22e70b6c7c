//! The parse entry point: URL vs path routing, registry lookup, error
//! normalization, and processing-time stamping.

use crate::core::config::ParseOptions;
use crate::core::io::validate_file_exists;
use crate::plugins::registry::global_registry;
use crate::types::Document;
use crate::{OmniparseError, Result};
use std::path::Path;
use std::time::Instant;
use tracing::info;

#[cfg(feature = "tokio-runtime")]
use once_cell::sync::Lazy;

/// Global runtime for the sync wrappers; created once, shared by all calls.
#[cfg(feature = "tokio-runtime")]
static GLOBAL_RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create global Tokio runtime")
});

/// Parse a document from a file path or URL.
///
/// `http://` and `https://` sources route to the HTML pipeline directly,
/// without file checks. Local paths resolve through the parser registry by
/// extension.
///
/// # Errors
///
/// - `UnsupportedFormat` - no parser registered for the extension
/// - `FileRead` - the path is missing or not a regular file
/// - `Validation` - the pipeline rejected the input's integrity
/// - `Parsing` / `Network` - extraction failures, tagged with the pipeline
pub async fn parse_document(source: &str, options: &ParseOptions) -> Result<Document> {
    crate::parsers::ensure_initialized()?;
    let started = Instant::now();

    let mut document = if is_url(source) {
        parse_url(source, options).await?
    } else {
        let path = Path::new(source);
        validate_file_exists(path)?;

        let parser = {
            let registry = global_registry()
                .read()
                .map_err(|e| OmniparseError::LockPoisoned(format!("parser registry: {}", e)))?;
            registry.get_parser(source)?
        };
        let parser_name = parser.name().to_string();
        info!(parser = %parser_name, source, "Dispatching parse");

        parser
            .parse_file(path, options)
            .await
            .map_err(|e| e.into_parsing(&parser_name))?
    };

    document.processing_info.processing_time = started.elapsed().as_secs_f64();
    Ok(document)
}

#[cfg(feature = "html")]
async fn parse_url(source: &str, options: &ParseOptions) -> Result<Document> {
    info!(url = source, "Dispatching URL parse to HTML pipeline");
    crate::parsers::html::HtmlParser::new()
        .parse_url(source, options)
        .await
        .map_err(|e| e.into_parsing("html"))
}

#[cfg(not(feature = "html"))]
async fn parse_url(source: &str, _options: &ParseOptions) -> Result<Document> {
    Err(OmniparseError::UnsupportedFormat(format!(
        "URL parsing requires the `html` feature: {}",
        source
    )))
}

/// Blocking wrapper around [`parse_document`].
#[cfg(feature = "tokio-runtime")]
pub fn parse_document_sync(source: &str, options: &ParseOptions) -> Result<Document> {
    GLOBAL_RUNTIME.block_on(parse_document(source, options))
}

fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Sorted list of all registered dotted extensions.
pub fn get_supported_formats() -> Vec<String> {
    if crate::parsers::ensure_initialized().is_err() {
        return Vec::new();
    }
    match global_registry().read() {
        Ok(registry) => registry.supported_extensions(),
        Err(_) => Vec::new(),
    }
}

/// True when the source is parseable: a URL (with the HTML pipeline built
/// in), a known extension, or a file claimed by a `supports` predicate.
pub fn is_format_supported(source: &str) -> bool {
    if is_url(source) {
        return cfg!(feature = "html");
    }
    if crate::parsers::ensure_initialized().is_err() {
        return false;
    }
    match global_registry().read() {
        Ok(registry) => registry.is_supported(Path::new(source)),
        Err(_) => false,
    }
}
