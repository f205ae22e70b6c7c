//! Main-content extraction for HTML pages.
//!
//! Two-stage strategy: a primary extractor that looks for semantic content
//! containers and scores them by text mass, then a fallback that scores every
//! block container in the page (link-dense blocks are penalized). When the
//! primary yields under 100 characters of stripped text the fallback runs on
//! the original HTML; when both yield under 50 characters the page is
//! considered unextractable and the parse fails.

use crate::{OmniparseError, Result};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Minimum stripped-text length for the primary result to be accepted.
const PRIMARY_MIN_CHARS: usize = 100;
/// Minimum stripped-text length below which the whole extraction fails.
const FALLBACK_MIN_CHARS: usize = 50;

/// Semantic containers tried by the primary extractor, most specific first.
static CANDIDATE_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "article",
        "main",
        "[role=\"main\"]",
        "#content",
        "#main-content",
        ".post-content",
        ".entry-content",
        ".article-body",
        ".content",
    ]
    .iter()
    .map(|s| Selector::parse(s).expect("valid selector"))
    .collect()
});

static BODY_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("body").expect("valid selector"));
static BLOCK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div, section, td").expect("valid selector"));
static PARAGRAPH_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("valid selector"));
static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("valid selector"));

/// Which extraction path produced the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionPath {
    Primary,
    Fallback,
}

/// Extract the main-content HTML from a page.
///
/// Returns the extracted HTML subset and the path that produced it; the path
/// is also recorded in `warnings` when the fallback had to run. Thresholds
/// are measured on the trimmed extracted-HTML length.
pub fn extract_main_content(html: &str, warnings: &mut Vec<String>) -> Result<(String, ExtractionPath)> {
    let primary = primary_extract(html);
    match &primary {
        Some(extracted) if extracted.trim().len() >= PRIMARY_MIN_CHARS => {
            debug!(chars = extracted.trim().len(), "Primary content extraction succeeded");
            return Ok((extracted.clone(), ExtractionPath::Primary));
        }
        Some(_) => warnings.push(
            "Primary extraction returned minimal content, using fallback extractor".to_string(),
        ),
        None => warnings.push("Primary extraction failed, using fallback extractor".to_string()),
    }

    match fallback_extract(html) {
        Some(content) if content.trim().len() >= FALLBACK_MIN_CHARS => {
            Ok((content, ExtractionPath::Fallback))
        }
        _ => Err(OmniparseError::parsing(
            "Both content extractors produced insufficient content",
            "html",
        )),
    }
}

/// Primary: the semantic container with the most text, if any.
fn primary_extract(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let mut best: Option<(usize, String)> = None;
    for selector in CANDIDATE_SELECTORS.iter() {
        for element in document.select(selector) {
            let text_len = element_text_len(element);
            if best.as_ref().map(|(len, _)| text_len > *len).unwrap_or(true) {
                best = Some((text_len, element.html()));
            }
        }
    }
    best.map(|(_, html)| html)
}

/// Fallback: score every block container by paragraph mass minus link mass;
/// fall back to the whole `<body>` when nothing scores.
fn fallback_extract(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let body = document.select(&BODY_SELECTOR).next()?;

    let mut best: Option<(f64, String)> = None;
    for element in body.select(&BLOCK_SELECTOR) {
        let paragraph_len: usize = element
            .select(&PARAGRAPH_SELECTOR)
            .map(element_text_len)
            .sum();
        if paragraph_len == 0 {
            continue;
        }
        let total_len = element_text_len(element).max(1);
        let link_len: usize = element.select(&ANCHOR_SELECTOR).map(element_text_len).sum();
        let link_density = link_len as f64 / total_len as f64;
        let score = paragraph_len as f64 * (1.0 - link_density);
        if best.as_ref().map(|(s, _)| score > *s).unwrap_or(true) {
            best = Some((score, element.html()));
        }
    }

    // Wrapped the way readability-style extractors emit their summaries.
    match best {
        Some((_, html)) => Some(format!("<html><body><div>{}</div></body></html>", html)),
        None => Some(format!(
            "<html><body><div>{}</div></body></html>",
            body.inner_html()
        )),
    }
}

fn element_text_len(element: ElementRef) -> usize {
    element.text().map(|t| t.trim().len()).sum()
}
