//! OCR fallback for scanned PDFs.
//!
//! Pages are rendered to images at the configured DPI inside the pdfium
//! stage; recognition runs afterwards on blocking tasks under a single
//! wall-clock timeout. A timeout surfaces as a `Parsing` error. OCR output
//! carries no font metadata, so no headings are derivable from it.

use crate::{OmniparseError, Result};
use image::DynamicImage;
use kreuzberg_tesseract::TesseractAPI;
use std::time::Duration;
use tracing::{debug, info};

/// Recognize text on pre-rendered page images, in page order, under one
/// overall timeout.
pub async fn recognize_pages(
    pages: Vec<DynamicImage>,
    language: &str,
    timeout_secs: u64,
    warnings: &mut Vec<String>,
) -> Result<String> {
    let language = language.to_string();
    let page_count = pages.len();
    info!(pages = page_count, language = %language, "Starting OCR");

    let work = async move {
        let mut parts: Vec<String> = Vec::with_capacity(page_count);
        for (index, page) in pages.into_iter().enumerate() {
            let language = language.clone();
            let text = tokio::task::spawn_blocking(move || recognize_one(&page, &language))
                .await
                .map_err(|e| {
                    OmniparseError::parsing(format!("OCR task panicked: {}", e), "pdf")
                })??;
            debug!(page = index + 1, chars = text.len(), "OCR page done");
            parts.push(text);
        }
        Ok::<_, OmniparseError>(parts.join("\n\n"))
    };

    match tokio::time::timeout(Duration::from_secs(timeout_secs), work).await {
        Ok(result) => {
            let text = result?;
            if text.trim().is_empty() {
                warnings.push("OCR produced no text".to_string());
            }
            Ok(text)
        }
        Err(_) => Err(OmniparseError::parsing(
            format!("OCR timed out after {} seconds", timeout_secs),
            "pdf",
        )),
    }
}

/// Run Tesseract on one rendered page.
fn recognize_one(page: &DynamicImage, language: &str) -> Result<String> {
    let rgb = page.to_rgb8();
    let (width, height) = rgb.dimensions();

    let api = TesseractAPI::new();
    let tessdata = std::env::var("TESSDATA_PREFIX").unwrap_or_default();
    api.init(&tessdata, language).map_err(|e| {
        OmniparseError::parsing(format!("Tesseract init failed ({}): {}", language, e), "pdf")
    })?;

    api.set_image(rgb.as_raw(), width as i32, height as i32, 3, (width * 3) as i32)
        .map_err(|e| OmniparseError::parsing(format!("Tesseract set_image failed: {}", e), "pdf"))?;
    api.recognize()
        .map_err(|e| OmniparseError::parsing(format!("Tesseract recognize failed: {}", e), "pdf"))?;
    api.get_utf8_text()
        .map_err(|e| OmniparseError::parsing(format!("Tesseract text extraction failed: {}", e), "pdf"))
}
