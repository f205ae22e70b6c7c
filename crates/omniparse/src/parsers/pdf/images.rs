//! Image extraction from PDF pages.
//!
//! Page image objects are decoded, validated at the standard 100px minimum,
//! and saved under the configured output directory. Positions encode reading
//! order as `page · 1000 + index`.

use crate::processors::image_saver::{SaveOptions, save_image};
use crate::types::ImageReference;
use image::GenericImageView;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::warn;

/// Extract and persist the images of one page.
pub fn extract_page_images(
    page: &PdfPage,
    page_number: usize,
    output_dir: &Path,
    saved_so_far: usize,
    warnings: &mut Vec<String>,
) -> Vec<ImageReference> {
    let mut images = Vec::new();

    for (object_index, object) in page.objects().iter().enumerate() {
        let Some(image_object) = object.as_image_object() else {
            continue;
        };
        let decoded = match image_object.get_raw_image() {
            Ok(decoded) => decoded,
            Err(e) => {
                warnings.push(format!(
                    "Failed to decode image {} on page {}: {}",
                    object_index, page_number, e
                ));
                continue;
            }
        };

        let mut png_bytes = std::io::Cursor::new(Vec::new());
        if let Err(e) = decoded.write_to(&mut png_bytes, image::ImageFormat::Png) {
            warnings.push(format!(
                "Failed to encode image {} on page {}: {}",
                object_index, page_number, e
            ));
            continue;
        }
        let png_bytes = png_bytes.into_inner();

        let index = saved_so_far + images.len() + 1;
        let options = SaveOptions::new(output_dir, format!("page{}", page_number), index);
        match save_image(&png_bytes, &options) {
            Ok((saved_path, format)) => {
                let mut image = ImageReference::new(format!("img_{:03}", index));
                image.position = page_number * 1000 + images.len();
                image.file_path = Some(saved_path.to_string_lossy().into_owned());
                image.size = Some(decoded.dimensions());
                image.format = format;
                images.push(image);
            }
            Err(e) => {
                // Dimension/size rejections are routine (logos, rules).
                warn!(page = page_number, "Skipping page image: {}", e);
            }
        }
    }

    images
}
