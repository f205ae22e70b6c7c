//! Image extraction from DOCX relationships.
//!
//! Only runs when an output directory is configured. Targets resolve
//! relative to `word/`; icons are valid content, so the minimum dimension
//! is 1.

use crate::processors::image_saver::{SaveOptions, probe_dimensions, save_image};
use crate::types::ImageReference;
use std::io::{Read, Seek};
use std::path::Path;
use tracing::warn;
use zip::ZipArchive;

/// Extract images referenced by the document relationships.
pub fn extract_images<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    image_targets: &[(String, String)],
    output_dir: &Path,
    base_name: &str,
    warnings: &mut Vec<String>,
) -> Vec<ImageReference> {
    let mut images = Vec::new();

    for (relationship_id, target) in image_targets {
        let entry_name = if target.starts_with("word/") {
            target.clone()
        } else {
            format!("word/{}", target.trim_start_matches("./"))
        };

        let mut bytes = Vec::new();
        match archive.by_name(&entry_name) {
            Ok(mut entry) => {
                if let Err(e) = entry.read_to_end(&mut bytes) {
                    warnings.push(format!("Failed to read image '{}': {}", entry_name, e));
                    continue;
                }
            }
            Err(e) => {
                warnings.push(format!("Image entry '{}' missing: {}", entry_name, e));
                continue;
            }
        }

        let options =
            SaveOptions::new(output_dir, base_name, images.len() + 1).with_min_dimension(1);
        match save_image(&bytes, &options) {
            Ok((saved_path, format)) => {
                let (width, height, _) = probe_dimensions(&bytes);
                let mut image = ImageReference::new(format!("img_{:03}", images.len() + 1));
                image.file_path = Some(saved_path.to_string_lossy().into_owned());
                image.size = width.zip(height);
                image.format = format;
                images.push(image);
            }
            Err(e) => {
                warn!(relationship = %relationship_id, "Skipping image: {}", e);
                warnings.push(format!("Skipped image '{}': {}", target, e));
            }
        }
    }

    images
}
