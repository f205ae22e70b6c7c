//! Image extraction from EPUB resources.
//!
//! Images are only extracted when a persistent output directory is
//! configured; the container's internal subpaths are preserved under it.
//! Icons are legitimate EPUB content, so the minimum dimension is 1.

use crate::processors::image_saver::{SaveOptions, probe_dimensions, save_image};
use crate::types::ImageReference;
use epub::doc::EpubDoc;
use std::io::{Read, Seek};
use std::path::Path;
use tracing::warn;

/// Extract all image resources, preserving internal subpaths.
///
/// Failures on individual images are recorded as warnings and skipped; they
/// never fail the parse.
pub fn extract_images<R: Read + Seek>(
    doc: &mut EpubDoc<R>,
    output_dir: &Path,
    warnings: &mut Vec<String>,
) -> Vec<ImageReference> {
    // Collect ids first; get_resource needs &mut access to the archive.
    let mut image_resources: Vec<(String, String)> = doc
        .resources
        .iter()
        .filter(|(_, item)| item.mime.starts_with("image/"))
        .map(|(id, item)| (id.clone(), item.path.to_string_lossy().into_owned()))
        .collect();
    image_resources.sort_by(|a, b| a.1.cmp(&b.1));

    let mut images = Vec::new();
    for (idx, (resource_id, internal_path)) in image_resources.iter().enumerate() {
        let Some((bytes, _mime)) = doc.get_resource(resource_id) else {
            warnings.push(format!("Failed to read image resource '{}'", resource_id));
            continue;
        };

        let options = SaveOptions::new(output_dir, "image", idx + 1)
            .with_min_dimension(1)
            .with_subpath(internal_path.clone());
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
                warn!(resource = %resource_id, "Skipping image: {}", e);
                warnings.push(format!("Skipped image '{}': {}", internal_path, e));
            }
        }
    }

    images
}
