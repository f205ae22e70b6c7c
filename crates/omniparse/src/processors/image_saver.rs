//! Image validation, dimension probing, and persistence.
//!
//! Shared by the EPUB, DOCX, PDF, and HTML pipelines. Raw bytes are validated
//! (non-empty, size cap, decodable, minimum dimensions) and written either
//! under an auto-numbered name or under the source container's internal
//! subpath when the caller wants that structure preserved.

use crate::{OmniparseError, Result};
use image::GenericImageView;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Default maximum image size accepted by the validator.
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 50 * 1024 * 1024;

/// Default minimum dimension (pixels) for either side.
///
/// EPUB and DOCX pipelines override this to 1 so small icons survive.
pub const DEFAULT_MIN_DIMENSION: u32 = 100;

/// How a saved image should be named and filtered.
#[derive(Debug, Clone)]
pub struct SaveOptions {
    /// Destination directory; created if missing.
    pub output_dir: PathBuf,
    /// Base for auto-numbered names: `{base_name}_{NNN}.{ext}`.
    pub base_name: String,
    /// 1-based auto-number.
    pub index: usize,
    /// When set, save under `{output_dir}/{subpath}` instead of auto-numbering.
    pub preserve_subpath: Option<String>,
    /// Reject images with either dimension below this.
    pub min_dimension: u32,
    /// Reject images larger than this many bytes.
    pub max_bytes: u64,
}

impl SaveOptions {
    pub fn new(output_dir: impl Into<PathBuf>, base_name: impl Into<String>, index: usize) -> Self {
        Self {
            output_dir: output_dir.into(),
            base_name: base_name.into(),
            index,
            preserve_subpath: None,
            min_dimension: DEFAULT_MIN_DIMENSION,
            max_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }

    pub fn with_min_dimension(mut self, min_dimension: u32) -> Self {
        self.min_dimension = min_dimension;
        self
    }

    pub fn with_subpath(mut self, subpath: impl Into<String>) -> Self {
        self.preserve_subpath = Some(subpath.into());
        self
    }
}

/// Validate image bytes and persist them.
///
/// Returns the absolute saved path and the detected lowercase format name.
pub fn save_image(bytes: &[u8], options: &SaveOptions) -> Result<(PathBuf, String)> {
    if bytes.is_empty() {
        return Err(OmniparseError::validation("Image data is empty"));
    }
    if bytes.len() as u64 > options.max_bytes {
        return Err(OmniparseError::validation(format!(
            "Image too large: {} bytes (max {})",
            bytes.len(),
            options.max_bytes
        )));
    }

    let decoded = image::load_from_memory(bytes)
        .map_err(|e| OmniparseError::validation_with_source("Cannot decode image", e))?;
    let (width, height) = decoded.dimensions();
    if width < options.min_dimension || height < options.min_dimension {
        return Err(OmniparseError::validation(format!(
            "Image below minimum dimension: {}x{} (min {})",
            width, height, options.min_dimension
        )));
    }

    let format_name = image::guess_format(bytes)
        .ok()
        .map(format_short_name)
        .unwrap_or("png");

    let target = match &options.preserve_subpath {
        Some(subpath) => {
            let relative = sanitize_subpath(subpath)?;
            options.output_dir.join(relative)
        }
        None => options.output_dir.join(format!(
            "{}_{:03}.{}",
            options.base_name, options.index, format_name
        )),
    };

    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&target, bytes)?;

    let absolute = std::fs::canonicalize(&target).unwrap_or(target);
    debug!(path = %absolute.display(), format = format_name, "Saved image");
    Ok((absolute, format_name.to_string()))
}

/// Probe image dimensions without persisting.
///
/// Returns `(width, height, format)`, or `(None, None, "unknown")` when the
/// bytes are not decodable.
pub fn probe_dimensions(bytes: &[u8]) -> (Option<u32>, Option<u32>, String) {
    let format = image::guess_format(bytes)
        .ok()
        .map(format_short_name)
        .unwrap_or("unknown");
    match image::load_from_memory(bytes) {
        Ok(decoded) => {
            let (w, h) = decoded.dimensions();
            (Some(w), Some(h), format.to_string())
        }
        Err(_) => (None, None, "unknown".to_string()),
    }
}

/// Map an HTTP content type to a file extension; unknown types become `png`.
pub fn extension_for_content_type(content_type: &str) -> &'static str {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/jpeg" | "image/pjpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/bmp" | "image/x-ms-bmp" => "bmp",
        "image/webp" => "webp",
        "image/tiff" => "tiff",
        _ => "png",
    }
}

fn format_short_name(format: image::ImageFormat) -> &'static str {
    match format {
        image::ImageFormat::Png => "png",
        image::ImageFormat::Jpeg => "jpeg",
        image::ImageFormat::Gif => "gif",
        image::ImageFormat::WebP => "webp",
        image::ImageFormat::Tiff => "tiff",
        image::ImageFormat::Bmp => "bmp",
        _ => "png",
    }
}

/// Keep container subpaths inside the output directory.
fn sanitize_subpath(subpath: &str) -> Result<PathBuf> {
    let path = Path::new(subpath);
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            _ => {
                return Err(OmniparseError::validation(format!(
                    "Refusing unsafe image subpath: {}",
                    subpath
                )));
            }
        }
    }
    if clean.as_os_str().is_empty() {
        return Err(OmniparseError::validation("Empty image subpath"));
    }
    Ok(clean)
}
