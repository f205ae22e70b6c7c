//! Photo pipeline: EXIF metadata rendered as a Markdown document.
//!
//! The document's content is a Markdown rendering of the photo's metadata,
//! with one ImageReference for the photo itself and no chapters. AI
//! enrichment (analysis, mood, caption) is an external collaborator that
//! merges through `custom_fields`.

mod exif;

pub use exif::{PhotoExif, dms_to_decimal, read_exif};

use crate::core::config::ParseOptions;
use crate::core::io::{read_bytes, validate_input_file};
use crate::plugins::{FormatParser, Plugin};
use crate::processors::image_saver::probe_dimensions;
use crate::text::string_utils::word_count;
use crate::types::{Document, ImageReference, Metadata, ProcessingInfo};
use crate::Result;
use async_trait::async_trait;
use std::path::Path;

const PHOTO_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".tiff", ".tif", ".webp", ".bmp", ".gif", ".heic", ".heif",
];

/// Photo format parser.
pub struct PhotoParser;

impl PhotoParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PhotoParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for PhotoParser {
    fn name(&self) -> &str {
        "photo"
    }

    fn description(&self) -> &str {
        "Parses photos into a metadata document with EXIF camera, exposure, and GPS details"
    }
}

fn render_markdown(path: &Path, exif: &PhotoExif, size: Option<(u32, u32)>, format: &str) -> String {
    let mut lines = Vec::new();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "photo".to_string());
    lines.push(format!("# Photo: {}", name));
    lines.push(String::new());

    if let Some((width, height)) = size {
        lines.push(format!("- **Dimensions:** {}x{} px", width, height));
    }
    lines.push(format!("- **Format:** {}", format));

    if let Some(make) = &exif.camera_make {
        let model = exif.camera_model.as_deref().unwrap_or("");
        lines.push(format!("- **Camera:** {} {}", make, model).trim_end().to_string());
    }
    if let Some(lens) = &exif.lens_model {
        lines.push(format!("- **Lens:** {}", lens));
    }

    let exposure: Vec<String> = [
        exif.exposure_time.as_ref().map(|v| format!("{} s", v)),
        exif.f_number.as_ref().map(|v| format!("f/{}", v.trim_start_matches("f/"))),
        exif.iso.as_ref().map(|v| format!("ISO {}", v)),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !exposure.is_empty() {
        lines.push(format!("- **Exposure:** {}", exposure.join(", ")));
    }
    if let Some(focal) = &exif.focal_length {
        lines.push(format!("- **Focal length:** {}", focal));
    }
    if let Some(taken) = &exif.taken_at {
        lines.push(format!("- **Taken:** {}", taken));
    }
    if let (Some(lat), Some(lon)) = (exif.gps_latitude, exif.gps_longitude) {
        lines.push(format!("- **Location:** {:.6}, {:.6}", lat, lon));
    }
    if let Some(orientation) = exif.orientation {
        lines.push(format!("- **Orientation:** {}", orientation));
    }
    if let Some(artist) = &exif.artist {
        lines.push(format!("- **Artist:** {}", artist));
    }
    if let Some(copyright) = &exif.copyright {
        lines.push(format!("- **Copyright:** {}", copyright));
    }

    lines.join("\n")
}

#[async_trait]
impl FormatParser for PhotoParser {
    async fn parse_file(&self, path: &Path, options: &ParseOptions) -> Result<Document> {
        let mut warnings = Vec::new();
        let extensions: Vec<&str> = PHOTO_EXTENSIONS
            .iter()
            .map(|e| e.trim_start_matches('.'))
            .collect();
        let file_size = validate_input_file(path, &extensions, &mut warnings)?;

        let bytes = read_bytes(path)?;
        let (width, height, format) = probe_dimensions(&bytes);
        if width.is_none() {
            warnings.push("Could not decode image dimensions".to_string());
        }
        let size = width.zip(height);

        let photo_exif = read_exif(path);
        let content = render_markdown(path, &photo_exif, size, &format);

        let mut metadata = Metadata::new("photo");
        metadata.file_size = file_size;
        metadata.title = path.file_stem().map(|s| s.to_string_lossy().into_owned());
        if let Some(artist) = &photo_exif.artist {
            metadata = metadata.with_author(artist.clone());
        }
        if let Some(taken) = &photo_exif.taken_at {
            metadata
                .custom_fields
                .insert("taken_at".to_string(), serde_json::json!(taken));
        }
        if let Some(make) = &photo_exif.camera_make {
            metadata
                .custom_fields
                .insert("camera_make".to_string(), serde_json::json!(make));
        }
        if let Some(model) = &photo_exif.camera_model {
            metadata
                .custom_fields
                .insert("camera_model".to_string(), serde_json::json!(model));
        }
        if let (Some(lat), Some(lon)) = (photo_exif.gps_latitude, photo_exif.gps_longitude) {
            metadata.custom_fields.insert(
                "gps".to_string(),
                serde_json::json!({ "latitude": lat, "longitude": lon }),
            );
        }

        let mut image = ImageReference::new("img_001");
        image.file_path = Some(path.to_string_lossy().into_owned());
        image.size = size;
        image.format = format;

        let mut processing_info = ProcessingInfo::new(self.name(), self.version());
        processing_info.warnings = warnings;
        processing_info.options_used = options.as_record();

        let words = word_count(&content);
        let mut document = Document::new(metadata, processing_info);
        document.content = content;
        document.images = vec![image];
        document.word_count = words;
        document.estimated_reading_time = 1;
        Ok(document)
    }

    fn extensions(&self) -> &[&str] {
        PHOTO_EXTENSIONS
    }

    fn supports(&self, path: &Path) -> bool {
        matches!(
            crate::core::format::detect_format_from_file(path),
            Some("png" | "jpeg" | "gif" | "webp" | "tiff" | "bmp" | "heic")
        )
    }

    fn priority(&self) -> i32 {
        50
    }
}
