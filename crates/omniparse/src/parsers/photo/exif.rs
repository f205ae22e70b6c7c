//! EXIF metadata extraction for the photo pipeline.

use exif::{Exif, In, Tag, Value};
use std::io::BufReader;
use std::path::Path;

/// The EXIF fields the photo pipeline surfaces.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PhotoExif {
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub lens_model: Option<String>,
    pub exposure_time: Option<String>,
    pub f_number: Option<String>,
    pub iso: Option<String>,
    pub focal_length: Option<String>,
    pub taken_at: Option<String>,
    pub orientation: Option<u16>,
    pub gps_latitude: Option<f64>,
    pub gps_longitude: Option<f64>,
    pub copyright: Option<String>,
    pub artist: Option<String>,
}

/// Read EXIF from a photo file. Photos without EXIF yield the empty default.
pub fn read_exif(path: &Path) -> PhotoExif {
    let Ok(file) = std::fs::File::open(path) else {
        return PhotoExif::default();
    };
    let mut reader = BufReader::new(file);
    let Ok(exif) = exif::Reader::new().read_from_container(&mut reader) else {
        return PhotoExif::default();
    };

    let field_string = |tag: Tag| {
        exif.get_field(tag, In::PRIMARY)
            .map(|f| f.display_value().with_unit(&exif).to_string())
            .map(|s| s.trim().trim_matches('"').to_string())
            .filter(|s| !s.is_empty())
    };

    let orientation = exif
        .get_field(Tag::Orientation, In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .map(|v| v as u16);

    PhotoExif {
        camera_make: field_string(Tag::Make),
        camera_model: field_string(Tag::Model),
        lens_model: field_string(Tag::LensModel),
        exposure_time: field_string(Tag::ExposureTime),
        f_number: field_string(Tag::FNumber),
        iso: field_string(Tag::PhotographicSensitivity),
        focal_length: field_string(Tag::FocalLength),
        taken_at: field_string(Tag::DateTimeOriginal).or_else(|| field_string(Tag::DateTime)),
        orientation,
        gps_latitude: gps_coordinate(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef),
        gps_longitude: gps_coordinate(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef),
        copyright: field_string(Tag::Copyright),
        artist: field_string(Tag::Artist),
    }
}

/// Convert a GPS degrees/minutes/seconds triple to a signed decimal.
fn gps_coordinate(exif: &Exif, value_tag: Tag, ref_tag: Tag) -> Option<f64> {
    let field = exif.get_field(value_tag, In::PRIMARY)?;
    let decimal = match &field.value {
        Value::Rational(parts) if parts.len() >= 3 => {
            dms_to_decimal(
                parts[0].to_f64(),
                parts[1].to_f64(),
                parts[2].to_f64(),
            )
        }
        _ => return None,
    };

    let reference = exif
        .get_field(ref_tag, In::PRIMARY)
        .map(|f| f.display_value().to_string())
        .unwrap_or_default();
    let reference = reference.trim().trim_matches('"');
    if reference.eq_ignore_ascii_case("S") || reference.eq_ignore_ascii_case("W") {
        Some(-decimal)
    } else {
        Some(decimal)
    }
}

/// Degrees + minutes/60 + seconds/3600.
pub fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64) -> f64 {
    degrees + minutes / 60.0 + seconds / 3600.0
}
