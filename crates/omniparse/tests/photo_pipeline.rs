//! Photo pipeline end-to-end.

#![cfg(feature = "photo")]

use omniparse::{ParseOptions, parse_document};

fn write_photo(dir: &tempfile::TempDir, name: &str, w: u32, h: u32) -> String {
    let path = dir.path().join(name);
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([120, 80, 40, 255]));
    image::DynamicImage::ImageRgba8(img)
        .save_with_format(&path, image::ImageFormat::Png)
        .unwrap();
    path.to_string_lossy().into_owned()
}

#[tokio::test]
async fn test_photo_document() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_photo(&dir, "holiday.png", 64, 48);
    let doc = parse_document(&source, &ParseOptions::default()).await.unwrap();

    assert_eq!(doc.metadata.original_format, "photo");
    assert_eq!(doc.metadata.title.as_deref(), Some("holiday"));
    assert!(doc.content.starts_with("# Photo: holiday.png"));
    assert!(doc.content.contains("64x48"));
    assert!(doc.chapters.is_empty());

    assert_eq!(doc.images.len(), 1);
    assert_eq!(doc.images[0].image_id, "img_001");
    assert_eq!(doc.images[0].size, Some((64, 48)));
    assert_eq!(doc.images[0].format, "png");
    assert_eq!(doc.images[0].file_path.as_deref(), Some(source.as_str()));
    assert_eq!(doc.estimated_reading_time, 1);
}

#[tokio::test]
async fn test_photo_round_trips_through_json() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_photo(&dir, "snap.png", 10, 10);
    let doc = parse_document(&source, &ParseOptions::default()).await.unwrap();

    let json_path = dir.path().join("photo.json");
    doc.save_json(&json_path).unwrap();
    let restored = omniparse::Document::load_json(&json_path).unwrap();
    assert_eq!(doc, restored);
}
