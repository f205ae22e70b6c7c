//! QR-code detection on rendered PDF pages.
//!
//! Decoding uses pre-rendered page images; URL fetching for decoded codes is
//! an external collaborator (see the QR merge processor).

use crate::types::{QrBoundingBox, QrCodeReference};
use image::DynamicImage;
use tracing::{debug, warn};

/// Scan rendered pages for QR codes. Detection failures on individual pages
/// are logged and skipped.
pub fn scan_pages(pages: &[DynamicImage]) -> Vec<QrCodeReference> {
    let mut codes = Vec::new();

    for (page_index, page) in pages.iter().enumerate() {
        let gray = page.to_luma8();
        let mut prepared = rqrr::PreparedImage::prepare(gray);
        for grid in prepared.detect_grids() {
            let bounds = grid.bounds;
            match grid.decode() {
                Ok((_meta, content)) => {
                    let qr_id = format!("qr_{:03}", codes.len() + 1);
                    let mut reference = QrCodeReference::new(qr_id, content, page_index + 1);
                    reference.source_image = Some(format!("page_{:03}", page_index + 1));
                    reference.position = bounding_box(&bounds);
                    debug!(page = page_index + 1, "Decoded QR code");
                    codes.push(reference);
                }
                Err(e) => {
                    warn!(page = page_index + 1, "QR grid failed to decode: {}", e);
                }
            }
        }
    }

    codes
}

fn bounding_box(points: &[rqrr::Point; 4]) -> QrBoundingBox {
    let xs: Vec<i32> = points.iter().map(|p| p.x).collect();
    let ys: Vec<i32> = points.iter().map(|p| p.y).collect();
    let min_x = xs.iter().copied().min().unwrap_or(0);
    let max_x = xs.iter().copied().max().unwrap_or(0);
    let min_y = ys.iter().copied().min().unwrap_or(0);
    let max_y = ys.iter().copied().max().unwrap_or(0);
    QrBoundingBox {
        x: min_x,
        y: min_y,
        w: max_x - min_x,
        h: max_y - min_y,
    }
}
