//! Format detection: extension normalization and magic-byte sniffing.

use std::path::Path;

/// Normalize a path or bare extension to a lowercase dotted extension.
///
/// Accepts `"book.EPUB"`, `".epub"`, or `"epub"` and yields `".epub"`.
/// Returns `None` when no extension can be derived.
pub fn normalize_extension(path_or_ext: &str) -> Option<String> {
    let trimmed = path_or_ext.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Bare extension forms first: ".epub" or "epub" without any path parts.
    if !trimmed.contains('/') && !trimmed.contains('\\') {
        let bare = trimmed.strip_prefix('.').unwrap_or(trimmed);
        if !bare.is_empty() && !bare.contains('.') {
            return Some(format!(".{}", bare.to_lowercase()));
        }
    }

    Path::new(trimmed)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| format!(".{}", e.to_lowercase()))
}

/// Sniff a format name from leading file bytes.
///
/// Used by `supports` predicates when the extension lies or is missing.
/// Returns the lowercase short name (`"pdf"`, `"epub"`, `"zip"`, `"png"`, ...)
/// or `None` when the bytes are not recognizable.
pub fn detect_format_from_bytes(bytes: &[u8]) -> Option<&'static str> {
    let kind = infer::get(bytes)?;
    match kind.mime_type() {
        "application/pdf" => Some("pdf"),
        "application/epub+zip" => Some("epub"),
        "application/zip" => Some("zip"),
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => Some("docx"),
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpeg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/tiff" => Some("tiff"),
        "image/bmp" => Some("bmp"),
        "image/heif" | "image/heic" => Some("heic"),
        _ => None,
    }
}

/// Sniff the format of a file on disk by reading its leading bytes.
pub fn detect_format_from_file(path: &Path) -> Option<&'static str> {
    use std::io::Read;

    let mut file = std::fs::File::open(path).ok()?;
    let mut head = [0u8; 8192];
    let n = file.read(&mut head).ok()?;
    detect_format_from_bytes(&head[..n])
}
