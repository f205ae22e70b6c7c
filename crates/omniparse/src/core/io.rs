//! File validation helpers shared by the pipelines.

use crate::{OmniparseError, Result};
use std::path::Path;

/// Files larger than this trigger a size warning (not an error).
pub const LARGE_FILE_WARN_BYTES: u64 = 500 * 1024 * 1024;

/// Ensure the path exists and points at a regular file.
///
/// Returns `FileRead` otherwise; the dispatcher relies on this surfacing
/// before any pipeline-specific validation runs.
pub fn validate_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(OmniparseError::file_read(format!(
            "File not found: {}",
            path.display()
        )));
    }
    if !path.is_file() {
        return Err(OmniparseError::file_read(format!(
            "Not a regular file: {}",
            path.display()
        )));
    }
    Ok(())
}

/// Pipeline-entry validation: exists, regular, expected extension, non-empty.
///
/// Returns the file size so pipelines can stash it into metadata without a
/// second stat. Appends a warning for suspiciously large files instead of
/// failing.
pub fn validate_input_file(
    path: &Path,
    expected_extensions: &[&str],
    warnings: &mut Vec<String>,
) -> Result<u64> {
    validate_file_exists(path)?;

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    if !expected_extensions.iter().any(|e| *e == ext) {
        return Err(OmniparseError::validation(format!(
            "Expected {:?} file, got: {}",
            expected_extensions,
            path.display()
        )));
    }

    let size = std::fs::metadata(path)
        .map_err(|e| {
            OmniparseError::file_read_with_source(format!("Cannot stat {}", path.display()), e)
        })?
        .len();

    if size == 0 {
        return Err(OmniparseError::validation(format!(
            "File is empty: {}",
            path.display()
        )));
    }
    if size > LARGE_FILE_WARN_BYTES {
        warnings.push(format!(
            "Large file ({} MiB); parsing may be slow",
            size / (1024 * 1024)
        ));
    }

    Ok(size)
}

/// Read the whole file, mapping IO failures to `FileRead`.
pub fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        OmniparseError::file_read_with_source(format!("Cannot read {}", path.display()), e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_is_file_read() {
        let err = validate_file_exists(Path::new("/no/such/file.txt")).unwrap_err();
        assert!(matches!(err, OmniparseError::FileRead { .. }));
    }

    #[test]
    fn test_directory_is_not_a_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate_file_exists(dir.path()).unwrap_err();
        assert!(matches!(err, OmniparseError::FileRead { .. }));
    }

    #[test]
    fn test_empty_file_is_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::File::create(&path).unwrap();
        let mut warnings = Vec::new();
        let err = validate_input_file(&path, &["txt"], &mut warnings).unwrap_err();
        assert!(matches!(err, OmniparseError::Validation { .. }));
    }

    #[test]
    fn test_wrong_extension_is_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, b"content").unwrap();
        let mut warnings = Vec::new();
        let err = validate_input_file(&path, &["epub"], &mut warnings).unwrap_err();
        assert!(matches!(err, OmniparseError::Validation { .. }));
    }

    #[test]
    fn test_valid_file_returns_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"hello world").unwrap();
        let mut warnings = Vec::new();
        let size = validate_input_file(&path, &["txt"], &mut warnings).unwrap();
        assert_eq!(size, 11);
        assert!(warnings.is_empty());
    }
}
