//! Byte-encoding detection with a UTF-8 → chardetng → latin-1 cascade.

use tracing::debug;

/// How the bytes were decoded, for the processing-info warning trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedWith {
    /// Strict UTF-8 decode succeeded.
    Utf8,
    /// chardetng guessed an encoding; carries its name.
    Detected(String),
    /// Final fallback: latin-1, which never fails.
    Latin1,
    /// The caller forced an encoding by name.
    Forced(String),
}

impl DecodedWith {
    pub fn describe(&self) -> String {
        match self {
            DecodedWith::Utf8 => "utf-8".to_string(),
            DecodedWith::Detected(name) => format!("{} (detected)", name),
            DecodedWith::Latin1 => "latin-1 (fallback)".to_string(),
            DecodedWith::Forced(name) => format!("{} (forced)", name),
        }
    }
}

/// Decode bytes to text.
///
/// Cascade: forced encoding (if given and known) → strict UTF-8 → chardetng
/// probe → latin-1 with byte-for-byte mapping. The last step cannot fail, so
/// this function always produces text.
pub fn decode_bytes(bytes: &[u8], forced_encoding: Option<&str>) -> (String, DecodedWith) {
    if let Some(name) = forced_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (text, _, had_errors) = encoding.decode(bytes);
        if !had_errors {
            return (text.into_owned(), DecodedWith::Forced(name.to_string()));
        }
        debug!(encoding = name, "forced encoding had decode errors, falling back");
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return (text.to_string(), DecodedWith::Utf8);
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    let (text, _, had_errors) = encoding.decode(bytes);
    if !had_errors {
        return (
            text.into_owned(),
            DecodedWith::Detected(encoding.name().to_string()),
        );
    }

    // Latin-1 maps every byte to the code point of the same value.
    let text: String = bytes.iter().map(|&b| b as char).collect();
    (text, DecodedWith::Latin1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_utf8() {
        let (text, how) = decode_bytes("Grüße — 珈琲".as_bytes(), None);
        assert_eq!(text, "Grüße — 珈琲");
        assert_eq!(how, DecodedWith::Utf8);
    }

    #[test]
    fn test_latin1_bytes_detected() {
        // "café" in ISO-8859-1: the 0xE9 byte is invalid UTF-8.
        let bytes = [b'c', b'a', b'f', 0xE9];
        let (text, how) = decode_bytes(&bytes, None);
        assert!(text.contains("caf"));
        assert_ne!(how, DecodedWith::Utf8);
    }

    #[test]
    fn test_forced_encoding() {
        let bytes = [b'c', b'a', b'f', 0xE9];
        let (text, how) = decode_bytes(&bytes, Some("windows-1252"));
        assert_eq!(text, "café");
        assert_eq!(how, DecodedWith::Forced("windows-1252".to_string()));
    }

    #[test]
    fn test_unknown_forced_encoding_falls_through() {
        let (_, how) = decode_bytes(b"plain ascii", Some("not-an-encoding"));
        assert_eq!(how, DecodedWith::Utf8);
    }

    #[test]
    fn test_never_fails() {
        // Arbitrary binary garbage still decodes via some path.
        let bytes: Vec<u8> = (0u8..=255).collect();
        let (text, _) = decode_bytes(&bytes, None);
        assert!(!text.is_empty());
    }
}
