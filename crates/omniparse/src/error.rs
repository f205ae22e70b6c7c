//! Error types for omniparse.
//!
//! All fallible operations in the crate return [`Result`], whose error type is
//! [`OmniparseError`]. The taxonomy mirrors what callers need to branch on:
//!
//! - `UnsupportedFormat` - no parser is registered for the input
//! - `FileRead` - the path is missing, not a regular file, or unreadable
//! - `Validation` - the input fails a pipeline's integrity checks (wrong
//!   extension, zero-byte file, malformed options)
//! - `Parsing` - a format library failed, or extraction produced nothing
//!   usable; carries the originating error and the pipeline name
//! - `Network` - a URL fetch failed (timeout, connection error, HTTP status)
//!
//! # Propagation policy
//!
//! `UnsupportedFormat`, `FileRead`, and `Validation` are raised as-is and are
//! never rewrapped. Any other error surfacing inside a pipeline is wrapped in
//! `Parsing` with the pipeline name attached. IO errors bubble up unchanged
//! via `From<std::io::Error>`.
use thiserror::Error;

/// Result type alias using `OmniparseError`.
pub type Result<T> = std::result::Result<T, OmniparseError>;

/// Main error type for all omniparse operations.
#[derive(Debug, Error)]
pub enum OmniparseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("File read error: {message}")]
    FileRead {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Parsing error in '{parser}': {message}")]
    Parsing {
        message: String,
        parser: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Plugin error in '{plugin_name}': {message}")]
    Plugin { message: String, plugin_name: String },

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("{0}")]
    Other(String),
}

impl OmniparseError {
    /// Create a FileRead error.
    pub fn file_read<S: Into<String>>(message: S) -> Self {
        Self::FileRead {
            message: message.into(),
            source: None,
        }
    }

    /// Create a FileRead error with source.
    pub fn file_read_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::FileRead {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a Validation error.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
            source: None,
        }
    }

    /// Create a Validation error with source.
    pub fn validation_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Validation {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a Parsing error tagged with the pipeline that raised it.
    pub fn parsing<S: Into<String>, P: Into<String>>(message: S, parser: P) -> Self {
        Self::Parsing {
            message: message.into(),
            parser: parser.into(),
            source: None,
        }
    }

    /// Create a Parsing error with the originating error preserved.
    pub fn parsing_with_source<S, P, E>(message: S, parser: P, source: E) -> Self
    where
        S: Into<String>,
        P: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Parsing {
            message: message.into(),
            parser: parser.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a Network error.
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Create a Network error with source.
    pub fn network_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a Serialization error.
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        Self::Serialization {
            message: message.into(),
            source: None,
        }
    }

    /// True for the error kinds that pipelines must pass through unchanged.
    ///
    /// Everything else raised inside a pipeline gets wrapped in `Parsing`.
    pub fn is_passthrough(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFormat(_)
                | Self::FileRead { .. }
                | Self::Validation { .. }
                | Self::Network { .. }
                | Self::Io(_)
        )
    }

    /// Wrap a non-passthrough error in `Parsing`, tagging the pipeline name.
    pub fn into_parsing(self, parser: &str) -> Self {
        if self.is_passthrough() || matches!(self, Self::Parsing { .. }) {
            return self;
        }
        let message = self.to_string();
        Self::Parsing {
            message,
            parser: parser.to_string(),
            source: Some(Box::new(self)),
        }
    }
}

impl From<serde_json::Error> for OmniparseError {
    fn from(err: serde_json::Error) -> Self {
        OmniparseError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}
