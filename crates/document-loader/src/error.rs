//! Ingestion errors

use thiserror::Error;

/// Terminal failures while turning uploaded bytes into normalized text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Corrupt document: {0}")]
    CorruptDocument(String),

    #[error("Document contains no extractable text")]
    EmptyDocument,
}

impl NormalizeError {
    /// Machine-readable kind surfaced to clients
    pub fn code(&self) -> &'static str {
        match self {
            NormalizeError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            NormalizeError::CorruptDocument(_) => "CORRUPT_DOCUMENT",
            NormalizeError::EmptyDocument => "EMPTY_DOCUMENT",
        }
    }
}
