//! Document loading and normalization
//!
//! Converts uploaded bytes into a canonical text plus an [`OffsetMap`] that
//! translates normalized positions back to the original layout. Text is
//! never cleaned up: whitespace and line breaks survive so that every
//! detector position stays meaningful in the source file.

mod docx;
pub mod error;
pub mod offset_map;
mod pdf;
mod plain;
pub mod text;

use std::path::Path;
use std::sync::Arc;

use shared_types::{hash_document, MimeKind};
use tracing::debug;

pub use error::NormalizeError;
pub use offset_map::{Breakpoint, Location, LocationStyle, OffsetMap, OffsetMapBuilder};
pub use text::NormalizedText;

/// Resolve the declared extension of an uploaded file name.
pub fn detect_kind(filename: &str) -> Result<MimeKind, NormalizeError> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    MimeKind::from_extension(ext)
        .ok_or_else(|| NormalizeError::UnsupportedFormat(format!("'{}'", filename)))
}

/// Extract normalized text and its offset map from raw document bytes.
pub fn normalize(
    raw_bytes: &[u8],
    mime_kind: MimeKind,
) -> Result<(NormalizedText, OffsetMap), NormalizeError> {
    if raw_bytes.is_empty() {
        return Err(NormalizeError::EmptyDocument);
    }

    let (text, offset_map) = match mime_kind {
        MimeKind::PlainText => plain::extract(raw_bytes)?,
        MimeKind::Pdf => pdf::extract(raw_bytes)?,
        MimeKind::WordDocument => docx::extract(raw_bytes)?,
    };

    let text = NormalizedText::new(text);
    if text.is_blank() {
        return Err(NormalizeError::EmptyDocument);
    }

    debug!(
        "Normalized {:?} document: {} bytes -> {} chars, {} breakpoints",
        mime_kind,
        raw_bytes.len(),
        text.len(),
        offset_map.breakpoints().len()
    );

    Ok((text, offset_map))
}

/// One uploaded document after normalization.
///
/// Immutable; the text is behind an `Arc` so detectors running on worker
/// threads can share it without copying.
#[derive(Debug, Clone)]
pub struct Document {
    mime_kind: MimeKind,
    text: Arc<NormalizedText>,
    offset_map: OffsetMap,
    document_ref: String,
}

impl Document {
    pub fn load(raw_bytes: Vec<u8>, mime_kind: MimeKind) -> Result<Self, NormalizeError> {
        let (text, offset_map) = normalize(&raw_bytes, mime_kind)?;
        let document_ref = hash_document(&raw_bytes);
        Ok(Self {
            mime_kind,
            text: Arc::new(text),
            offset_map,
            document_ref,
        })
    }

    /// Load a plain-text document from a string.
    pub fn from_text(text: &str) -> Result<Self, NormalizeError> {
        Self::load(text.as_bytes().to_vec(), MimeKind::PlainText)
    }

    pub fn mime_kind(&self) -> MimeKind {
        self.mime_kind
    }

    pub fn text(&self) -> &NormalizedText {
        &self.text
    }

    pub fn shared_text(&self) -> Arc<NormalizedText> {
        Arc::clone(&self.text)
    }

    pub fn offset_map(&self) -> &OffsetMap {
        &self.offset_map
    }

    /// SHA-256 of the raw bytes
    pub fn document_ref(&self) -> &str {
        &self.document_ref
    }
}
