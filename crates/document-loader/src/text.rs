//! Normalized text shared read-only by all detectors

use std::ops::Range;

use shared_types::Span;

use crate::offset_map::OffsetMap;

/// Canonical text of a document, addressed by code-point index.
///
/// Detectors that search with byte-oriented tools (regexes, `str::find`)
/// convert their matches with [`NormalizedText::char_span`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    text: String,
    index: OffsetMap,
}

impl NormalizedText {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let index = OffsetMap::for_text(&text);
        Self { text, index }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in code points.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// True when the text has no non-whitespace character.
    pub fn is_blank(&self) -> bool {
        self.text.chars().all(char::is_whitespace)
    }

    /// Code-point index of the character starting at `byte`.
    pub fn char_index(&self, byte: usize) -> usize {
        self.index.index_at_byte(byte)
    }

    /// Byte offset in [`NormalizedText::as_str`] of code point `index`.
    pub fn byte_offset(&self, index: usize) -> usize {
        self.index
            .byte_range(index)
            .map(|r| r.start)
            .unwrap_or(self.text.len())
    }

    /// Convert a byte range of [`NormalizedText::as_str`] to a code-point span.
    pub fn char_span(&self, bytes: Range<usize>) -> Span {
        Span::new(self.char_index(bytes.start), self.char_index(bytes.end))
    }

    /// Text covered by a code-point span (clamped to the text).
    pub fn slice(&self, span: Span) -> &str {
        let start = self.byte_offset(span.start.min(self.len()));
        let end = self.byte_offset(span.end.min(self.len())).max(start);
        &self.text[start..end]
    }
}

impl From<&str> for NormalizedText {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}
