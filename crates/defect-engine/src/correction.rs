//! Application of suggested fixes
//!
//! Produces a corrected copy of the normalized text and the list of edits
//! that were made, each located in both the original and the corrected text.

use serde::{Deserialize, Serialize};
use shared_types::{Defect, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditKind {
    Replace,
    Delete,
    Insert,
}

/// One applied fix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    pub kind: EditKind,
    pub original: String,
    pub replacement: String,
    /// Code-point span in the original text
    pub original_span: Span,
    /// Code-point span in the corrected text
    pub corrected_span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    pub corrected_text: String,
    pub edits: Vec<TextEdit>,
}

impl Correction {
    pub fn is_unchanged(&self) -> bool {
        self.edits.is_empty()
    }
}

/// Apply the suggested fixes of `defects` to `text`, left to right.
///
/// Fixes whose span overlaps an already applied one, or that fall outside
/// the text, are skipped. A zero-width span inserts its fix.
pub fn apply_fixes(text: &str, defects: &[Defect]) -> Correction {
    // byte offset of every code point, plus the end of the text
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_len = bounds.len() - 1;

    let mut fixes: Vec<(Span, &str)> = defects
        .iter()
        .filter_map(|d| d.suggested_fix.as_deref().map(|fix| (d.span, fix)))
        .filter(|(span, _)| span.fits_within(char_len))
        .collect();
    fixes.sort_by_key(|(span, _)| (span.start, span.end));

    let mut corrected = String::with_capacity(text.len());
    let mut edits = Vec::new();
    let mut cursor = 0usize;
    let mut corrected_len = 0usize;

    for (span, fix) in fixes {
        if span.start < cursor {
            continue;
        }
        let original = &text[bounds[span.start]..bounds[span.end]];
        if original == fix {
            continue;
        }

        corrected.push_str(&text[bounds[cursor]..bounds[span.start]]);
        corrected_len += span.start - cursor;

        let fix_len = fix.chars().count();
        let kind = if original.is_empty() {
            EditKind::Insert
        } else if fix.is_empty() {
            EditKind::Delete
        } else {
            EditKind::Replace
        };
        edits.push(TextEdit {
            kind,
            original: original.to_string(),
            replacement: fix.to_string(),
            original_span: span,
            corrected_span: Span::new(corrected_len, corrected_len + fix_len),
        });

        corrected.push_str(fix);
        corrected_len += fix_len;
        cursor = span.end;
    }
    corrected.push_str(&text[bounds[cursor]..]);

    Correction {
        corrected_text: corrected,
        edits,
    }
}
