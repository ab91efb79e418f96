//! Mapping from normalized-text positions back to the original document
//!
//! The map is stored as a sorted list of breakpoints. Each breakpoint opens a
//! run of characters that occupy the same number of bytes each and sit
//! back-to-back in the source, so a lookup is one binary search plus a
//! multiplication. A pure-ASCII or pure-CJK text needs a single breakpoint
//! regardless of its size.

use std::fmt;
use std::ops::Range;

use shared_types::Span;

/// Start of a run of equally wide, contiguous characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breakpoint {
    /// First normalized index covered by this run
    pub norm_start: usize,
    /// Source byte offset of that character
    pub byte_start: usize,
    /// Source bytes per character in this run
    pub width: usize,
}

/// How positions are described to a reader of the original document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationStyle {
    Lines,
    Paragraphs,
    Pages,
}

/// A resolved location in the original document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub byte_range: Range<usize>,
    pub page: Option<usize>,
    /// 1-based line (or paragraph) number, counted within the page when paged
    pub line: usize,
    /// 1-based column in characters
    pub column: usize,
    pub style: LocationStyle,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.style, self.page) {
            (LocationStyle::Pages, Some(page)) => write!(
                f,
                "page {}, line {}, column {}",
                page, self.line, self.column
            ),
            (LocationStyle::Paragraphs, _) => {
                write!(f, "paragraph {}, column {}", self.line, self.column)
            }
            _ => write!(f, "line {}, column {}", self.line, self.column),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetMap {
    breakpoints: Vec<Breakpoint>,
    len: usize,
    end_byte: usize,
    line_starts: Vec<usize>,
    page_starts: Vec<usize>,
    style: LocationStyle,
}

impl OffsetMap {
    /// Map for a string whose "original bytes" are its own UTF-8 encoding.
    pub fn for_text(text: &str) -> Self {
        let mut builder = OffsetMapBuilder::new(LocationStyle::Lines);
        for (i, ch) in text.char_indices() {
            builder.push(ch, i, ch.len_utf8());
        }
        builder.finish().1
    }

    /// Number of normalized characters covered.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    /// Source bytes of the character at `index`.
    ///
    /// `index == len()` is the end-of-text position and yields an empty range
    /// just past the last mapped byte. Anything beyond that is `None`.
    pub fn byte_range(&self, index: usize) -> Option<Range<usize>> {
        if index == self.len {
            return Some(self.end_byte..self.end_byte);
        }
        if index > self.len {
            return None;
        }
        let bp = self.breakpoint_for(index);
        let start = bp.byte_start + (index - bp.norm_start) * bp.width;
        Some(start..start + bp.width)
    }

    /// Normalized index of the character whose source bytes contain `byte`.
    ///
    /// Bytes past the last character map to `len()`.
    pub fn index_at_byte(&self, byte: usize) -> usize {
        if byte >= self.end_byte || self.breakpoints.is_empty() {
            return self.len;
        }
        let i = self
            .breakpoints
            .partition_point(|bp| bp.byte_start <= byte)
            .saturating_sub(1);
        let bp = &self.breakpoints[i];
        if byte < bp.byte_start || bp.width == 0 {
            return bp.norm_start;
        }
        let index = bp.norm_start + (byte - bp.byte_start) / bp.width;
        let run_end = self
            .breakpoints
            .get(i + 1)
            .map(|next| next.norm_start)
            .unwrap_or(self.len);
        index.min(run_end.saturating_sub(1))
    }

    /// Resolve a normalized index to a reader-facing location.
    pub fn locate(&self, index: usize) -> Location {
        let index = index.min(self.len);
        let byte_range = self
            .byte_range(index)
            .unwrap_or(self.end_byte..self.end_byte);

        let line_idx = self
            .line_starts
            .partition_point(|&s| s <= index)
            .saturating_sub(1);
        let line_start = self.line_starts.get(line_idx).copied().unwrap_or(0);
        let column = index - line_start + 1;

        let (page, line) = if self.page_starts.is_empty() {
            (None, line_idx + 1)
        } else {
            let page_idx = self
                .page_starts
                .partition_point(|&s| s <= index)
                .saturating_sub(1);
            let page_start = self.page_starts[page_idx];
            let first_line = self.line_starts.partition_point(|&s| s < page_start);
            (Some(page_idx + 1), line_idx - first_line + 1)
        };

        Location {
            byte_range,
            page,
            line,
            column,
            style: self.style,
        }
    }

    /// Human-readable position of a span's start.
    pub fn describe(&self, span: Span) -> String {
        self.locate(span.start).to_string()
    }

    fn breakpoint_for(&self, index: usize) -> &Breakpoint {
        let i = self
            .breakpoints
            .partition_point(|bp| bp.norm_start <= index)
            .saturating_sub(1);
        &self.breakpoints[i]
    }
}

/// Accumulates normalized text and its offset map in one pass.
#[derive(Debug)]
pub struct OffsetMapBuilder {
    text: String,
    breakpoints: Vec<Breakpoint>,
    len: usize,
    end_byte: usize,
    line_starts: Vec<usize>,
    page_starts: Vec<usize>,
    style: LocationStyle,
}

impl OffsetMapBuilder {
    pub fn new(style: LocationStyle) -> Self {
        Self {
            text: String::new(),
            breakpoints: Vec::new(),
            len: 0,
            end_byte: 0,
            line_starts: vec![0],
            page_starts: if style == LocationStyle::Pages {
                vec![0]
            } else {
                Vec::new()
            },
            style,
        }
    }

    /// Append one character that came from `byte_len` source bytes at
    /// `byte_start`. Calls must arrive in non-decreasing source order.
    ///
    /// A `'\n'` starts a new line (or paragraph); a form feed also starts a
    /// new page when the map is paged.
    pub fn push(&mut self, ch: char, byte_start: usize, byte_len: usize) {
        let index = self.append(ch, byte_start, byte_len);
        match ch {
            '\n' => self.line_starts.push(index + 1),
            '\x0C' if self.style == LocationStyle::Pages => {
                self.line_starts.push(index + 1);
                self.page_starts.push(index + 1);
            }
            _ => {}
        }
    }

    /// Append a break character produced by markup. It opens a new line only
    /// when `starts_line` is set, so a soft line break inside a paragraph
    /// keeps the paragraph count.
    pub fn push_break(
        &mut self,
        ch: char,
        byte_start: usize,
        byte_len: usize,
        starts_line: bool,
    ) {
        let index = self.append(ch, byte_start, byte_len);
        if starts_line {
            self.line_starts.push(index + 1);
        }
    }

    fn append(&mut self, ch: char, byte_start: usize, byte_len: usize) -> usize {
        let index = self.len;
        let continues_run = self.breakpoints.last().is_some_and(|bp| {
            bp.width == byte_len && bp.byte_start + (index - bp.norm_start) * bp.width == byte_start
        });
        if !continues_run {
            self.breakpoints.push(Breakpoint {
                norm_start: index,
                byte_start,
                width: byte_len,
            });
        }

        self.text.push(ch);
        self.len += 1;
        self.end_byte = self.end_byte.max(byte_start + byte_len);
        index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn finish(self) -> (String, OffsetMap) {
        let map = OffsetMap {
            breakpoints: self.breakpoints,
            len: self.len,
            end_byte: self.end_byte,
            line_starts: self.line_starts,
            page_starts: self.page_starts,
            style: self.style,
        };
        (self.text, map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ascii_text_is_one_breakpoint() {
        let map = OffsetMap::for_text("Tenant shall pay rent.");
        assert_eq!(map.breakpoints().len(), 1);
        assert_eq!(map.byte_range(7), Some(7..8));
        assert_eq!(map.len(), 22);
    }

    #[test]
    fn test_mixed_width_runs() {
        // "ab" (1 byte each) + "民法" (3 bytes each) + "c"
        let map = OffsetMap::for_text("ab民法c");
        assert_eq!(map.breakpoints().len(), 3);
        assert_eq!(map.byte_range(0), Some(0..1));
        assert_eq!(map.byte_range(2), Some(2..5));
        assert_eq!(map.byte_range(3), Some(5..8));
        assert_eq!(map.byte_range(4), Some(8..9));
        assert_eq!(map.byte_range(5), Some(9..9));
        assert_eq!(map.byte_range(6), None);
    }

    #[test]
    fn test_index_at_byte_round_trips() {
        let text = "甲方应当支付 rent。";
        let map = OffsetMap::for_text(text);
        for (ci, (bi, _)) in text.char_indices().enumerate() {
            assert_eq!(map.index_at_byte(bi), ci);
        }
        assert_eq!(map.index_at_byte(text.len()), map.len());
    }

    #[test]
    fn test_locate_lines() {
        let map = OffsetMap::for_text("first\nsecond line\nthird");
        let loc = map.locate(8);
        assert_eq!((loc.line, loc.column), (2, 3));
        assert_eq!(loc.to_string(), "line 2, column 3");
        assert_eq!(map.locate(0).to_string(), "line 1, column 1");
    }

    #[test]
    fn test_locate_pages_counts_lines_within_page() {
        let mut builder = OffsetMapBuilder::new(LocationStyle::Pages);
        for (i, ch) in "p1\nl2\x0Cpage two\nx".char_indices() {
            builder.push(ch, i, ch.len_utf8());
        }
        let (_, map) = builder.finish();

        let loc = map.locate(3);
        assert_eq!((loc.page, loc.line, loc.column), (Some(1), 2, 1));

        let loc = map.locate(7);
        assert_eq!((loc.page, loc.line, loc.column), (Some(2), 1, 2));
        assert_eq!(loc.to_string(), "page 2, line 1, column 2");

        let loc = map.locate(15);
        assert_eq!((loc.page, loc.line, loc.column), (Some(2), 2, 1));
    }

    #[test]
    fn test_synthetic_characters_keep_monotonic_bytes() {
        let mut builder = OffsetMapBuilder::new(LocationStyle::Paragraphs);
        builder.push('A', 10, 1);
        builder.push('&', 11, 5);
        builder.push('B', 16, 1);
        builder.push('\n', 17, 6);
        builder.push('C', 40, 1);
        let (text, map) = builder.finish();

        assert_eq!(text, "A&B\nC");
        assert_eq!(map.byte_range(1), Some(11..16));
        assert_eq!(map.byte_range(4), Some(40..41));
        assert_eq!(map.locate(4).to_string(), "paragraph 2, column 1");
    }

    #[test]
    fn test_soft_break_keeps_paragraph() {
        let mut builder = OffsetMapBuilder::new(LocationStyle::Paragraphs);
        builder.push('a', 0, 1);
        builder.push_break('\n', 1, 7, false);
        builder.push('b', 8, 1);
        builder.push_break('\n', 9, 6, true);
        builder.push('c', 15, 1);
        let (text, map) = builder.finish();

        assert_eq!(text, "a\nb\nc");
        assert_eq!(map.locate(2).to_string(), "paragraph 1, column 3");
        assert_eq!(map.locate(4).to_string(), "paragraph 2, column 1");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: every character maps to exactly its own UTF-8 bytes
        #[test]
        fn utf8_identity_map_is_exact(text in "\\PC{0,64}") {
            let map = OffsetMap::for_text(&text);
            prop_assert_eq!(map.len(), text.chars().count());
            for (ci, (bi, ch)) in text.char_indices().enumerate() {
                prop_assert_eq!(map.byte_range(ci), Some(bi..bi + ch.len_utf8()));
            }
        }

        /// Property: byte ranges never go backwards
        #[test]
        fn byte_ranges_are_monotonic(text in "[a-z民法典第条\\n ]{0,80}") {
            let map = OffsetMap::for_text(&text);
            let mut last_end = 0;
            for i in 0..map.len() {
                let range = map.byte_range(i).unwrap();
                prop_assert!(range.start >= last_end);
                last_end = range.end;
            }
        }

        /// Property: breakpoints never outnumber characters
        #[test]
        fn breakpoints_are_sparse(text in "\\PC{0,64}") {
            let map = OffsetMap::for_text(&text);
            prop_assert!(map.breakpoints().len() <= text.chars().count());
        }
    }
}
