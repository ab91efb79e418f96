//! PDF text extraction
//!
//! Text comes from `pdf-extract`, one string per page. Pages are joined with
//! a form feed, which stays in the normalized text and starts a new page in
//! the offset map. Byte ranges refer to that joined text stream since a
//! PDF's content streams have no stable character-to-byte relation.

use pdf_extract::extract_text_from_mem_by_pages;
use tracing::debug;

use crate::error::NormalizeError;
use crate::offset_map::{LocationStyle, OffsetMap, OffsetMapBuilder};

const PAGE_BREAK: char = '\x0C';

pub(crate) fn extract(raw: &[u8]) -> Result<(String, OffsetMap), NormalizeError> {
    // pdf-extract panics on some malformed inputs
    let extracted = std::panic::catch_unwind(|| extract_text_from_mem_by_pages(raw));

    let pages = match extracted {
        Ok(Ok(pages)) => pages,
        Ok(Err(e)) => {
            let error_msg = e.to_string().to_lowercase();
            if error_msg.contains("encrypted") || error_msg.contains("password") {
                return Err(NormalizeError::CorruptDocument(
                    "PDF is password protected".to_string(),
                ));
            }
            return Err(NormalizeError::CorruptDocument(e.to_string()));
        }
        Err(_) => {
            return Err(NormalizeError::CorruptDocument(
                "PDF could not be parsed".to_string(),
            ));
        }
    };

    let (text, offset_map) = layout_pages(&pages);
    debug!(
        "Extracted {} characters from PDF ({} pages)",
        offset_map.len(),
        pages.len()
    );
    Ok((text, offset_map))
}

/// Join page texts with form feeds. Each form feed occupies one byte of the
/// joined stream.
fn layout_pages(pages: &[String]) -> (String, OffsetMap) {
    let mut builder = OffsetMapBuilder::new(LocationStyle::Pages);
    let mut stream_offset = 0;

    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            builder.push(PAGE_BREAK, stream_offset, PAGE_BREAK.len_utf8());
            stream_offset += PAGE_BREAK.len_utf8();
        }
        for (offset, ch) in page.char_indices() {
            builder.push(ch, stream_offset + offset, ch.len_utf8());
        }
        stream_offset += page.len();
    }
    builder.finish()
}
