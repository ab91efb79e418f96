//! Plain-text (UTF-8) extraction

use crate::error::NormalizeError;
use crate::offset_map::{LocationStyle, OffsetMap, OffsetMapBuilder};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

pub(crate) fn extract(raw: &[u8]) -> Result<(String, OffsetMap), NormalizeError> {
    let (body, base) = match raw.strip_prefix(UTF8_BOM) {
        Some(rest) => (rest, UTF8_BOM.len()),
        None => (raw, 0),
    };

    let text = std::str::from_utf8(body).map_err(|e| {
        NormalizeError::CorruptDocument(format!(
            "invalid UTF-8 at byte {}",
            base + e.valid_up_to()
        ))
    })?;

    let mut builder = OffsetMapBuilder::new(LocationStyle::Lines);
    for (i, ch) in text.char_indices() {
        builder.push(ch, base + i, ch.len_utf8());
    }
    Ok(builder.finish())
}
