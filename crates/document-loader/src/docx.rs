//! DOCX (WordprocessingML) text extraction
//!
//! A DOCX file is a ZIP archive; the body lives in `word/document.xml`.
//! Text of `<w:t>` runs is emitted in document order, `<w:tab/>` becomes a
//! tab, `<w:br/>`/`<w:cr/>` and every paragraph end become a newline. Only
//! paragraph ends start a new paragraph in the offset map.
//!
//! Byte ranges in the offset map are offsets inside `word/document.xml`.
//! An escaped entity (`&amp;`) maps one character to the whole entity and
//! synthetic characters map to the tag that produced them.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use crate::error::NormalizeError;
use crate::offset_map::{LocationStyle, OffsetMap, OffsetMapBuilder};

const DOCUMENT_PART: &str = "word/document.xml";

pub(crate) fn extract(raw: &[u8]) -> Result<(String, OffsetMap), NormalizeError> {
    let mut archive = ZipArchive::new(Cursor::new(raw)).map_err(|e| {
        NormalizeError::CorruptDocument(format!("Failed to read DOCX as ZIP: {}", e))
    })?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|_| {
            NormalizeError::CorruptDocument(format!("DOCX is missing {}", DOCUMENT_PART))
        })?
        .read_to_string(&mut xml)
        .map_err(|e| {
            NormalizeError::CorruptDocument(format!("Failed to read {}: {}", DOCUMENT_PART, e))
        })?;

    extract_from_xml(&xml)
}

fn extract_from_xml(xml: &str) -> Result<(String, OffsetMap), NormalizeError> {
    let mut reader = Reader::from_str(xml);
    let mut builder = OffsetMapBuilder::new(LocationStyle::Paragraphs);
    let mut in_text_run = false;

    loop {
        let before = reader.buffer_position();
        let event = reader.read_event().map_err(|e| {
            NormalizeError::CorruptDocument(format!(
                "Malformed {} at byte {}: {}",
                DOCUMENT_PART,
                reader.buffer_position(),
                e
            ))
        })?;
        let after = reader.buffer_position();

        match event {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text_run = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text_run = false,
                // "</" + name + ">"
                b"w:p" => {
                    let tag_len = e.len() + 3;
                    builder.push_break('\n', after - tag_len, tag_len, true)
                }
                _ => {}
            },
            Event::Empty(e) => {
                // "<" + content + "/>"
                let tag_len = e.len() + 3;
                match e.name().as_ref() {
                    b"w:tab" => builder.push('\t', after - tag_len, tag_len),
                    b"w:p" => builder.push_break('\n', after - tag_len, tag_len, true),
                    // soft line break, same paragraph
                    b"w:br" | b"w:cr" => {
                        builder.push_break('\n', after - tag_len, tag_len, false)
                    }
                    _ => {}
                }
            }
            Event::Text(e) if in_text_run => {
                let raw = std::str::from_utf8(&e).map_err(|err| {
                    NormalizeError::CorruptDocument(format!("Invalid UTF-8 in text run: {}", err))
                })?;
                push_escaped_text(&mut builder, raw, before)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(builder.finish())
}

/// Push the characters of an escaped XML text node starting at `base`.
fn push_escaped_text(
    builder: &mut OffsetMapBuilder,
    raw: &str,
    base: usize,
) -> Result<(), NormalizeError> {
    let mut offset = 0;
    while let Some(ch) = raw[offset..].chars().next() {
        if ch == '&' {
            let entity_len = raw[offset..].find(';').map(|i| i + 1).ok_or_else(|| {
                NormalizeError::CorruptDocument(format!(
                    "Unterminated entity at byte {}",
                    base + offset
                ))
            })?;
            let entity = &raw[offset..offset + entity_len];
            let decoded = quick_xml::escape::unescape(entity).map_err(|e| {
                NormalizeError::CorruptDocument(format!("Bad entity {}: {}", entity, e))
            })?;
            for decoded_ch in decoded.chars() {
                builder.push(decoded_ch, base + offset, entity_len);
            }
            offset += entity_len;
        } else {
            builder.push(ch, base + offset, ch.len_utf8());
            offset += ch.len_utf8();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const BODY: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#,
        r#"<w:p><w:r><w:t>第一条</w:t></w:r><w:r><w:tab/><w:t xml:space="preserve">甲方 &amp; 乙方</w:t></w:r></w:p>"#,
        r#"<w:p/>"#,
        r#"<w:p><w:r><w:t>Rent</w:t><w:br/><w:t>due</w:t></w:r></w:p>"#,
        r#"</w:body></w:document>"#
    );

    fn build_docx(xml: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(DOCUMENT_PART, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_extracts_runs_in_reading_order() {
        let (text, _) = extract(&build_docx(BODY)).unwrap();
        assert_eq!(text, "第一条\t甲方 & 乙方\n\nRent\ndue\n");
    }

    #[test]
    fn test_offsets_point_into_document_xml() {
        let (text, map) = extract_from_xml(BODY).unwrap();

        let first = BODY.find("第一条").unwrap();
        assert_eq!(map.byte_range(0), Some(first..first + 3));

        let amp_index = text.chars().position(|c| c == '&').unwrap();
        let amp_byte = BODY.find("&amp;").unwrap();
        assert_eq!(map.byte_range(amp_index), Some(amp_byte..amp_byte + 5));

        let tab_byte = BODY.find("<w:tab/>").unwrap();
        assert_eq!(map.byte_range(3), Some(tab_byte..tab_byte + "<w:tab/>".len()));
    }

    #[test]
    fn test_paragraph_locations() {
        let (_, map) = extract_from_xml(BODY).unwrap();
        // "Rent" starts the third paragraph
        let loc = map.locate(13);
        assert_eq!(loc.to_string(), "paragraph 3, column 1");
        // "due" follows a <w:br/> in the same paragraph
        assert_eq!(map.locate(18).to_string(), "paragraph 3, column 6");
    }

    #[test]
    fn test_line_break_does_not_start_paragraph() {
        let xml = concat!(
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#,
            r#"<w:p><w:r><w:t>Rent</w:t><w:br/><w:t>due</w:t></w:r></w:p>"#,
            r#"<w:p><w:r><w:t>Next</w:t></w:r></w:p>"#,
            r#"</w:body></w:document>"#
        );
        let (text, map) = extract_from_xml(xml).unwrap();
        assert_eq!(text, "Rent\ndue\nNext\n");

        let next = text.find("Next").unwrap();
        assert_eq!(map.locate(next).to_string(), "paragraph 2, column 1");
    }

    #[test]
    fn test_not_a_zip_is_corrupt() {
        let err = extract(b"PK\x03\x04 definitely not a zip").unwrap_err();
        assert!(matches!(err, NormalizeError::CorruptDocument(_)));
    }

    #[test]
    fn test_missing_document_part_is_corrupt() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/styles.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<w:styles/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = extract(&bytes).unwrap_err();
        assert_eq!(
            err,
            NormalizeError::CorruptDocument("DOCX is missing word/document.xml".to_string())
        );
    }

    #[test]
    fn test_mismatched_tags_are_corrupt() {
        let err = extract_from_xml("<w:p><w:t>x</w:p>").unwrap_err();
        assert!(matches!(err, NormalizeError::CorruptDocument(_)));
    }
}
