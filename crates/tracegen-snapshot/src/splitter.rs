//! Fragment splitting for raw dump files.
//!
//! The recorder appends one serialized object per invocation to the same
//! file, so a dump is a sequence of independent XML documents rather than one
//! well-formed document. The splitter walks the event stream, tracks element
//! depth, and slices each top-level element out of the original text, which
//! keeps every fragment byte-identical to what was captured.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::TreeError;

const DOUBLE_ESCAPED_HEX: &str = "&amp;#x";

/// Split a dump into normalized, non-empty fragments in capture order.
pub fn split_fragments(raw: &str) -> Result<Vec<String>, TreeError> {
    let mut reader = Reader::from_str(raw);
    let mut fragments = Vec::new();
    let mut depth = 0usize;
    let mut fragment_start = 0usize;

    loop {
        let before = reader.buffer_position();
        let event = reader.read_event()?;
        let after = reader.buffer_position();

        match event {
            Event::Start(_) => {
                if depth == 0 {
                    fragment_start = before;
                }
                depth += 1;
            }
            Event::End(_) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| TreeError::Xml(format!("unbalanced end tag at byte {}", before)))?;
                if depth == 0 {
                    push_fragment(&mut fragments, &raw[fragment_start..after]);
                }
            }
            Event::Empty(_) | Event::CData(_) | Event::Text(_) if depth == 0 => {
                push_fragment(&mut fragments, &raw[before..after]);
            }
            Event::Eof => break,
            // declarations, processing instructions, comments and doctypes
            // between fragments carry no object data
            _ => {}
        }
    }

    if depth != 0 {
        return Err(TreeError::Xml(format!(
            "{} element(s) left open at end of input",
            depth
        )));
    }
    Ok(fragments)
}

fn push_fragment(fragments: &mut Vec<String>, slice: &str) {
    let cleaned = normalize_fragment(slice);
    if !cleaned.is_empty() {
        fragments.push(cleaned);
    }
}

/// Strip encoding declarations, trim, and repair double-escaped hex
/// character references (`&amp;#x1F;` becomes `&#x1F;`).
pub fn normalize_fragment(fragment: &str) -> String {
    let mut text = fragment.trim();
    while let Some(rest) = text.strip_prefix("<?xml") {
        match rest.find("?>") {
            Some(end) => text = rest[end + 2..].trim_start(),
            None => break,
        }
    }
    repair_hex_escapes(text.trim())
}

fn repair_hex_escapes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find(DOUBLE_ESCAPED_HEX) {
        out.push_str(&rest[..idx]);
        let after = &rest[idx + DOUBLE_ESCAPED_HEX.len()..];
        let word_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        if word_len > 0 && after[word_len..].starts_with(';') {
            out.push_str("&#x");
        } else {
            out.push_str(DOUBLE_ESCAPED_HEX);
        }
        rest = after;
    }
    out.push_str(rest);
    out
}
