//! Snapshot transcoding between serialization formats.
//!
//! XML to JSON is a streaming structural copy: quick-xml events are pushed
//! straight into a [`JsonTreeWriter`] without materializing the tree. Each
//! open element keeps only its pending text and attributes, so memory grows
//! with nesting depth rather than snapshot size.
//!
//! Only the capture format is ever a source. Captured text stays the ground
//! truth and is never rebuilt from a secondary encoding.

use std::io::Write;

use tracegen_types::{SerializationFormat, Snapshot};
use tracing::trace;

use crate::error::{TranscodeError, TreeError};
use crate::tree::{drive_xml_events, fold_text, TreeSink};

/// Re-encodes snapshots into another serialization format.
pub trait FormatTranscoder {
    fn transcode(
        &self,
        snapshot: &Snapshot,
        target: SerializationFormat,
    ) -> Result<Snapshot, TranscodeError>;
}

/// Event-driven transcoder used by the generate pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamingTranscoder;

impl FormatTranscoder for StreamingTranscoder {
    fn transcode(
        &self,
        snapshot: &Snapshot,
        target: SerializationFormat,
    ) -> Result<Snapshot, TranscodeError> {
        match (snapshot.format, target) {
            (from, to) if from == to => Ok(snapshot.clone()),
            (SerializationFormat::Xml, SerializationFormat::Json) => {
                let mut writer = JsonTreeWriter::new(Vec::with_capacity(snapshot.text.len()));
                drive_xml_events(&snapshot.text, &mut writer)?;
                let bytes = writer.finish()?;
                let text = String::from_utf8(bytes)
                    .map_err(|e| TreeError::Json(format!("writer produced invalid utf-8: {}", e)))?;
                trace!(
                    from_len = snapshot.text.len(),
                    to_len = text.len(),
                    "transcoded snapshot to json"
                );
                Ok(Snapshot::new(SerializationFormat::Json, text))
            }
            (from, to) => Err(TranscodeError::Unsupported { from, to }),
        }
    }
}

struct Frame {
    attributes: Vec<(String, String)>,
    segments: Vec<String>,
    children_open: bool,
}

/// Streaming writer for the JSON tree encoding.
///
/// An element is written as `{"<name>": body}`. `body` is a plain string for
/// a leaf without attributes; otherwise an object with `"#children"`,
/// `"#text"` and `"@<attr>"` entries, in that order, each only when present.
pub struct JsonTreeWriter<W: Write> {
    out: W,
    frames: Vec<Frame>,
    roots: usize,
}

impl<W: Write> JsonTreeWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            frames: Vec::new(),
            roots: 0,
        }
    }

    /// Return the underlying writer once the root element is closed.
    pub fn finish(mut self) -> Result<W, TreeError> {
        if !self.frames.is_empty() {
            return Err(TreeError::Shape("unclosed element".to_string()));
        }
        if self.roots == 0 {
            return Err(TreeError::Empty);
        }
        self.out.flush().map_err(io_error)?;
        Ok(self.out)
    }

    fn raw(&mut self, s: &str) -> Result<(), TreeError> {
        self.out.write_all(s.as_bytes()).map_err(io_error)
    }

    fn string(&mut self, s: &str) -> Result<(), TreeError> {
        serde_json::to_writer(&mut self.out, s)?;
        Ok(())
    }

    /// Writes the `"#text"` entry, if any, then the attribute entries.
    fn trailing_entries(
        &mut self,
        text: &str,
        attributes: &[(String, String)],
        mut need_comma: bool,
    ) -> Result<(), TreeError> {
        if !text.is_empty() {
            if need_comma {
                self.raw(",")?;
            }
            self.raw("\"#text\":")?;
            self.string(text)?;
            need_comma = true;
        }
        for (key, value) in attributes {
            if need_comma {
                self.raw(",")?;
            }
            self.string(&format!("@{}", key))?;
            self.raw(":")?;
            self.string(value)?;
            need_comma = true;
        }
        Ok(())
    }
}

fn io_error(e: std::io::Error) -> TreeError {
    TreeError::Json(e.to_string())
}

impl<W: Write> TreeSink for JsonTreeWriter<W> {
    fn start(&mut self, name: &str, attributes: Vec<(String, String)>) -> Result<(), TreeError> {
        let open_children = match self.frames.last_mut() {
            Some(parent) => {
                let first = !parent.children_open;
                parent.children_open = true;
                Some(first)
            }
            None => {
                self.roots += 1;
                if self.roots > 1 {
                    return Err(TreeError::MultipleRoots);
                }
                None
            }
        };
        match open_children {
            Some(true) => self.raw("{\"#children\":[")?,
            Some(false) => self.raw(",")?,
            None => {}
        }
        self.raw("{")?;
        self.string(name)?;
        self.raw(":")?;
        self.frames.push(Frame {
            attributes,
            segments: Vec::new(),
            children_open: false,
        });
        Ok(())
    }

    fn text(&mut self, segment: &str) -> Result<(), TreeError> {
        match self.frames.last_mut() {
            Some(frame) => {
                frame.segments.push(segment.to_string());
                Ok(())
            }
            None => Err(TreeError::Shape("text outside any element".to_string())),
        }
    }

    fn end(&mut self) -> Result<(), TreeError> {
        let frame = self
            .frames
            .pop()
            .ok_or_else(|| TreeError::Shape("unbalanced end".to_string()))?;
        let text = fold_text(&frame.segments, frame.children_open);
        if frame.children_open {
            self.raw("]")?;
            self.trailing_entries(&text, &frame.attributes, true)?;
            self.raw("}")?;
        } else if frame.attributes.is_empty() {
            self.string(&text)?;
        } else {
            self.raw("{")?;
            self.trailing_entries(&text, &frame.attributes, false)?;
            self.raw("}")?;
        }
        self.raw("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_json(xml: &str) -> String {
        StreamingTranscoder
            .transcode(&Snapshot::xml(xml), SerializationFormat::Json)
            .unwrap()
            .text
    }

    #[test]
    fn test_leaf_becomes_string_body() {
        assert_eq!(to_json("<int>2</int>"), r#"{"int":"2"}"#);
        assert_eq!(to_json("<null/>"), r#"{"null":""}"#);
    }

    #[test]
    fn test_nested_elements_keep_order() {
        assert_eq!(
            to_json("<Obj>\n  <y>2</y>\n  <x>1</x>\n</Obj>"),
            r##"{"Obj":{"#children":[{"y":"2"},{"x":"1"}]}}"##
        );
    }

    #[test]
    fn test_attributes_and_text() {
        assert_eq!(
            to_json(r#"<list class="java.util.ArrayList" size="1"><s>a</s></list>"#),
            r##"{"list":{"#children":[{"s":"a"}],"@class":"java.util.ArrayList","@size":"1"}}"##
        );
        assert_eq!(
            to_json(r#"<v type="int"> 7 </v>"#),
            r##"{"v":{"#text":" 7 ","@type":"int"}}"##
        );
    }

    #[test]
    fn test_special_characters_are_json_escaped() {
        assert_eq!(
            to_json("<s>say \"hi\"\n&amp; bye</s>"),
            r#"{"s":"say \"hi\"\n& bye"}"#
        );
    }

    #[test]
    fn test_same_format_is_passthrough() {
        let snapshot = Snapshot::xml("<a>  not   normalized </a>");
        let out = StreamingTranscoder
            .transcode(&snapshot, SerializationFormat::Xml)
            .unwrap();
        assert_eq!(out, snapshot);
    }

    #[test]
    fn test_reverse_direction_is_unsupported() {
        let snapshot = Snapshot::new(SerializationFormat::Json, r#"{"a":"1"}"#);
        let err = StreamingTranscoder
            .transcode(&snapshot, SerializationFormat::Xml)
            .unwrap_err();
        assert_eq!(
            err,
            TranscodeError::Unsupported {
                from: SerializationFormat::Json,
                to: SerializationFormat::Xml
            }
        );
    }

    #[test]
    fn test_malformed_source_is_a_tree_error() {
        let err = StreamingTranscoder
            .transcode(&Snapshot::xml("<a><b></a>"), SerializationFormat::Json)
            .unwrap_err();
        assert!(matches!(err, TranscodeError::Tree(_)));
    }
}
