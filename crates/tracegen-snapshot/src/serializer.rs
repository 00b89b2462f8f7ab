//! Text encodings of object trees.
//!
//! Generated tests compare objects by their serialized text, so these
//! serializers are also what the pipeline uses to check that a snapshot can
//! be read back before a test is synthesized from it.

use serde_json::{Map, Value};
use tracegen_types::SerializationFormat;

use crate::error::TreeError;
use crate::transcoder::JsonTreeWriter;
use crate::tree::{parse_xml_tree, replay, ObjectNode};

pub trait Serializer {
    fn format(&self) -> SerializationFormat;

    fn serialize(&self, node: &ObjectNode) -> String;

    fn deserialize(&self, text: &str) -> Result<ObjectNode, TreeError>;
}

/// Pick the serializer for a format.
pub fn serializer_for(format: SerializationFormat) -> Box<dyn Serializer + Send + Sync> {
    match format {
        SerializationFormat::Xml => Box::new(XmlSerializer),
        SerializationFormat::Json => Box::new(JsonSerializer),
    }
}

/// Capture-format serializer. Output is indented by two spaces per level.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlSerializer;

impl XmlSerializer {
    fn write_node(out: &mut String, node: &ObjectNode, depth: usize) {
        let indent = "  ".repeat(depth);
        out.push_str(&indent);
        out.push('<');
        out.push_str(&node.name);
        for (key, value) in &node.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&quick_xml::escape::escape(value.as_str()));
            out.push('"');
        }
        if node.children.is_empty() && node.text.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        out.push_str(&quick_xml::escape::escape(node.text.as_str()));
        if !node.children.is_empty() {
            for child in &node.children {
                out.push('\n');
                Self::write_node(out, child, depth + 1);
            }
            out.push('\n');
            out.push_str(&indent);
        }
        out.push_str("</");
        out.push_str(&node.name);
        out.push('>');
    }
}

impl Serializer for XmlSerializer {
    fn format(&self) -> SerializationFormat {
        SerializationFormat::Xml
    }

    fn serialize(&self, node: &ObjectNode) -> String {
        let mut out = String::new();
        Self::write_node(&mut out, node, 0);
        out
    }

    fn deserialize(&self, text: &str) -> Result<ObjectNode, TreeError> {
        parse_xml_tree(text)
    }
}

/// Secondary serializer using the JSON tree encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl JsonSerializer {
    fn element(value: &Value) -> Result<ObjectNode, TreeError> {
        let entry = match value {
            Value::Object(map) if map.len() == 1 => map.iter().next(),
            other => {
                return Err(TreeError::Shape(format!(
                    "expected a single-key element object, found {}",
                    kind(other)
                )))
            }
        };
        let Some((name, body)) = entry else {
            return Err(TreeError::Empty);
        };
        let mut node = ObjectNode::new(name.as_str());
        match body {
            Value::String(text) => node.text = text.clone(),
            Value::Object(fields) => Self::fill_body(&mut node, fields)?,
            other => {
                return Err(TreeError::Shape(format!(
                    "element '{}' has a {} body",
                    name,
                    kind(other)
                )))
            }
        }
        Ok(node)
    }

    fn fill_body(node: &mut ObjectNode, fields: &Map<String, Value>) -> Result<(), TreeError> {
        for (key, value) in fields {
            match (key.as_str(), value) {
                ("#text", Value::String(text)) => node.text = text.clone(),
                ("#children", Value::Array(items)) => {
                    for item in items {
                        node.children.push(Self::element(item)?);
                    }
                }
                (attr, Value::String(v)) if attr.starts_with('@') => {
                    node.set_attribute(&attr[1..], v.as_str());
                }
                (other, _) => {
                    return Err(TreeError::Shape(format!(
                        "unexpected entry '{}' in element '{}'",
                        other, node.name
                    )))
                }
            }
        }
        Ok(())
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Serializer for JsonSerializer {
    fn format(&self) -> SerializationFormat {
        SerializationFormat::Json
    }

    fn serialize(&self, node: &ObjectNode) -> String {
        let mut writer = JsonTreeWriter::new(Vec::new());
        // writing into memory cannot fail for a tree that is well formed by construction
        match replay(node, &mut writer).and_then(|_| writer.finish()) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(_) => String::new(),
        }
    }

    fn deserialize(&self, text: &str) -> Result<ObjectNode, TreeError> {
        let value: Value = serde_json::from_str(text)?;
        Self::element(&value)
    }
}
