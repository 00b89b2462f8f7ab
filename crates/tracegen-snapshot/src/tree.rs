//! Structural object graphs.
//!
//! An [`ObjectNode`] is what a deserializer hands back: element name, sorted
//! attributes, folded text and ordered children. Two snapshots describe the
//! same object exactly when their trees compare equal, regardless of the
//! encoding they were read from.
//!
//! XML is consumed as an event stream through [`TreeSink`], so the same
//! reader drives both tree building and streaming transcoding.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;

use crate::error::TreeError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ObjectNode {
    pub name: String,
    /// Sorted by name
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<ObjectNode>,
}

impl ObjectNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    pub fn with_child(mut self, child: ObjectNode) -> Self {
        self.children.push(child);
        self
    }

    /// Insert or replace an attribute, keeping the list sorted.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.binary_search_by(|(k, _)| k.as_str().cmp(&key)) {
            Ok(idx) => self.attributes[idx].1 = value,
            Err(idx) => self.attributes.insert(idx, (key, value)),
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .binary_search_by(|(k, _)| k.as_str().cmp(key))
            .ok()
            .map(|idx| self.attributes[idx].1.as_str())
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Total number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.node_count()).sum::<usize>()
    }
}

/// Fold the text segments of one element.
///
/// Leaf elements keep their text exactly. Elements with children keep the
/// trimmed, non-empty segments concatenated, which drops indentation.
pub fn fold_text<S: AsRef<str>>(segments: &[S], has_children: bool) -> String {
    if has_children {
        segments
            .iter()
            .map(|s| s.as_ref().trim())
            .filter(|s| !s.is_empty())
            .collect()
    } else {
        segments.iter().map(|s| s.as_ref()).collect()
    }
}

/// Receiver of a well-formed element stream.
pub trait TreeSink {
    /// `attributes` arrive sorted by name.
    fn start(&mut self, name: &str, attributes: Vec<(String, String)>) -> Result<(), TreeError>;
    fn text(&mut self, segment: &str) -> Result<(), TreeError>;
    fn end(&mut self) -> Result<(), TreeError>;
}

/// Feed one XML document with a single root element into `sink`.
pub fn drive_xml_events<S: TreeSink>(xml: &str, sink: &mut S) -> Result<(), TreeError> {
    let mut reader = Reader::from_str(xml);
    let mut depth = 0usize;
    let mut roots = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if depth == 0 {
                    roots += 1;
                    if roots > 1 {
                        return Err(TreeError::MultipleRoots);
                    }
                }
                let (name, attributes) = element_header(&e)?;
                sink.start(&name, attributes)?;
                depth += 1;
            }
            Event::Empty(e) => {
                if depth == 0 {
                    roots += 1;
                    if roots > 1 {
                        return Err(TreeError::MultipleRoots);
                    }
                }
                let (name, attributes) = element_header(&e)?;
                sink.start(&name, attributes)?;
                sink.end()?;
            }
            Event::End(_) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| TreeError::Xml("unbalanced end tag".to_string()))?;
                sink.end()?;
            }
            Event::Text(t) => {
                let text = t.unescape()?;
                if depth == 0 {
                    if !text.trim().is_empty() {
                        return Err(TreeError::Shape(format!(
                            "text outside the root element: {:?}",
                            text.trim()
                        )));
                    }
                } else {
                    sink.text(&text)?;
                }
            }
            Event::CData(c) => {
                let raw = c.into_inner();
                let text = std::str::from_utf8(&raw)
                    .map_err(|e| TreeError::Xml(format!("cdata is not utf-8: {}", e)))?;
                if depth == 0 {
                    return Err(TreeError::Shape("cdata outside the root element".to_string()));
                }
                sink.text(text)?;
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::Comment(_) | Event::DocType(_) => {}
        }
    }

    if depth != 0 {
        return Err(TreeError::Xml("unexpected end of input".to_string()));
    }
    if roots == 0 {
        return Err(TreeError::Empty);
    }
    Ok(())
}

fn element_header(e: &BytesStart<'_>) -> Result<(String, Vec<(String, String)>), TreeError> {
    let name = std::str::from_utf8(e.name().as_ref())
        .map_err(|err| TreeError::Xml(format!("element name is not utf-8: {}", err)))?
        .to_string();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| TreeError::Xml(err.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|err| TreeError::Xml(format!("attribute name is not utf-8: {}", err)))?
            .to_string();
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key, value));
    }
    attributes.sort_by(|a, b| a.0.cmp(&b.0));
    Ok((name, attributes))
}

struct PendingNode {
    node: ObjectNode,
    segments: Vec<String>,
}

/// Builds an [`ObjectNode`] from sink events.
#[derive(Default)]
pub struct TreeBuilder {
    stack: Vec<PendingNode>,
    root: Option<ObjectNode>,
}

impl TreeBuilder {
    pub fn finish(self) -> Result<ObjectNode, TreeError> {
        if !self.stack.is_empty() {
            return Err(TreeError::Xml("unclosed element".to_string()));
        }
        self.root.ok_or(TreeError::Empty)
    }
}

impl TreeSink for TreeBuilder {
    fn start(&mut self, name: &str, attributes: Vec<(String, String)>) -> Result<(), TreeError> {
        if self.root.is_some() {
            return Err(TreeError::MultipleRoots);
        }
        self.stack.push(PendingNode {
            node: ObjectNode {
                name: name.to_string(),
                attributes,
                ..Default::default()
            },
            segments: Vec::new(),
        });
        Ok(())
    }

    fn text(&mut self, segment: &str) -> Result<(), TreeError> {
        match self.stack.last_mut() {
            Some(pending) => {
                pending.segments.push(segment.to_string());
                Ok(())
            }
            None => Err(TreeError::Shape("text outside any element".to_string())),
        }
    }

    fn end(&mut self) -> Result<(), TreeError> {
        let PendingNode { mut node, segments } = self
            .stack
            .pop()
            .ok_or_else(|| TreeError::Xml("unbalanced end tag".to_string()))?;
        node.text = fold_text(&segments, !node.children.is_empty());
        match self.stack.last_mut() {
            Some(parent) => parent.node.children.push(node),
            None => self.root = Some(node),
        }
        Ok(())
    }
}

/// Parse one XML document into a tree.
pub fn parse_xml_tree(xml: &str) -> Result<ObjectNode, TreeError> {
    let mut builder = TreeBuilder::default();
    drive_xml_events(xml, &mut builder)?;
    builder.finish()
}

/// Replay a tree as sink events.
pub fn replay<S: TreeSink>(node: &ObjectNode, sink: &mut S) -> Result<(), TreeError> {
    sink.start(&node.name, node.attributes.clone())?;
    if !node.text.is_empty() {
        sink.text(&node.text)?;
    }
    for child in &node.children {
        replay(child, sink)?;
    }
    sink.end()
}
