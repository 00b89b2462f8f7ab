//! Captured object snapshots and the fixtures built from them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Serialization encoding of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SerializationFormat {
    /// Native tree-structured encoding produced by the recorder
    #[default]
    Xml,
    /// Secondary text encoding
    Json,
}

impl SerializationFormat {
    /// Format the recorder writes dump files in.
    pub const CAPTURE: SerializationFormat = SerializationFormat::Xml;

    pub fn as_str(&self) -> &'static str {
        match self {
            SerializationFormat::Xml => "xml",
            SerializationFormat::Json => "json",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        self.as_str()
    }

    /// Text the format uses for an explicit "no value".
    pub fn null_marker(&self) -> &'static str {
        match self {
            SerializationFormat::Xml => "<null/>",
            SerializationFormat::Json => "null",
        }
    }
}

impl fmt::Display for SerializationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SerializationFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xml" | "xstream" => Ok(SerializationFormat::Xml),
            "json" | "gson" => Ok(SerializationFormat::Json),
            other => Err(format!("unknown serialization format '{}'", other)),
        }
    }
}

/// A single captured object graph as opaque text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Snapshot {
    pub format: SerializationFormat,
    pub text: String,
}

impl Snapshot {
    pub fn new(format: SerializationFormat, text: impl Into<String>) -> Self {
        Self {
            format,
            text: text.into(),
        }
    }

    pub fn xml(text: impl Into<String>) -> Self {
        Self::new(SerializationFormat::Xml, text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Whether the text is the format's explicit "no value" marker.
    pub fn is_null_marker(&self) -> bool {
        self.text.trim() == self.format.null_marker()
    }
}

/// Where the outcome snapshot of a triple came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// Value returned by the method
    Returned,
    /// Receiving object after a void call
    ReceivingPost,
}

impl OutcomeKind {
    /// Dump file suffix holding this outcome.
    pub fn file_suffix(&self) -> &'static str {
        match self {
            OutcomeKind::Returned => "-returned.xml",
            OutcomeKind::ReceivingPost => "-receiving-post.xml",
        }
    }
}

/// The (receiving, params, outcome) fixture for one generated test.
///
/// Equality and hashing cover the full text of every role, which is what
/// deduplication relies on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotTriple {
    pub receiving: String,
    /// Empty when the method takes no parameters
    pub params: String,
    pub outcome: String,
    pub outcome_kind: OutcomeKind,
}

impl SnapshotTriple {
    pub fn has_params(&self) -> bool {
        !self.params.is_empty()
    }

    /// Both mandatory roles carry text.
    pub fn is_complete(&self) -> bool {
        !self.receiving.trim().is_empty() && !self.outcome.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!("XML".parse::<SerializationFormat>(), Ok(SerializationFormat::Xml));
        assert_eq!("gson".parse::<SerializationFormat>(), Ok(SerializationFormat::Json));
        assert!("yaml".parse::<SerializationFormat>().is_err());
    }

    #[test]
    fn test_null_marker_detection() {
        assert!(Snapshot::xml(" <null/> ").is_null_marker());
        assert!(!Snapshot::xml("<int>2</int>").is_null_marker());
        assert!(Snapshot::new(SerializationFormat::Json, "null").is_null_marker());
    }

    #[test]
    fn test_triple_completeness() {
        let triple = SnapshotTriple {
            receiving: "<Obj/>".to_string(),
            params: String::new(),
            outcome: "  ".to_string(),
            outcome_kind: OutcomeKind::Returned,
        };
        assert!(!triple.is_complete());
        assert!(!triple.has_params());
    }
}
