//! Error types for snapshot handling.

use std::fmt;
use std::path::PathBuf;

/// Failure while reading the dump files of one instrumented method.
#[derive(Debug)]
pub enum SnapshotError {
    /// A dump file required for this method does not exist
    Missing { path: PathBuf },
    /// A dump file exists but is not a sequence of well-formed fragments
    Malformed {
        path: PathBuf,
        signature: String,
        message: String,
    },
    /// Dump files disagree on how many invocations were captured
    CountMismatch {
        base: PathBuf,
        signature: String,
        receiving: usize,
        params: Option<usize>,
        outcome: usize,
    },
    Io { path: PathBuf, source: std::io::Error },
}

impl SnapshotError {
    /// No capture was ever recorded, as opposed to a broken one.
    pub fn is_capture_absent(&self) -> bool {
        matches!(self, SnapshotError::Missing { .. })
    }
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::Missing { path } => {
                write!(f, "no snapshots found at {}", path.display())
            }
            SnapshotError::Malformed {
                path,
                signature,
                message,
            } => write!(
                f,
                "malformed capture {} (params: {}): {}",
                path.display(),
                signature,
                message
            ),
            SnapshotError::CountMismatch {
                base,
                signature,
                receiving,
                params,
                outcome,
            } => {
                write!(
                    f,
                    "capture counts disagree for {} (params: {}): receiving={}",
                    base.display(),
                    signature,
                    receiving
                )?;
                if let Some(p) = params {
                    write!(f, " params={}", p)?;
                }
                write!(f, " outcome={}", outcome)
            }
            SnapshotError::Io { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SnapshotError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Failure to read fragment text as an element tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    Xml(String),
    Json(String),
    /// The text holds no element
    Empty,
    /// The text holds more than one root element
    MultipleRoots,
    /// Structure that the tree encoding cannot express
    Shape(String),
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::Xml(msg) => write!(f, "xml error: {}", msg),
            TreeError::Json(msg) => write!(f, "json error: {}", msg),
            TreeError::Empty => write!(f, "no root element"),
            TreeError::MultipleRoots => write!(f, "more than one root element"),
            TreeError::Shape(msg) => write!(f, "unexpected structure: {}", msg),
        }
    }
}

impl std::error::Error for TreeError {}

impl From<quick_xml::Error> for TreeError {
    fn from(e: quick_xml::Error) -> Self {
        TreeError::Xml(e.to_string())
    }
}

impl From<serde_json::Error> for TreeError {
    fn from(e: serde_json::Error) -> Self {
        TreeError::Json(e.to_string())
    }
}

/// Failure to re-encode a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscodeError {
    /// No conversion path between the two formats
    Unsupported {
        from: tracegen_types::SerializationFormat,
        to: tracegen_types::SerializationFormat,
    },
    Tree(TreeError),
}

impl fmt::Display for TranscodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscodeError::Unsupported { from, to } => {
                write!(f, "cannot transcode {} snapshots to {}", from, to)
            }
            TranscodeError::Tree(e) => write!(f, "transcoding failed: {}", e),
        }
    }
}

impl std::error::Error for TranscodeError {}

impl From<TreeError> for TranscodeError {
    fn from(e: TreeError) -> Self {
        TranscodeError::Tree(e)
    }
}
