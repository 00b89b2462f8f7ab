//! Capture dumps, object trees and format transcoding.
//!
//! - [`splitter`] cuts a raw dump into independent fragments
//! - [`parser`] locates a method's dump files and pairs fragments into
//!   [`SnapshotTriple`](tracegen_types::SnapshotTriple)s
//! - [`tree`] and [`serializer`] read and write structural object graphs
//! - [`transcoder`] re-encodes captured snapshots for another runtime serializer

pub mod error;
pub mod parser;
pub mod serializer;
pub mod splitter;
pub mod transcoder;
pub mod tree;

pub use error::{SnapshotError, TranscodeError, TreeError};
pub use parser::{dedup_triples, parse_dumps, DumpFiles, ParsedSnapshots, SnapshotParser};
pub use serializer::{serializer_for, JsonSerializer, Serializer, XmlSerializer};
pub use splitter::{normalize_fragment, split_fragments};
pub use transcoder::{FormatTranscoder, JsonTreeWriter, StreamingTranscoder};
pub use tree::{drive_xml_events, fold_text, parse_xml_tree, ObjectNode, TreeBuilder, TreeSink};
