//! Dump file reading and snapshot pairing.
//!
//! For one instrumented method the recorder leaves up to three files next to
//! each other:
//!
//! ```text
//! <dumps>/<type>.<method><suffix>-receiving.xml       always
//! <dumps>/<type>.<method><suffix>-params.xml          only with parameters
//! <dumps>/<type>.<method><suffix>-returned.xml        value-returning methods
//! <dumps>/<type>.<method><suffix>-receiving-post.xml  void methods
//! ```
//!
//! The n-th fragment of every file belongs to the n-th recorded invocation.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracegen_types::{InstrumentedMethod, OutcomeKind, SnapshotTriple};
use tracing::debug;

use crate::error::SnapshotError;
use crate::splitter::split_fragments;

const RECEIVING_SUFFIX: &str = "-receiving.xml";
const PARAMS_SUFFIX: &str = "-params.xml";

/// Paths of the dump files for one method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpFiles {
    pub receiving: PathBuf,
    pub params: Option<PathBuf>,
    pub outcome: PathBuf,
    pub outcome_kind: OutcomeKind,
}

impl DumpFiles {
    /// `base` is the dump directory joined with the method's dump stem.
    pub fn locate(base: &Path, param_suffix: &str, has_params: bool, returns_value: bool) -> Self {
        let with_suffix = |suffix: &str| {
            let mut path = OsString::from(base.as_os_str());
            path.push(param_suffix);
            path.push(suffix);
            PathBuf::from(path)
        };
        let outcome_kind = if returns_value {
            OutcomeKind::Returned
        } else {
            OutcomeKind::ReceivingPost
        };
        Self {
            receiving: with_suffix(RECEIVING_SUFFIX),
            params: has_params.then(|| with_suffix(PARAMS_SUFFIX)),
            outcome: with_suffix(outcome_kind.file_suffix()),
            outcome_kind,
        }
    }

    /// First expected file that is not on disk.
    pub fn first_missing(&self) -> Option<&Path> {
        std::iter::once(self.receiving.as_path())
            .chain(self.params.as_deref())
            .chain(std::iter::once(self.outcome.as_path()))
            .find(|p| !p.is_file())
    }
}

/// Triples recovered for one method, with the counts behind them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSnapshots {
    /// Unique triples in capture order
    pub triples: Vec<SnapshotTriple>,
    /// Triples formed by positional pairing, before any filtering
    pub paired: usize,
    pub dropped_empty: usize,
    pub dropped_duplicate: usize,
}

/// Reads dump files from one capture directory.
#[derive(Debug, Clone)]
pub struct SnapshotParser {
    base_dir: PathBuf,
}

impl SnapshotParser {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn dump_files(&self, method: &InstrumentedMethod) -> DumpFiles {
        DumpFiles::locate(
            &self.base_dir.join(method.dump_stem()),
            &method.param_suffix(),
            method.has_params(),
            !method.is_void(),
        )
    }

    pub fn parse(&self, method: &InstrumentedMethod) -> Result<ParsedSnapshots, SnapshotError> {
        let files = self.dump_files(method);
        let signature = method.parameters.join(",");
        let parsed = parse_dumps(&files, &signature)?;
        debug!(
            method = %method.signature(),
            paired = parsed.paired,
            unique = parsed.triples.len(),
            dropped_empty = parsed.dropped_empty,
            dropped_duplicate = parsed.dropped_duplicate,
            "parsed snapshots"
        );
        Ok(parsed)
    }
}

/// Read, split, pair and deduplicate the dumps named by `files`.
///
/// `signature` is the parameter list used in diagnostics.
pub fn parse_dumps(files: &DumpFiles, signature: &str) -> Result<ParsedSnapshots, SnapshotError> {
    if let Some(missing) = files.first_missing() {
        return Err(SnapshotError::Missing {
            path: missing.to_path_buf(),
        });
    }

    let receiving = read_fragments(&files.receiving, signature)?;
    let params = match &files.params {
        Some(path) => Some(read_fragments(path, signature)?),
        None => None,
    };
    let outcome = read_fragments(&files.outcome, signature)?;

    let counts_agree = receiving.len() == outcome.len()
        && params.as_ref().map_or(true, |p| p.len() == receiving.len());
    if !counts_agree {
        return Err(SnapshotError::CountMismatch {
            base: files.receiving.clone(),
            signature: signature.to_string(),
            receiving: receiving.len(),
            params: params.as_ref().map(Vec::len),
            outcome: outcome.len(),
        });
    }

    let paired = pair_fragments(receiving, params, outcome, files.outcome_kind);
    let paired_count = paired.len();

    let complete: Vec<SnapshotTriple> = paired.into_iter().filter(|t| t.is_complete()).collect();
    let dropped_empty = paired_count - complete.len();

    let before_dedup = complete.len();
    let triples = dedup_triples(complete);
    let dropped_duplicate = before_dedup - triples.len();

    Ok(ParsedSnapshots {
        triples,
        paired: paired_count,
        dropped_empty,
        dropped_duplicate,
    })
}

fn read_fragments(path: &Path, signature: &str) -> Result<Vec<String>, SnapshotError> {
    let raw = fs::read_to_string(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    split_fragments(&raw).map_err(|e| SnapshotError::Malformed {
        path: path.to_path_buf(),
        signature: signature.to_string(),
        message: e.to_string(),
    })
}

/// Zip fragments by capture position. All lists must have the same length.
fn pair_fragments(
    receiving: Vec<String>,
    params: Option<Vec<String>>,
    outcome: Vec<String>,
    outcome_kind: OutcomeKind,
) -> Vec<SnapshotTriple> {
    let mut params = params.map(Vec::into_iter);
    receiving
        .into_iter()
        .zip(outcome)
        .map(|(receiving, outcome)| SnapshotTriple {
            receiving,
            params: params.as_mut().and_then(|it| it.next()).unwrap_or_default(),
            outcome,
            outcome_kind,
        })
        .collect()
}

/// Remove repeated triples, keeping the first occurrence of each.
///
/// Equality is on the full text of every role; snapshots that differ only
/// in formatting are kept apart.
pub fn dedup_triples(triples: Vec<SnapshotTriple>) -> Vec<SnapshotTriple> {
    let mut seen = HashSet::with_capacity(triples.len());
    triples
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}
