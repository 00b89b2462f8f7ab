//! Capture log reading.
//!
//! The recorder writes one CSV row per instrumented method. Extra columns
//! (visibility, tags, classification) are tolerated and ignored here.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use tracegen_types::{parse_param_list, InstrumentedMethod};

#[derive(Debug, Deserialize)]
struct CaptureRow {
    #[serde(rename = "parent-FQN")]
    parent_fqn: String,
    #[serde(rename = "method-name")]
    method_name: String,
    #[serde(rename = "param-list", default)]
    param_list: String,
    #[serde(rename = "return-type", default)]
    return_type: String,
    #[serde(rename = "nb-invocations", default)]
    nb_invocations: Option<u64>,
}

impl From<CaptureRow> for InstrumentedMethod {
    fn from(row: CaptureRow) -> Self {
        let return_type = if row.return_type.is_empty() {
            "void".to_string()
        } else {
            row.return_type
        };
        Self {
            declaring_type: row.parent_fqn,
            name: row.method_name,
            parameters: parse_param_list(&row.param_list),
            return_type,
            invocation_count: row.nb_invocations.unwrap_or(0),
        }
    }
}

/// Read a capture log, one record per distinct signature in file order.
pub fn read_capture_log(path: &Path) -> Result<Vec<InstrumentedMethod>> {
    let file =
        std::fs::File::open(path).with_context(|| format!("open capture log {}", path.display()))?;
    parse_capture_log(file).with_context(|| format!("parse capture log {}", path.display()))
}

pub fn parse_capture_log<R: Read>(reader: R) -> Result<Vec<InstrumentedMethod>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut seen = HashSet::new();
    let mut records = Vec::new();
    let mut duplicates = 0usize;
    for (i, row) in csv_reader.deserialize::<CaptureRow>().enumerate() {
        // header is line 1
        let row = row.with_context(|| format!("row {}", i + 2))?;
        let record = InstrumentedMethod::from(row);
        if seen.insert(record.signature()) {
            records.push(record);
        } else {
            duplicates += 1;
        }
    }
    debug!(records = records.len(), duplicates, "read capture log");
    Ok(records)
}
