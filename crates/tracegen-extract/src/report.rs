//! Extracted-methods report.
//!
//! The CSV written here is what the recording side reads to decide which
//! methods to instrument, so the column names are fixed.

use serde::Serialize;
use std::io::Write;

use crate::model::ModelMethod;
use crate::tagger::TagTable;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedMethodRow {
    pub visibility: String,
    #[serde(rename = "parent-FQN")]
    pub parent_fqn: String,
    #[serde(rename = "method-name")]
    pub method_name: String,
    /// `[a, b]`
    #[serde(rename = "param-list")]
    pub param_list: String,
    #[serde(rename = "return-type")]
    pub return_type: String,
    /// `{returns=true, ...}`
    pub tags: String,
}

impl ExtractedMethodRow {
    pub fn new(method: &ModelMethod, table: &TagTable) -> Self {
        let d = &method.descriptor;
        let tags = table
            .get(&method.signature())
            .map(|t| t.tags.to_string())
            .unwrap_or_default();
        Self {
            visibility: d.visibility.to_string(),
            parent_fqn: d.declaring_type.name.clone(),
            method_name: d.name.clone(),
            param_list: format!("[{}]", d.parameters.join(", ")),
            return_type: d.return_type.clone().unwrap_or_else(|| "void".to_string()),
            tags,
        }
    }
}

/// Write rows as CSV with a header line.
pub fn write_rows<W: Write>(writer: W, rows: &[ExtractedMethodRow]) -> csv::Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    if rows.is_empty() {
        out.write_record([
            "visibility",
            "parent-FQN",
            "method-name",
            "param-list",
            "return-type",
            "tags",
        ])?;
    }
    for row in rows {
        out.serialize(row)?;
    }
    out.flush()?;
    Ok(())
}
