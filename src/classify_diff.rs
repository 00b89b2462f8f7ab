//! `classify-diff`: compare the mutation-testing classification recorded in a
//! capture log with the one reported after the generated tests were added.
//!
//! Reports are `methods.json` files of the form
//! `{"methods":[{"package","class","name","classification"}]}` with `/`
//! separated package and class names. A method is matched on
//! `<package>.<class>.<name>`, so overloads share one classification.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

pub const REPORT_FILE_NAME: &str = "methods.json";
pub const AFTER_COLUMN: &str = "classification-after";

/// Report value that never replaces the previous classification.
pub const NOT_COVERED: &str = "not-covered";

const BASELINE_COUNTERS: &[&str] = &[
    "pseudo-tested-before",
    "not-covered-after",
    "pseudo-tested-after",
    "partially-tested-after",
    "tested-after",
];

#[derive(Debug, Clone, Deserialize)]
pub struct ReportMethod {
    pub package: String,
    pub class: String,
    pub name: String,
    pub classification: String,
}

impl ReportMethod {
    /// `org/shop` + `Cart` + `total` -> `org.shop.Cart.total`
    pub fn key(&self) -> String {
        format!("{}/{}/{}", self.package, self.class, self.name).replace('/', ".")
    }
}

#[derive(Debug, Deserialize)]
struct MethodsReport {
    methods: Vec<ReportMethod>,
}

/// Every `methods.json` below `dir`, in path order.
pub fn find_reports(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut reports = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.with_context(|| format!("walk {}", dir.display()))?;
        if entry.file_type().is_file() && entry.file_name() == REPORT_FILE_NAME {
            reports.push(entry.into_path());
        }
    }
    reports.sort();
    Ok(reports)
}

/// Classification per method key. Later reports win.
pub fn load_classifications(reports: &[PathBuf]) -> Result<HashMap<String, String>> {
    let mut classifications = HashMap::new();
    for path in reports {
        let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
        let report: MethodsReport = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parse {}", path.display()))?;
        info!(methods = report.methods.len(), report = %path.display(), "loaded report");
        for method in report.methods {
            classifications.insert(method.key(), method.classification);
        }
    }
    Ok(classifications)
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DiffSummary {
    pub rows: usize,
    /// Rows found in at least one report
    pub matched: usize,
    /// `<classification>-before` / `<classification>-after` counts
    pub counts: BTreeMap<String, usize>,
    pub output: PathBuf,
}

fn column(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| anyhow!("missing column '{}'", name))
}

/// Append `classification-after` to every row of `invoked` and write the
/// result to `output`.
pub fn classify_diff(
    invoked: &Path,
    classifications: &HashMap<String, String>,
    output: &Path,
) -> Result<DiffSummary> {
    let mut reader = csv::ReaderBuilder::new()
        .from_path(invoked)
        .with_context(|| format!("open {}", invoked.display()))?;
    let headers = reader
        .headers()
        .with_context(|| format!("read header of {}", invoked.display()))?
        .clone();
    let parent_col = column(&headers, "parent-FQN")?;
    let name_col = column(&headers, "method-name")?;
    let before_col = column(&headers, "classification")?;

    let mut writer = csv::Writer::from_path(output)
        .with_context(|| format!("create {}", output.display()))?;
    let mut out_headers = headers.clone();
    out_headers.push_field(AFTER_COLUMN);
    writer.write_record(&out_headers)?;

    let mut summary = DiffSummary {
        output: output.to_path_buf(),
        ..Default::default()
    };
    for counter in BASELINE_COUNTERS {
        summary.counts.insert(counter.to_string(), 0);
    }

    for (i, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("row {} of {}", i + 2, invoked.display()))?;
        let field = |idx: usize| record.get(idx).unwrap_or_default();
        let before = field(before_col);
        let key = format!("{}.{}", field(parent_col), field(name_col));

        let reported = classifications.get(&key).map(String::as_str);
        if reported.is_some() {
            summary.matched += 1;
        } else {
            debug!(method = %key, "not in any report");
        }
        let observed = reported.unwrap_or(before);
        let after = if observed == NOT_COVERED { before } else { observed };

        *summary.counts.entry(format!("{}-before", before)).or_insert(0) += 1;
        *summary.counts.entry(format!("{}-after", observed)).or_insert(0) += 1;

        let mut out = record.clone();
        out.push_field(after);
        writer.write_record(&out)?;
        summary.rows += 1;
    }
    writer.flush().with_context(|| format!("flush {}", output.display()))?;

    info!(rows = summary.rows, matched = summary.matched, "classification diff written");
    Ok(summary)
}
