//! Output formatting for the tracegen CLI
//!
//! Summaries go to stdout, either as plain text or as one pretty JSON
//! document. Logs go to stderr through tracing.

use serde::Serialize;

use tracegen::classify_diff::DiffSummary;
use tracegen::emit::EmittedFile;
use tracegen::extract::ExtractSummary;
use tracegen::runner::RunReport;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn format_error(error: &anyhow::Error, json_output: bool) -> String {
    if json_output {
        #[derive(Serialize)]
        struct ErrorJson {
            error: String,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            causes: Vec<String>,
        }

        let err = ErrorJson {
            error: error.to_string(),
            causes: error.chain().skip(1).map(|e| e.to_string()).collect(),
        };
        let mut out = serde_json::to_string_pretty(&err).unwrap_or_else(|_| "{}".to_string());
        out.push('\n');
        out
    } else {
        let mut out = format!("Error: {}\n", error);
        for cause in error.chain().skip(1) {
            out.push_str(&format!("  caused by: {}\n", cause));
        }
        out
    }
}

pub fn format_extract_summary(summary: &ExtractSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("methods: {}\n", summary.methods));
    if summary.diagnostics > 0 {
        out.push_str(&format!("unresolved model entries: {}\n", summary.diagnostics));
    }
    out.push_str(&format!("candidates: {}\n", summary.candidates));
    out.push_str(&format!(
        "instrumentation candidates: {}\n",
        summary.instrumentation_candidates
    ));
    out.push_str(&format!("tagging time: {} ms\n", summary.tagging_ms));
    out.push_str(&format!("wrote {}\n", summary.extracted_csv.display()));
    out.push_str(&format!("wrote {}\n", summary.instrumentation_csv.display()));
    out.push_str(&format!("wrote {}\n", summary.tags_json.display()));
    out
}

/// Counters, then one `SKIP` line per skipped method.
pub fn format_run_summary(report: &RunReport, files: &[EmittedFile], verbose: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!("candidates found: {}\n", report.candidates));
    out.push_str(&format!("methods instrumented: {}\n", report.instrumented));
    out.push_str(&format!("snapshots paired: {}\n", report.snapshots_paired));
    out.push_str(&format!("tests emitted: {}\n", report.tests_emitted));
    if verbose {
        for file in files {
            out.push_str(&format!("  {}\n", file.path));
        }
    }
    for skipped in &report.skipped {
        out.push_str(&format!("{}\n", skipped));
    }
    out
}

pub fn format_diff_summary(summary: &DiffSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "rows: {} (matched in reports: {})\n",
        summary.rows, summary.matched
    ));
    for (counter, n) in &summary.counts {
        out.push_str(&format!("{}: {}\n", counter, n));
    }
    out.push_str(&format!("wrote {}\n", summary.output.display()));
    out
}
