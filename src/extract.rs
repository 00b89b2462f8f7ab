//! `extract`: tag every method of a program model and write the reports the
//! recording side consumes.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use tracegen_extract::{
    select_candidates, select_instrumentation_candidates, tag_all, write_rows,
    ExtractedMethodRow, ModelMethod, ProgramModel, SelectionOptions, TagTable,
};

use crate::utils::write_json_pretty;

pub const EXTRACTED_CSV: &str = "extracted-methods.csv";
pub const INSTRUMENTATION_CSV: &str = "instrumentation-candidates.csv";
pub const TAGS_JSON: &str = "tags.json";

#[derive(Debug, Clone, Serialize)]
pub struct ExtractSummary {
    pub methods: usize,
    pub diagnostics: usize,
    pub candidates: usize,
    pub instrumentation_candidates: usize,
    pub tagging_ms: u64,
    pub extracted_csv: PathBuf,
    pub instrumentation_csv: PathBuf,
    pub tags_json: PathBuf,
}

fn write_csv(path: &Path, methods: &[&ModelMethod], table: &TagTable) -> Result<()> {
    let rows: Vec<ExtractedMethodRow> = methods
        .iter()
        .map(|m| ExtractedMethodRow::new(m, table))
        .collect();
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    write_rows(BufWriter::new(file), &rows).with_context(|| format!("write {}", path.display()))
}

pub fn run_extract(model_path: &Path, out_dir: &Path, include_void: bool) -> Result<ExtractSummary> {
    let model = ProgramModel::load(model_path).context("load program model")?;
    info!(
        methods = model.len(),
        diagnostics = model.diagnostics().len(),
        "loaded program model"
    );

    let start = Instant::now();
    let table = tag_all(&model);
    let tagging_ms = start.elapsed().as_millis() as u64;
    info!(methods = table.len(), elapsed_ms = tagging_ms, "tagged methods");

    let options = SelectionOptions { include_void };
    let candidates = select_candidates(&model, options);
    let instrumentation = select_instrumentation_candidates(&model, &table, options);
    info!(
        candidates = candidates.len(),
        instrumentation_candidates = instrumentation.len(),
        "selected candidates"
    );

    fs::create_dir_all(out_dir).with_context(|| format!("create {}", out_dir.display()))?;
    let extracted_csv = out_dir.join(EXTRACTED_CSV);
    let instrumentation_csv = out_dir.join(INSTRUMENTATION_CSV);
    let tags_json = out_dir.join(TAGS_JSON);
    write_csv(&extracted_csv, &candidates, &table)?;
    write_csv(&instrumentation_csv, &instrumentation, &table)?;
    write_json_pretty(&tags_json, &table)?;

    Ok(ExtractSummary {
        methods: model.len(),
        diagnostics: model.diagnostics().len(),
        candidates: candidates.len(),
        instrumentation_candidates: instrumentation.len(),
        tagging_ms,
        extracted_csv,
        instrumentation_csv,
        tags_json,
    })
}
