//! Generate command - synthesize tests from captured dumps

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

use tracegen::args::GenerateArgs;
use tracegen::config::GenerateConfig;
use tracegen::emit::{emit_suites, write_run_metadata, EmittedFile};
use tracegen::runner::{run_generate, SkippedMethod};
use tracegen_synth::SerializerIdiom;

use super::output::{format_run_summary, print_json};

#[derive(Parser, Debug)]
pub struct GenerateCmd {
    #[command(flatten)]
    pub args: GenerateArgs,
}

#[derive(Serialize)]
struct GenerateJson<'a> {
    candidates: usize,
    instrumented: usize,
    snapshots_paired: usize,
    tests_emitted: usize,
    skipped: &'a [SkippedMethod],
    files: &'a [EmittedFile],
    run_metadata: PathBuf,
}

impl GenerateCmd {
    pub fn execute(&self, json: bool, verbose: bool) -> Result<()> {
        let config = GenerateConfig::from_args(&self.args)?;
        let report = run_generate(&config)?;

        let idiom = SerializerIdiom::for_format(config.serializer);
        let files = emit_suites(&config.out_dir, &report.suites, idiom)?;
        let run_metadata = write_run_metadata(&config, &report, &files)?;

        if json {
            print_json(&GenerateJson {
                candidates: report.candidates,
                instrumented: report.instrumented,
                snapshots_paired: report.snapshots_paired,
                tests_emitted: report.tests_emitted,
                skipped: &report.skipped,
                files: &files,
                run_metadata,
            })
        } else {
            print!("{}", format_run_summary(&report, &files, verbose));
            Ok(())
        }
    }
}
