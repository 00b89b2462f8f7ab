//! Extract command - tag methods and write candidate reports

use anyhow::Result;
use clap::Parser;

use tracegen::args::ExtractArgs;
use tracegen::extract::run_extract;

use super::output::{format_extract_summary, print_json};

#[derive(Parser, Debug)]
pub struct ExtractCmd {
    #[command(flatten)]
    pub args: ExtractArgs,
}

impl ExtractCmd {
    pub fn execute(&self, json: bool, _verbose: bool) -> Result<()> {
        let summary = run_extract(&self.args.model, &self.args.out_dir, self.args.include_void)?;
        if json {
            print_json(&summary)
        } else {
            print!("{}", format_extract_summary(&summary));
            Ok(())
        }
    }
}
