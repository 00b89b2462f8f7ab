//! Classify-diff command - join a capture log with mutation-testing reports

use anyhow::{bail, Result};
use clap::Parser;

use tracegen::args::ClassifyDiffArgs;
use tracegen::classify_diff::{classify_diff, find_reports, load_classifications};

use super::output::{format_diff_summary, print_json};

#[derive(Parser, Debug)]
pub struct ClassifyDiffCmd {
    #[command(flatten)]
    pub args: ClassifyDiffArgs,
}

impl ClassifyDiffCmd {
    pub fn execute(&self, json: bool) -> Result<()> {
        let mut reports = self.args.report.clone();
        if let Some(dir) = &self.args.report_dir {
            reports.extend(find_reports(dir)?);
        }
        if reports.is_empty() {
            bail!("no methods.json reports found");
        }

        let classifications = load_classifications(&reports)?;
        let summary = classify_diff(&self.args.invoked, &classifications, &self.args.output)?;
        if json {
            print_json(&summary)
        } else {
            print!("{}", format_diff_summary(&summary));
            Ok(())
        }
    }
}
