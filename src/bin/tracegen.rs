//! tracegen: trace-based regression test generation
//!
//! ## Example Usage
//!
//! ```bash
//! # Tag a program model and list instrumentation candidates
//! tracegen extract --model model.json --out-dir analysis/
//!
//! # Generate tests from captured dumps
//! tracegen generate --model model.json --invoked invoked-methods.csv \
//!     --dumps /tmp/dumps --out-dir generated/
//!
//! # Same, but the tests use the JSON serializer at runtime
//! tracegen generate ... --serializer json --classfiles target/classes
//!
//! # Compare mutation-testing classifications
//! tracegen classify-diff --invoked invoked-methods.csv --report-dir reports/
//! ```

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod tracegen_cli;

use tracegen_cli::{classify_diff::ClassifyDiffCmd, extract::ExtractCmd, generate::GenerateCmd};

#[derive(Parser)]
#[command(
    name = "tracegen",
    author,
    version,
    about = "Generate regression tests from captured invocation snapshots"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging and per-file output
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Tag methods and write candidate reports
    Extract(ExtractCmd),

    /// Synthesize tests from captured dumps
    Generate(GenerateCmd),

    /// Join a capture log with mutation-testing reports
    ClassifyDiff(ClassifyDiffCmd),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = if verbose {
        EnvFilter::new(default)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let Cli {
        command,
        json,
        verbose,
    } = Cli::parse();
    init_tracing(verbose);

    let result = match command {
        Commands::Extract(cmd) => cmd.execute(json, verbose),
        Commands::Generate(cmd) => cmd.execute(json, verbose),
        Commands::ClassifyDiff(cmd) => cmd.execute(json),
    };

    if let Err(err) = result {
        eprint!("{}", tracegen_cli::output::format_error(&err, json));
        std::process::exit(1);
    }
}
