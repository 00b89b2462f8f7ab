use clap::{Args, ValueEnum};
use std::path::PathBuf;

use tracegen_types::SerializationFormat;

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum SerializerArg {
    /// Tree-structured XML, the format dumps are captured in.
    #[value(alias = "xstream")]
    Xml,
    /// JSON tree encoding. Needs `--classfiles`.
    #[value(alias = "gson")]
    Json,
}

impl From<SerializerArg> for SerializationFormat {
    fn from(arg: SerializerArg) -> Self {
        match arg {
            SerializerArg::Xml => SerializationFormat::Xml,
            SerializerArg::Json => SerializationFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct ExtractArgs {
    /// Program model JSON produced by the front end.
    #[arg(long, value_name = "PATH")]
    pub model: PathBuf,

    /// Directory for extracted-methods.csv, instrumentation-candidates.csv and tags.json.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Also select methods that return no value.
    #[arg(long, default_value_t = false)]
    pub include_void: bool,
}

#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    /// Program model JSON produced by the front end.
    #[arg(long, value_name = "PATH")]
    pub model: PathBuf,

    /// Capture log listing the methods observed at runtime.
    #[arg(long, value_name = "PATH")]
    pub invoked: PathBuf,

    /// Directory holding the per-method dump files.
    #[arg(long, value_name = "DIR")]
    pub dumps: PathBuf,

    /// Root of the generated test sources.
    #[arg(long, value_name = "DIR")]
    pub out_dir: PathBuf,

    /// Serializer the generated tests use at runtime.
    #[arg(long, value_enum, default_value_t = SerializerArg::Xml)]
    pub serializer: SerializerArg,

    /// Compiled classes or jars of the target program. Can be provided multiple times.
    ///
    /// Required when `--serializer` differs from the capture format.
    #[arg(long, value_name = "PATH")]
    pub classfiles: Vec<PathBuf>,

    /// Also generate tests for methods that return no value [env: TRACEGEN_INCLUDE_VOID].
    #[arg(long, default_value_t = false)]
    pub include_void: bool,

    /// Longest snapshot, in bytes, embedded as a string literal [env: TRACEGEN_INLINE_LIMIT].
    #[arg(long, value_name = "BYTES")]
    pub inline_limit: Option<usize>,

    /// Worker threads for per-method processing [env: TRACEGEN_THREADS].
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,
}

#[derive(Debug, Clone, Args)]
pub struct ClassifyDiffArgs {
    /// Capture log with a `classification` column.
    #[arg(long, value_name = "PATH")]
    pub invoked: PathBuf,

    /// Mutation-testing methods report. Can be provided multiple times.
    #[arg(long, value_name = "PATH", required_unless_present = "report_dir")]
    pub report: Vec<PathBuf>,

    /// Directory searched recursively for methods.json reports.
    #[arg(long, value_name = "DIR")]
    pub report_dir: Option<PathBuf>,

    /// Where to write the joined CSV.
    #[arg(long, value_name = "PATH", default_value = "invoked-methods-result.csv")]
    pub output: PathBuf,
}
