//! Generate pipeline runner.
//!
//! Loads the program model and capture log, then processes every
//! instrumented method independently: resolve it against the model, parse
//! its dumps, synthesize its test cases. Methods are processed on a rayon
//! pool and the results are sorted by signature, so output never depends on
//! scheduling.
//!
//! Only an unreadable model or capture log aborts the run. Everything that
//! goes wrong for a single method becomes a [`SkippedMethod`].

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;
use tracing::{info, warn};

use tracegen_extract::{
    select_candidates, tag_all, ModelMethod, ProgramModel, SelectionOptions, TagTable,
};
use tracegen_snapshot::{SnapshotError, SnapshotParser};
use tracegen_synth::{SynthesisOptions, SynthesizedSuite, TestSynthesizer};
use tracegen_types::InstrumentedMethod;

use crate::capture_log::read_capture_log;
use crate::config::GenerateConfig;

/// Why a method produced no (or fewer) tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// Not resolvable in the program model, or not a test candidate
    ModelError,
    /// No dump files were recorded
    CaptureAbsent,
    /// Dump files exist but could not be read as snapshots
    MalformedCapture,
    /// A snapshot triple could not be turned into a sound test
    SynthesisInvariant,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::ModelError => "model-error",
            SkipReason::CaptureAbsent => "capture-absent",
            SkipReason::MalformedCapture => "malformed-capture",
            SkipReason::SynthesisInvariant => "synthesis-invariant",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedMethod {
    pub signature: String,
    pub reason: SkipReason,
    pub detail: String,
}

impl fmt::Display for SkippedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SKIP [{}] {}: {}", self.reason, self.signature, self.detail)
    }
}

/// Result of processing one instrumented method.
#[derive(Debug)]
struct MethodOutcome {
    signature: String,
    paired: usize,
    suite: Option<SynthesizedSuite>,
    skipped: Vec<SkippedMethod>,
}

impl MethodOutcome {
    fn skip(signature: String, reason: SkipReason, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        warn!(method = %signature, reason = %reason, "{}", detail);
        Self {
            skipped: vec![SkippedMethod {
                signature: signature.clone(),
                reason,
                detail,
            }],
            signature,
            paired: 0,
            suite: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct RunReport {
    /// Candidate methods found in the program model
    pub candidates: usize,
    /// Records in the capture log
    pub instrumented: usize,
    /// Triples formed by positional pairing, before filtering
    pub snapshots_paired: usize,
    pub tests_emitted: usize,
    /// Suites with at least one case, sorted by method signature
    pub suites: Vec<SynthesizedSuite>,
    pub skipped: Vec<SkippedMethod>,
    pub elapsed_ms: u64,
}

impl RunReport {
    pub fn skip_counts(&self) -> BTreeMap<SkipReason, usize> {
        let mut counts = BTreeMap::new();
        for s in &self.skipped {
            *counts.entry(s.reason).or_insert(0) += 1;
        }
        counts
    }
}

/// Per-run state shared read-only by every worker.
struct Pipeline<'a> {
    model: &'a ProgramModel,
    table: &'a TagTable,
    candidates: BTreeMap<String, &'a ModelMethod>,
    parser: SnapshotParser,
    synthesizer: TestSynthesizer,
}

impl Pipeline<'_> {
    fn process(&self, record: &InstrumentedMethod) -> MethodOutcome {
        let signature = record.signature();

        let Some(method) = self.candidates.get(&signature) else {
            let detail = if self.model.get(&signature).is_some() {
                "not a test candidate"
            } else {
                "not found in program model"
            };
            return MethodOutcome::skip(signature, SkipReason::ModelError, detail);
        };
        let Some(tagged) = self.table.get(&signature) else {
            return MethodOutcome::skip(signature, SkipReason::ModelError, "method was not tagged");
        };

        let parsed = match self.parser.parse(record) {
            Ok(parsed) => parsed,
            Err(e) => {
                let reason = classify_snapshot_error(&e);
                return MethodOutcome::skip(signature, reason, e.to_string());
            }
        };
        if parsed.triples.is_empty() {
            let mut outcome = MethodOutcome::skip(
                signature,
                SkipReason::CaptureAbsent,
                "no snapshots found in dump files",
            );
            outcome.paired = parsed.paired;
            return outcome;
        }

        let suite =
            self.synthesizer
                .synthesize_suite(&method.descriptor, &tagged.tags, &parsed.triples);
        let skipped = suite
            .rejected
            .iter()
            .map(|e| {
                warn!(method = %signature, "skipping snapshot: {}", e);
                SkippedMethod {
                    signature: signature.clone(),
                    reason: SkipReason::SynthesisInvariant,
                    detail: e.to_string(),
                }
            })
            .collect();

        MethodOutcome {
            signature,
            paired: parsed.paired,
            suite: (!suite.cases.is_empty()).then_some(suite),
            skipped,
        }
    }
}

fn classify_snapshot_error(e: &SnapshotError) -> SkipReason {
    if e.is_capture_absent() {
        SkipReason::CaptureAbsent
    } else {
        SkipReason::MalformedCapture
    }
}

/// Run analysis and synthesis for a validated configuration.
pub fn run_generate(config: &GenerateConfig) -> Result<RunReport> {
    let start = Instant::now();

    let model = ProgramModel::load(&config.model).context("load program model")?;
    let table = tag_all(&model);
    let selection = SelectionOptions {
        include_void: config.include_void,
    };
    let candidates: BTreeMap<String, &ModelMethod> = select_candidates(&model, selection)
        .into_iter()
        .map(|m| (m.signature(), m))
        .collect();
    info!(
        methods = model.len(),
        candidates = candidates.len(),
        "selected candidate methods"
    );

    let records = read_capture_log(&config.invoked)?;
    info!(
        records = records.len(),
        serializer = %config.serializer,
        transcode = config.needs_transcoding(),
        "loaded capture log"
    );

    let candidate_count = candidates.len();
    let pipeline = Pipeline {
        model: &model,
        table: &table,
        candidates,
        parser: SnapshotParser::new(&config.dumps),
        synthesizer: TestSynthesizer::new(SynthesisOptions {
            serializer: config.serializer,
            inline_limit: config.inline_limit,
        }),
    };

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = config.threads {
        builder = builder.num_threads(threads);
    }
    let pool = builder.build().context("build worker pool")?;
    let mut outcomes: Vec<MethodOutcome> =
        pool.install(|| records.par_iter().map(|r| pipeline.process(r)).collect());
    outcomes.sort_by(|a, b| a.signature.cmp(&b.signature));

    let mut report = RunReport {
        candidates: candidate_count,
        instrumented: records.len(),
        ..Default::default()
    };
    for outcome in outcomes {
        report.snapshots_paired += outcome.paired;
        report.skipped.extend(outcome.skipped);
        if let Some(suite) = outcome.suite {
            report.tests_emitted += suite.cases.len();
            report.suites.push(suite);
        }
    }
    report.elapsed_ms = start.elapsed().as_millis() as u64;

    info!(
        candidates = report.candidates,
        snapshots_paired = report.snapshots_paired,
        tests = report.tests_emitted,
        skipped = report.skipped.len(),
        elapsed_ms = report.elapsed_ms,
        "generation finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use tracegen_types::SerializationFormat;

    const MODEL: &str = r#"{"types":[
        {"name":"a.Calc","methods":[
            {"name":"add","modifiers":["public"],"parameters":["int"],"return_type":"int",
             "body":{"statements":2}},
            {"name":"reset","modifiers":["public"],"body":{"statements":1}},
            {"name":"peek","modifiers":["public"],"return_type":"int","body":{"statements":1}},
            {"name":"secret","modifiers":["private"],"return_type":"int","body":{"statements":1}}
        ]}
    ]}"#;

    const LOG: &str = "\
parent-FQN,method-name,param-list,return-type,nb-invocations
a.Calc,add,[int],int,2
a.Calc,peek,[],int,1
a.Calc,secret,[],int,1
a.Calc,missing,[],int,1
a.Calc,reset,[],void,1
";

    fn setup(dir: &TempDir) -> GenerateConfig {
        let dumps = dir.path().join("dumps");
        fs::create_dir(&dumps).unwrap();
        fs::write(dir.path().join("model.json"), MODEL).unwrap();
        fs::write(dir.path().join("invoked.csv"), LOG).unwrap();
        fs::write(dumps.join("a.Calc.add_int-receiving.xml"), "<a.Calc/>\n<a.Calc/>").unwrap();
        fs::write(
            dumps.join("a.Calc.add_int-params.xml"),
            "<object-array><int>1</int></object-array>\n<object-array><int>2</int></object-array>",
        )
        .unwrap();
        fs::write(dumps.join("a.Calc.add_int-returned.xml"), "<int>1</int>\n<int>2</int>").unwrap();
        fs::write(dumps.join("a.Calc.peek-receiving.xml"), "<a.Calc><v>1</a.Calc>").unwrap();
        fs::write(dumps.join("a.Calc.peek-returned.xml"), "<int>1</int>").unwrap();
        GenerateConfig {
            model: dir.path().join("model.json"),
            invoked: dir.path().join("invoked.csv"),
            dumps,
            out_dir: dir.path().join("out"),
            serializer: SerializationFormat::Xml,
            classfiles: Vec::new(),
            include_void: false,
            inline_limit: 10_000,
            threads: Some(2),
        }
    }

    #[test]
    fn test_run_collects_tests_and_skips() {
        let dir = TempDir::new().unwrap();
        let report = run_generate(&setup(&dir)).unwrap();

        assert_eq!(report.candidates, 2);
        assert_eq!(report.instrumented, 5);
        assert_eq!(report.snapshots_paired, 2);
        assert_eq!(report.tests_emitted, 2);
        assert_eq!(report.suites.len(), 1);
        assert_eq!(report.suites[0].method.signature(), "a.Calc#add(int)");

        let skipped: Vec<(String, SkipReason)> = report
            .skipped
            .iter()
            .map(|s| (s.signature.clone(), s.reason))
            .collect();
        assert_eq!(
            skipped,
            vec![
                ("a.Calc#missing()".to_string(), SkipReason::ModelError),
                ("a.Calc#peek()".to_string(), SkipReason::MalformedCapture),
                ("a.Calc#reset()".to_string(), SkipReason::ModelError),
                ("a.Calc#secret()".to_string(), SkipReason::ModelError),
            ]
        );
        assert_eq!(report.skip_counts()[&SkipReason::ModelError], 3);
    }

    #[test]
    fn test_include_void_reaches_capture_stage() {
        let dir = TempDir::new().unwrap();
        let mut config = setup(&dir);
        config.include_void = true;
        let report = run_generate(&config).unwrap();
        let reset = report
            .skipped
            .iter()
            .find(|s| s.signature == "a.Calc#reset()")
            .unwrap();
        assert_eq!(reset.reason, SkipReason::CaptureAbsent);
        assert_eq!(report.candidates, 3);
    }

    #[test]
    fn test_skip_line_format() {
        let skip = SkippedMethod {
            signature: "a.B#c()".to_string(),
            reason: SkipReason::CaptureAbsent,
            detail: "no snapshots found".to_string(),
        };
        assert_eq!(skip.to_string(), "SKIP [capture-absent] a.B#c(): no snapshots found");
    }

    #[test]
    fn test_unreadable_model_aborts() {
        let dir = TempDir::new().unwrap();
        let config = setup(&dir);
        fs::write(&config.model, "{not json").unwrap();
        assert!(run_generate(&config).is_err());
    }
}
