//! Source and resource emission.
//!
//! Lays synthesized suites out as a test source tree:
//!
//! ```text
//! <out>/src/test/java/<package path>/<Class>.java
//! <out>/src/test/resources/<resource>
//! <out>/run_metadata.json
//! ```

use anyhow::Result;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use tracegen_synth::{GeneratedTestCase, SerializerIdiom, Statement, SynthesizedSuite};
use tracegen_types::DeclaringType;

use crate::config::GenerateConfig;
use crate::runner::{RunReport, SkippedMethod};
use crate::utils::{capitalize, sha256_hex, write_file, write_json_pretty};

const INDENT: &str = "    ";
const STATEMENT_INDENT: &str = "        ";
const CONTINUATION_INDENT: &str = "                ";

const FIXED_IMPORTS: &[&str] = &["java.io.File", "java.util.Scanner", "org.junit.jupiter.api.Test"];
const STATIC_IMPORTS: &[&str] = &["org.junit.jupiter.api.Assertions.assertEquals"];

/// A file written under the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmittedFile {
    /// Relative to the output directory, `/`-separated
    pub path: String,
    pub sha256: String,
    pub bytes: usize,
}

/// Java source for one suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestClass {
    pub package: String,
    pub name: String,
    pub source: String,
}

impl TestClass {
    /// Path of the source file relative to the output directory.
    pub fn relative_path(&self) -> PathBuf {
        let mut path = PathBuf::from("src/test/java");
        for segment in self.package.split('.').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path.push(format!("{}.java", self.name));
        path
    }
}

/// Class name for each suite, in suite order.
///
/// Suites for overloads of one method share a base name and are told apart
/// by `Overload<k>`, numbered in signature order. Distinct types that share a
/// simple name in one package (nested types) are named by their path below
/// the package, `Outer_Inner`, and any name still taken gets a numeric suffix.
pub fn class_names(suites: &[SynthesizedSuite]) -> Vec<String> {
    let mut groups: BTreeMap<(&str, &str), Vec<usize>> = BTreeMap::new();
    for (i, suite) in suites.iter().enumerate() {
        let m = &suite.method;
        groups
            .entry((m.declaring_type.name.as_str(), m.name.as_str()))
            .or_default()
            .push(i);
    }

    // Simple names claimed by more than one declaring type, per package.
    let mut claims: BTreeMap<(&str, &str), BTreeSet<&str>> = BTreeMap::new();
    for suite in suites {
        let ty = &suite.method.declaring_type;
        claims
            .entry((ty.package(), ty.simple_name()))
            .or_default()
            .insert(ty.name.as_str());
    }

    let mut names = vec![String::new(); suites.len()];
    for members in groups.values() {
        let mut ordered = members.clone();
        ordered.sort_by_key(|&i| suites[i].method.signature());
        for (k, &i) in ordered.iter().enumerate() {
            let m = &suites[i].method;
            let ty = &m.declaring_type;
            let type_part = if claims[&(ty.package(), ty.simple_name())].len() > 1 {
                nested_type_name(ty)
            } else {
                ty.simple_name().to_string()
            };
            let base = format!("{}{}", type_part, capitalize(&m.name));
            names[i] = if ordered.len() > 1 {
                format!("{}Overload{}", base, k + 1)
            } else {
                base
            };
        }
    }

    let mut order: Vec<usize> = (0..suites.len()).collect();
    order.sort_by_key(|&i| suites[i].method.signature());
    let mut taken: BTreeSet<(String, String)> = BTreeSet::new();
    for i in order {
        let package = suites[i].method.declaring_type.package().to_string();
        let stem = names[i].clone();
        let mut candidate = stem.clone();
        let mut n = 2;
        while !taken.insert((package.clone(), candidate.clone())) {
            candidate = format!("{}{}", stem, n);
            n += 1;
        }
        names[i] = format!("{}Test", candidate);
    }
    names
}

/// Type name below its package, nesting markers turned into `_`.
fn nested_type_name(ty: &DeclaringType) -> String {
    let package = ty.package();
    let local = if package.is_empty() {
        ty.name.as_str()
    } else {
        &ty.name[package.len() + 1..]
    };
    local.replace(['$', '.'], "_")
}

pub fn render_test_class(suite: &SynthesizedSuite, class_name: &str, idiom: SerializerIdiom) -> TestClass {
    let package = suite.method.declaring_type.package().to_string();
    let mut out = String::new();

    if !package.is_empty() {
        out.push_str(&format!("package {};\n\n", package));
    }
    let imports: BTreeSet<&str> = idiom
        .imports()
        .iter()
        .chain(FIXED_IMPORTS)
        .copied()
        .collect();
    for import in &imports {
        out.push_str(&format!("import {};\n", import));
    }
    out.push('\n');
    for import in STATIC_IMPORTS {
        out.push_str(&format!("import static {};\n", import));
    }
    out.push('\n');

    out.push_str(&format!("public class {} {{\n\n", class_name));
    out.push_str(&format!("{}{}\n", INDENT, idiom.field_declaration()));

    let method_name = capitalize(&suite.method.name);
    for case in &suite.cases {
        out.push('\n');
        render_case(&mut out, &method_name, case);
    }
    out.push_str("}\n");

    TestClass {
        package,
        name: class_name.to_string(),
        source: out,
    }
}

fn render_case(out: &mut String, method_name: &str, case: &GeneratedTestCase) {
    out.push_str(&format!("{}@Test\n", INDENT));
    out.push_str(&format!(
        "{}public void test{}{}() throws Exception {{\n",
        INDENT, method_name, case.index
    ));
    for statement in &case.statements {
        let continuation = match statement {
            Statement::EmbedLiteral { .. } => CONTINUATION_INDENT,
            _ => STATEMENT_INDENT,
        };
        let rendered = statement.to_string();
        for (i, line) in rendered.lines().enumerate() {
            out.push_str(if i == 0 { STATEMENT_INDENT } else { continuation });
            out.push_str(line);
            out.push('\n');
        }
    }
    out.push_str(&format!("{}}}\n", INDENT));
}

fn record(out_dir: &Path, relative: &Path, contents: &str) -> Result<EmittedFile> {
    write_file(&out_dir.join(relative), contents)?;
    let path = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");
    debug!(path = %path, bytes = contents.len(), "wrote file");
    Ok(EmittedFile {
        path,
        sha256: sha256_hex(contents.as_bytes()),
        bytes: contents.len(),
    })
}

/// Write every suite's class and resources under `out_dir`.
pub fn emit_suites(
    out_dir: &Path,
    suites: &[SynthesizedSuite],
    idiom: SerializerIdiom,
) -> Result<Vec<EmittedFile>> {
    let mut files = Vec::new();
    let resources = Path::new("src/test/resources");
    for (suite, name) in suites.iter().zip(class_names(suites)) {
        let class = render_test_class(suite, &name, idiom);
        files.push(record(out_dir, &class.relative_path(), &class.source)?);
        for case in &suite.cases {
            for resource in &case.resources {
                files.push(record(out_dir, &resources.join(&resource.name), &resource.contents)?);
            }
        }
    }
    info!(files = files.len(), out_dir = %out_dir.display(), "emitted test sources");
    Ok(files)
}

#[derive(Debug, Serialize)]
struct RunCounts {
    candidates: usize,
    instrumented: usize,
    snapshots_paired: usize,
    tests_emitted: usize,
    skipped: usize,
}

#[derive(Debug, Serialize)]
struct RunMetadata<'a> {
    tool: &'static str,
    tool_version: &'static str,
    generated_at: String,
    elapsed_ms: u64,
    config: &'a GenerateConfig,
    counts: RunCounts,
    skip_counts: BTreeMap<&'static str, usize>,
    classfiles: Vec<String>,
    skipped: &'a [SkippedMethod],
    files: &'a [EmittedFile],
}

/// Write `run_metadata.json` describing the run. Returns its path.
pub fn write_run_metadata(
    config: &GenerateConfig,
    report: &RunReport,
    files: &[EmittedFile],
) -> Result<PathBuf> {
    let meta = RunMetadata {
        tool: "tracegen",
        tool_version: env!("CARGO_PKG_VERSION"),
        generated_at: chrono::Utc::now().to_rfc3339(),
        elapsed_ms: report.elapsed_ms,
        config,
        counts: RunCounts {
            candidates: report.candidates,
            instrumented: report.instrumented,
            snapshots_paired: report.snapshots_paired,
            tests_emitted: report.tests_emitted,
            skipped: report.skipped.len(),
        },
        skip_counts: report
            .skip_counts()
            .into_iter()
            .map(|(reason, n)| (reason.as_str(), n))
            .collect(),
        classfiles: config
            .classfiles
            .iter()
            .map(|p| p.display().to_string())
            .collect(),
        skipped: &report.skipped,
        files,
    };
    let path = config.out_dir.join("run_metadata.json");
    write_json_pretty(&path, &meta)?;
    Ok(path)
}
