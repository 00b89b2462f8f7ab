//! Candidate and mockability analysis.
//!
//! This crate is the static half of tracegen. Given a program model it
//! decides, per method, which call sites can be replaced by test doubles and
//! which methods are worth turning into trace-based tests.
//!
//! # Pipeline
//!
//! ```text
//! model.json ──► ProgramModel ──► classifier (per call site)
//!                                     │
//!                                     ▼
//!                                  tagger ──► TagTable ──► candidates / report
//! ```
//!
//! # Example
//!
//! ```
//! use tracegen_extract::{tag_all, ProgramModel, Tag};
//!
//! let model = ProgramModel::from_json_str(
//!     r#"{"types":[{"name":"a.B","methods":[{"name":"getX","modifiers":["public"],
//!         "return_type":"int","body":{"statements":1}}]}]}"#,
//!     "inline",
//! )?;
//! let table = tag_all(&model);
//! assert!(table.get("a.B#getX()").unwrap().tags.get(Tag::Accessor));
//! # Ok::<(), tracegen_extract::ModelError>(())
//! ```

pub mod candidates;
pub mod classifier;
pub mod model;
pub mod report;
pub mod tagger;

pub use candidates::{
    is_candidate, is_instrumentation_candidate, select_candidates,
    select_instrumentation_candidates, SelectionOptions,
};
pub use classifier::{
    classify_invocations, is_mockable, nested_invocation_map, rejection, InvocationKey, Rejection,
};
pub use model::{ModelDiagnostic, ModelError, ModelMethod, ProgramModel};
pub use report::{write_rows, ExtractedMethodRow};
pub use tagger::{tag_all, tag_method, Tag, TagSet, TagTable, TaggedMethod};
