//! Test synthesis for tracegen.
//!
//! Turns a tagged candidate method and its snapshot triples into
//! [`GeneratedTestCase`]s: resource setup, deserialization, one invocation
//! of the method under test, and an assertion on the re-serialized outcome.
//! Laying the cases out as source files is left to the caller.

pub mod layout;
pub mod literal;
pub mod statement;
pub mod synthesizer;

pub use layout::gson_value;
pub use literal::{java_string_literal, SEGMENT_BREAK};
pub use statement::{java_type_name, Role, SerializerIdiom, Statement};
pub use synthesizer::{
    resource_name, GeneratedTestCase, ResourceFile, SynthesisError, SynthesisOptions,
    SynthesizedSuite, TestSynthesizer, DEFAULT_INLINE_LIMIT,
};
