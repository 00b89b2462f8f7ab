//! Shared types for the tracegen workspace.
//!
//! This crate provides the data model used by every stage of the pipeline,
//! so that the analysis, snapshot and synthesis crates never depend on each
//! other just to exchange values.
//!
//! ## Method model
//!
//! The [`method`] module describes methods of the target program as the
//! program model exposes them:
//! - [`MethodDescriptor`] - immutable signature, modifiers and declaring-type facts
//! - [`InvocationSite`] - a call found in a method body, pointing at its target
//! - [`InstrumentedMethod`] - a method observed at runtime (one capture-log row)
//!
//! ## Snapshot model
//!
//! The [`snapshot`] module holds captured object graphs:
//! - [`Snapshot`] - serialized text plus its [`SerializationFormat`]
//! - [`SnapshotTriple`] - the (receiving, params, outcome) fixture for one test

pub mod env_utils;
pub mod method;
pub mod snapshot;

pub use method::{
    BodyShape, DeclaringType, InstrumentedMethod, InvocationSite, MethodDescriptor,
    MethodModifiers, TypeKind, Visibility, PRIMITIVE_TYPES,
};
pub use method::{method_signature, parse_param_list};
pub use snapshot::{OutcomeKind, SerializationFormat, Snapshot, SnapshotTriple};
