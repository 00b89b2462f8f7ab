//! tracegen
//!
//! Turns runtime-captured invocation snapshots of production methods into
//! executable regression tests:
//!
//! - **extract**: tag every method of a program model and list the ones worth
//!   recording at runtime
//! - **generate**: pair captured receiving/params/outcome snapshots and emit
//!   one test per distinct capture
//! - **classify-diff**: compare mutation-testing classifications before and
//!   after the generated tests were added
//!
//! The analysis lives in [`tracegen_extract`], snapshot handling in
//! [`tracegen_snapshot`] and synthesis in [`tracegen_synth`]. This crate holds
//! the glue: configuration, the capture log reader, the pipeline
//! [`runner`] and the source [`emit`]ter.

pub mod args;
pub mod capture_log;
pub mod classify_diff;
pub mod config;
pub mod emit;
pub mod extract;
pub mod runner;
pub mod utils;
