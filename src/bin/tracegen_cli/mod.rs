//! Subcommands of the tracegen CLI.

pub mod classify_diff;
pub mod extract;
pub mod generate;
pub mod output;
