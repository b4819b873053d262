//! Command-line interface for the `fms` binary.

mod commands;

pub use commands::{is_verbose, run};
