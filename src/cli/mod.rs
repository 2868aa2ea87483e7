//! Command line interface module
//!
//! This module provides argument parsing and the runner that streams a
//! registry's repositories to standard output.

pub mod args;
pub mod runner;

pub use args::{Args, OutputFormat};
pub use runner::Runner;
