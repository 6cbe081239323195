//! CLI module
//!
//! Command-line interface for running the tap.
//!
//! # Commands
//!
//! - `discover` - Print the stream catalog
//! - `read` - Extract data from streams as singer messages on stdout
//! - `streams` - List stream names

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
