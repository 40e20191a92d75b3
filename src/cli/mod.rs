//! Command-line interface
//!
//! Every command prints one JSON document to stdout:
//! `{"status":"ok","data":...}` on success, or
//! `{"status":"error","code":...,"message":...}` on failure. Structured logs
//! go to stderr.

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{diff, history, merge, run, run_command, validate};
pub use errors::{CliError, CliResult};
pub use io::{write_error, write_response};
