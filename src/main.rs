//! tabstore CLI entry point
//!
//! Parses arguments, dispatches to the command, and exits non-zero on
//! failure. The error response has already been written to stdout by the
//! CLI module; the message is repeated on stderr for interactive use.

use tabstore::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
