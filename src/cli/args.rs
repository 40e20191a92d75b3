//! CLI argument definitions using clap
//!
//! Commands:
//! - tabstore validate --config <path> --table <name> [--file <path>]
//! - tabstore diff --config <path> --table <name> --other <path> [--columns a,b]
//! - tabstore merge --config <path> --table <name> --input <path> [--dry-run]
//! - tabstore history --config <path> --table <name>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::observability::Severity;

/// tabstore - schema-validated tabular records with backup rotation
#[derive(Parser, Debug)]
#[command(name = "tabstore")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Minimum log severity (overrides TABSTORE_LOG)
    #[arg(long, global = true)]
    pub log_level: Option<Severity>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a table against its schema
    Validate {
        /// Path to configuration file
        #[arg(long, default_value = "./tabstore.json")]
        config: PathBuf,

        /// Configured table name
        #[arg(long)]
        table: String,

        /// Validate this file instead of the table's reference
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Print the rows of a table that are absent from another file
    Diff {
        /// Path to configuration file
        #[arg(long, default_value = "./tabstore.json")]
        config: PathBuf,

        /// Configured table name
        #[arg(long)]
        table: String,

        /// File to compare against
        #[arg(long)]
        other: PathBuf,

        /// Columns to compare (default: the table's index columns)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
    },

    /// Upsert the rows of a file into a table and commit a new snapshot
    Merge {
        /// Path to configuration file
        #[arg(long, default_value = "./tabstore.json")]
        config: PathBuf,

        /// Configured table name
        #[arg(long)]
        table: String,

        /// TSV file holding the rows to add or update
        #[arg(long)]
        input: PathBuf,

        /// Report the would-be snapshot without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// List a table's snapshots, oldest first
    History {
        /// Path to configuration file
        #[arg(long, default_value = "./tabstore.json")]
        config: PathBuf,

        /// Configured table name
        #[arg(long)]
        table: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
