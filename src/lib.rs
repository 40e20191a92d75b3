//! tabstore - schema-validated status tables with symlinked backup rotation
//!
//! A dataset keeps a handful of tab-separated tables (a participant manifest,
//! curation and processing status). Each table is bound to a schema, can be
//! diffed against another copy, and is updated by keyed upsert. Saving writes
//! a timestamped snapshot into a hidden backup directory and repoints the
//! table's path, a symlink, at it.

pub mod backup;
pub mod cli;
pub mod config;
pub mod observability;
pub mod schema;
pub mod table;
