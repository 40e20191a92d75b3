//! Schema subsystem
//!
//! Schemas declare the columns a record set may carry: semantic type,
//! whether a value is required, the default for optional columns, and the
//! record kind's uniqueness key.
//!
//! # Design Principles
//!
//! - Schemas are explicit values passed to every record set
//! - Schemas are immutable once registered
//! - Lookups of undeclared columns are errors, never silently defaulted

pub mod builtin;
mod errors;
mod loader;
mod types;

pub use errors::{SchemaError, SchemaResult};
pub use loader::SchemaRegistry;
pub use types::{ColumnDef, ColumnType, Schema};
