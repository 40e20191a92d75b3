//! Tabular record sets
//!
//! A [`RecordSet`] is an ordered collection of rows bound to a [`Schema`].
//! Rows come from a TSV file or from memory and stay untyped until
//! [`RecordSet::validate`] produces a typed copy.
//!
//! Operations are split by concern:
//! - `io`: fixed-format TSV load and store
//! - `validator`: typed validation and duplicate detection
//! - `diff`: set difference over a column subset
//! - `merge`: key-based upsert and concatenation
//! - `equality`: order- and type-insensitive comparison
//!
//! [`Schema`]: crate::schema::Schema

mod diff;
mod equality;
mod errors;
mod io;
mod merge;
mod record_set;
mod validator;
mod value;

pub use errors::{CellError, TableError, TableResult};
pub use io::LoadOptions;
pub use record_set::RecordSet;
pub use value::{Record, Value};
