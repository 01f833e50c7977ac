//! Read-only access to the remote tabular store

mod reader;

pub use reader::{Row, RowSet, TableReader};
