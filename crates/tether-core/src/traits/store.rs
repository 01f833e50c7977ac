//! Tabular store capability surface

use crate::error::StoreFault;

/// Read-only query access to the remote tabular store
pub trait TableStore: Send + Sync {
    /// Run a read query against `table`.
    ///
    /// `Ok(None)` means the store handed back no cursor and no
    /// distinguishable error; callers must treat that as a hard stop, not
    /// retry it.
    fn query(&self, table: &str) -> Result<Option<Box<dyn RowCursor>>, StoreFault>;
}

/// Forward-only cursor over query results.
///
/// Row count is not known in advance; columns are fixed for the cursor's
/// lifetime.
pub trait RowCursor: Send {
    /// Position on the first row. Returns `false` when the result is empty.
    fn move_to_first(&mut self) -> bool;

    /// Advance to the next row. Returns `false` past the last row.
    fn move_to_next(&mut self) -> bool;

    /// Number of columns in this result
    fn column_count(&self) -> usize;

    /// Name of column `index`
    fn column_name(&self, index: usize) -> &str;

    /// Value of column `index` in the current row; `None` for NULL
    fn string_value(&self, index: usize) -> Option<String>;
}
