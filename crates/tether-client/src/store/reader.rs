//! Table reader
//!
//! Executes read queries against the external tabular store and exposes
//! results as lazy, forward-only row sets. Every known failure mode of the
//! store maps to its own [`QueryError`] variant; only faults outside the
//! known taxonomy propagate unchanged.

use std::sync::Arc;

use tether_core::error::{QueryError, StoreFault, READ_ACCESS_DISABLED};
use tether_core::traits::{RowCursor, TableStore};

/// Read-only query façade over the remote tabular store
pub struct TableReader {
    store: Arc<dyn TableStore>,
}

impl TableReader {
    /// Create a reader over `store`
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    /// Run a read query against `table`.
    ///
    /// None of the error outcomes is retryable; callers must branch on the
    /// variant. [`QueryError::FeatureDisabled`] and
    /// [`QueryError::AccessDenied`] are distinct conditions with distinct
    /// diagnostics and must not be conflated.
    pub fn query(&self, table: &str) -> Result<RowSet, QueryError> {
        let cursor = match self.store.query(table) {
            Ok(Some(cursor)) => cursor,
            Ok(None) => {
                // no cursor and no diagnostic: hard stop, never retried
                tracing::error!(table, "store returned no cursor and no diagnostic");
                return Err(QueryError::NullResult);
            }
            Err(StoreFault::InvalidArgument(detail)) => {
                tracing::error!(table, %detail, "no such table in the remote schema");
                return Err(QueryError::InvalidTable(table.to_string()));
            }
            Err(StoreFault::PermissionDenied(detail)) => {
                tracing::error!(
                    table,
                    %detail,
                    "access denied; check this client is signed to match the service"
                );
                return Err(QueryError::AccessDenied(detail));
            }
            Err(StoreFault::Runtime(detail)) if detail == READ_ACCESS_DISABLED => {
                tracing::error!(table, "read access was disabled when the service was built");
                return Err(QueryError::FeatureDisabled);
            }
            // outside the known taxonomy: not ours to interpret
            Err(fault) => return Err(QueryError::Fault(fault)),
        };

        Ok(RowSet::new(cursor))
    }
}

/// Lazy, forward-only, non-restartable sequence of rows.
///
/// Column names are fixed at creation; row count is unknown until the
/// cursor runs out.
pub struct RowSet {
    cursor: Box<dyn RowCursor>,
    columns: Arc<[String]>,
    started: bool,
    done: bool,
}

impl RowSet {
    fn new(cursor: Box<dyn RowCursor>) -> Self {
        let columns: Arc<[String]> = (0..cursor.column_count())
            .map(|i| cursor.column_name(i).to_string())
            .collect::<Vec<_>>()
            .into();
        Self {
            cursor,
            columns,
            started: false,
            done: false,
        }
    }

    /// Column names, in cursor order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl std::fmt::Debug for RowSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowSet")
            .field("columns", &self.columns)
            .field("started", &self.started)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl Iterator for RowSet {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        if self.done {
            return None;
        }

        let advanced = if self.started {
            self.cursor.move_to_next()
        } else {
            self.started = true;
            self.cursor.move_to_first()
        };
        if !advanced {
            self.done = true;
            return None;
        }

        let values = (0..self.columns.len())
            .map(|i| self.cursor.string_value(i))
            .collect();
        Some(Row {
            columns: Arc::clone(&self.columns),
            values,
        })
    }
}

/// One row: column name to nullable string value
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Option<String>>,
}

impl Row {
    /// Value of `column`; `None` when the value is NULL or the column does
    /// not exist
    pub fn get(&self, column: &str) -> Option<&str> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.values[index].as_deref()
    }

    /// Value by column position; `None` for NULL
    pub fn value(&self, index: usize) -> Option<&str> {
        self.values.get(index)?.as_deref()
    }

    /// Column names, in cursor order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// In-memory cursor over a fixed grid
    struct GridCursor {
        columns: Vec<String>,
        rows: Vec<Vec<Option<String>>>,
        position: Option<usize>,
    }

    impl GridCursor {
        fn new(columns: &[&str], rows: Vec<Vec<Option<String>>>) -> Self {
            Self {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                rows,
                position: None,
            }
        }
    }

    impl RowCursor for GridCursor {
        fn move_to_first(&mut self) -> bool {
            self.position = Some(0);
            !self.rows.is_empty()
        }

        fn move_to_next(&mut self) -> bool {
            let next = self.position.map_or(0, |p| p + 1);
            self.position = Some(next);
            next < self.rows.len()
        }

        fn column_count(&self) -> usize {
            self.columns.len()
        }

        fn column_name(&self, index: usize) -> &str {
            &self.columns[index]
        }

        fn string_value(&self, index: usize) -> Option<String> {
            let row = self.position.and_then(|p| self.rows.get(p))?;
            row[index].clone()
        }
    }

    enum Outcome {
        Rows(Vec<Vec<Option<String>>>),
        Null,
        Fault(fn() -> StoreFault),
    }

    struct FixedStore {
        columns: Vec<String>,
        outcome: Outcome,
    }

    impl FixedStore {
        fn rows(columns: &[&str], rows: Vec<Vec<Option<String>>>) -> Arc<dyn TableStore> {
            Arc::new(Self {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                outcome: Outcome::Rows(rows),
            })
        }

        fn null() -> Arc<dyn TableStore> {
            Arc::new(Self {
                columns: vec![],
                outcome: Outcome::Null,
            })
        }

        fn faulting(fault: fn() -> StoreFault) -> Arc<dyn TableStore> {
            Arc::new(Self {
                columns: vec![],
                outcome: Outcome::Fault(fault),
            })
        }
    }

    impl TableStore for FixedStore {
        fn query(&self, _table: &str) -> Result<Option<Box<dyn RowCursor>>, StoreFault> {
            match &self.outcome {
                Outcome::Rows(rows) => {
                    let columns: Vec<&str> = self.columns.iter().map(|c| c.as_str()).collect();
                    Ok(Some(Box::new(GridCursor::new(&columns, rows.clone()))))
                }
                Outcome::Null => Ok(None),
                Outcome::Fault(make) => Err(make()),
            }
        }
    }

    fn cell(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    #[test]
    fn test_rows_iterate_in_cursor_order() {
        let store = FixedStore::rows(
            &["name", "status"],
            vec![
                vec![cell("alpha"), cell("active")],
                vec![cell("beta"), None],
            ],
        );
        let reader = TableReader::new(store);

        let mut rows = reader.query("Activities").expect("query");
        assert_eq!(rows.columns(), ["name", "status"]);

        let first = rows.next().expect("first row");
        assert_eq!(first.get("name"), Some("alpha"));
        assert_eq!(first.get("status"), Some("active"));

        let second = rows.next().expect("second row");
        assert_eq!(second.get("name"), Some("beta"));
        assert_eq!(second.get("status"), None);
        assert_eq!(second.get("missing"), None);

        assert!(rows.next().is_none());
        // forward-only: exhausted row sets stay exhausted
        assert!(rows.next().is_none());
    }

    #[test]
    fn test_empty_result_yields_no_rows() {
        let store = FixedStore::rows(&["name"], vec![]);
        let reader = TableReader::new(store);

        let mut rows = reader.query("Activities").expect("query");
        assert!(rows.next().is_none());
    }

    #[test]
    fn test_unknown_table_is_invalid_table_not_null_result() {
        let store =
            FixedStore::faulting(|| StoreFault::InvalidArgument("no table Activities".into()));
        let reader = TableReader::new(store);

        let err = reader.query("Activities").unwrap_err();
        assert!(matches!(err, QueryError::InvalidTable(table) if table == "Activities"));
    }

    #[test]
    fn test_permission_fault_maps_to_access_denied() {
        let store =
            FixedStore::faulting(|| StoreFault::PermissionDenied("signature mismatch".into()));
        let reader = TableReader::new(store);

        let err = reader.query("Activities").unwrap_err();
        assert!(matches!(err, QueryError::AccessDenied(_)));
    }

    #[test]
    fn test_disabled_diagnostic_maps_to_feature_disabled() {
        let store = FixedStore::faulting(|| StoreFault::Runtime(READ_ACCESS_DISABLED.into()));
        let reader = TableReader::new(store);

        let err = reader.query("Activities").unwrap_err();
        assert!(matches!(err, QueryError::FeatureDisabled));
        // the two denial flavors must stay textually distinguishable
        assert_ne!(
            err.to_string(),
            QueryError::AccessDenied("signature mismatch".into()).to_string()
        );
    }

    #[test]
    fn test_other_runtime_faults_propagate_unchanged() {
        let store = FixedStore::faulting(|| StoreFault::Runtime("cosmic rays".into()));
        let reader = TableReader::new(store);

        let err = reader.query("Activities").unwrap_err();
        match err {
            QueryError::Fault(StoreFault::Runtime(detail)) => assert_eq!(detail, "cosmic rays"),
            other => panic!("expected pass-through fault, got {:?}", other),
        }
    }

    #[test]
    fn test_null_cursor_is_a_hard_stop() {
        let reader = TableReader::new(FixedStore::null());

        let err = reader.query("Activities").unwrap_err();
        assert!(matches!(err, QueryError::NullResult));
    }
}
