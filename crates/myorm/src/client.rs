//! The executor seam.
//!
//! myorm builds SQL and maps rows but never talks to a database itself. Anything that can
//! run a statement implements [`SqlExecutor`] and is passed by reference to each operation,
//! so a pooled connection, a transaction, or a test double all work the same way.

use std::collections::HashMap;

use crate::error::OrmResult;

/// Result of a write statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    pub rows_affected: u64,
    /// Id generated by an autoincrement column, when the store reports one.
    pub last_insert_id: Option<u64>,
}

/// Rows returned by a read, every cell as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowSet {
    pub columns: Vec<String>,
    /// One entry per row, aligned with `columns`. `None` is SQL NULL.
    pub rows: Vec<Vec<Option<String>>>,
}

impl RowSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row; builder style for fixtures.
    pub fn with_row<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        self.rows
            .push(cells.into_iter().map(|c| c.map(Into::into)).collect());
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row `index` as a column -> text map. NULL cells become empty text.
    pub fn row_map(&self, index: usize) -> Option<HashMap<String, String>> {
        let row = self.rows.get(index)?;
        Some(
            self.columns
                .iter()
                .zip(row)
                .map(|(col, cell)| (col.clone(), cell.clone().unwrap_or_default()))
                .collect(),
        )
    }

    /// All rows as column -> text maps.
    pub fn row_maps(&self) -> Vec<HashMap<String, String>> {
        (0..self.rows.len())
            .filter_map(|i| self.row_map(i))
            .collect()
    }

    /// First cell of the first row.
    pub fn first_cell(&self) -> Option<Option<&str>> {
        self.rows
            .first()
            .and_then(|row| row.first())
            .map(|cell| cell.as_deref())
    }
}

/// Runs SQL statements on behalf of the managers.
///
/// Implementations report their own failures through [`crate::OrmError::query`]; myorm
/// logs and propagates them unchanged.
pub trait SqlExecutor: Send + Sync {
    /// Execute a write statement.
    fn exec(&self, sql: &str) -> impl std::future::Future<Output = OrmResult<ExecOutcome>> + Send;

    /// Execute a read and return every row as text.
    fn query(&self, sql: &str) -> impl std::future::Future<Output = OrmResult<RowSet>> + Send;
}

impl<T: SqlExecutor + ?Sized> SqlExecutor for &T {
    fn exec(&self, sql: &str) -> impl std::future::Future<Output = OrmResult<ExecOutcome>> + Send {
        (**self).exec(sql)
    }

    fn query(&self, sql: &str) -> impl std::future::Future<Output = OrmResult<RowSet>> + Send {
        (**self).query(sql)
    }
}
