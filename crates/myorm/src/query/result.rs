use std::collections::HashMap;

use serde::Serialize;

use crate::client::RowSet;

/// Rows returned by a querier, every cell as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryResult {
    /// Column names in SELECT order.
    pub columns: Vec<String>,
    /// Rows as column -> text maps. NULL is empty text.
    pub rows: Vec<HashMap<String, String>>,
    /// Matching rows before pagination; equal to `rows_count` for unpaged queries.
    pub total_count: u64,
    /// Rows actually returned.
    pub rows_count: u64,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First row, if any.
    pub fn first(&self) -> Option<&HashMap<String, String>> {
        self.rows.first()
    }

    /// Ordered cells of row `index`, following `columns`.
    pub fn row_values(&self, index: usize) -> Option<Vec<&str>> {
        let row = self.rows.get(index)?;
        Some(
            self.columns
                .iter()
                .map(|c| row.get(c).map(String::as_str).unwrap_or_default())
                .collect(),
        )
    }
}

impl From<RowSet> for QueryResult {
    fn from(set: RowSet) -> Self {
        let rows = set.row_maps();
        let count = rows.len() as u64;
        Self {
            columns: set.columns,
            rows,
            total_count: count,
            rows_count: count,
        }
    }
}
