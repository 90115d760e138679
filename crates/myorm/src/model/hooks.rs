use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::value::Value;

/// Adjusts an entity before it is written.
pub type PreWriteFn<E> = Arc<dyn Fn(&E) -> E + Send + Sync>;
/// Adjusts a decoded entity; receives the raw row it came from.
pub type PostReadFn<E> = Arc<dyn Fn(E, &HashMap<String, String>) -> E + Send + Sync>;
/// Renders a column's value as a SQL literal.
pub type SqlValueFn = Arc<dyn Fn(&Value) -> String + Send + Sync>;
/// Rewrites a column into its SELECT expression.
pub type QueryFieldFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Optional per-manager callbacks.
pub(crate) struct Hooks<E> {
    pub(crate) pre_write: Option<PreWriteFn<E>>,
    pub(crate) post_read: Option<PostReadFn<E>>,
    pub(crate) sql_values: HashMap<String, SqlValueFn>,
    pub(crate) query_field: Option<QueryFieldFn>,
}

impl<E> Default for Hooks<E> {
    fn default() -> Self {
        Self {
            pre_write: None,
            post_read: None,
            sql_values: HashMap::new(),
            query_field: None,
        }
    }
}

impl<E> Clone for Hooks<E> {
    fn clone(&self) -> Self {
        Self {
            pre_write: self.pre_write.clone(),
            post_read: self.post_read.clone(),
            sql_values: self.sql_values.clone(),
            query_field: self.query_field.clone(),
        }
    }
}

impl<E> fmt::Debug for Hooks<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut columns: Vec<_> = self.sql_values.keys().collect();
        columns.sort();
        f.debug_struct("Hooks")
            .field("pre_write", &self.pre_write.is_some())
            .field("post_read", &self.post_read.is_some())
            .field("sql_values", &columns)
            .field("query_field", &self.query_field.is_some())
            .finish()
    }
}

impl<E> Hooks<E> {
    /// Literal for `column`, through its override if one is installed.
    pub(crate) fn sql_value(&self, column: &str, value: &Value) -> String {
        match self.sql_values.get(column) {
            Some(render) => render(value),
            None => value.to_sql_literal(),
        }
    }

    /// SELECT expression for `column`.
    pub(crate) fn query_field(&self, column: &str) -> String {
        match &self.query_field {
            Some(rewrite) => rewrite(column),
            None => column.to_string(),
        }
    }
}
