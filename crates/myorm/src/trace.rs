//! `tracing` integration.
//!
//! Every statement is emitted at DEBUG under the `myorm.sql` target before it runs, and
//! executor failures are emitted at ERROR before being returned. Attach any subscriber to
//! see them, e.g. `RUST_LOG=myorm.sql=debug`.

use std::future::Future;

use crate::error::OrmResult;

/// Target of generated SQL events.
pub const SQL_TARGET: &str = "myorm.sql";
/// Target of querier assembly failures.
pub const QUERIER_TARGET: &str = "myorm.querier";

/// SQL longer than this (in bytes) is cut in log output.
pub const MAX_LOGGED_SQL: usize = 2000;

/// Truncate `sql` to at most `max_bytes`, backing off to a char boundary.
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

fn loggable(sql: &str) -> String {
    if sql.len() > MAX_LOGGED_SQL {
        format!("{}...", truncate_sql_bytes(sql, MAX_LOGGED_SQL))
    } else {
        sql.to_string()
    }
}

/// Log `sql`, run it, and log the failure if it fails.
pub(crate) async fn traced<T, F>(op: &'static str, sql: &str, run: F) -> OrmResult<T>
where
    F: Future<Output = OrmResult<T>>,
{
    let shown = loggable(sql);
    tracing::debug!(target: SQL_TARGET, op, sql = %shown);
    let result = run.await;
    if let Err(e) = &result {
        tracing::error!(target: SQL_TARGET, op, sql = %shown, error = %e, "statement failed");
    }
    result
}

/// Log a statement that failed to assemble.
pub(crate) fn build_failed(op: &'static str, err: &crate::OrmError) {
    tracing::error!(target: QUERIER_TARGET, op, error = %err, "failed to build statement");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_sql_is_untouched() {
        assert_eq!(truncate_sql_bytes("SELECT 1", 100), "SELECT 1");
        assert_eq!(loggable("SELECT 1"), "SELECT 1");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // 'é' is two bytes
        assert_eq!(truncate_sql_bytes("aé", 2), "a");
        assert_eq!(truncate_sql_bytes("abc", 2), "ab");
    }

    #[test]
    fn long_sql_is_marked() {
        let sql = "x".repeat(MAX_LOGGED_SQL + 10);
        let shown = loggable(&sql);
        assert_eq!(shown.len(), MAX_LOGGED_SQL + 3);
        assert!(shown.ends_with("..."));
    }
}
