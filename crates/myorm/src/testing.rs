//! In-memory executor for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::client::{ExecOutcome, RowSet, SqlExecutor};
use crate::error::{OrmError, OrmResult};

/// Records every statement and replays scripted results.
#[derive(Default)]
pub(crate) struct MockExecutor {
    statements: Mutex<Vec<String>>,
    rows: Mutex<VecDeque<RowSet>>,
    outcome: ExecOutcome,
    failure: Option<String>,
}

impl MockExecutor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue a result for the next `query` call.
    pub(crate) fn push_rows(&self, rows: RowSet) -> &Self {
        self.rows.lock().unwrap().push_back(rows);
        self
    }

    /// Queue a single-cell result, as returned by COUNT queries.
    pub(crate) fn push_count(&self, n: u64) -> &Self {
        self.push_rows(RowSet::new(vec!["COUNT(0)".into()]).with_row([Some(n.to_string())]))
    }

    pub(crate) fn with_outcome(mut self, outcome: ExecOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// Make every call fail with `message`.
    pub(crate) fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub(crate) fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }

    fn record(&self, sql: &str) -> OrmResult<()> {
        self.statements.lock().unwrap().push(sql.to_string());
        match &self.failure {
            Some(message) => Err(OrmError::query(message.clone())),
            None => Ok(()),
        }
    }
}

impl SqlExecutor for MockExecutor {
    async fn exec(&self, sql: &str) -> OrmResult<ExecOutcome> {
        self.record(sql)?;
        Ok(self.outcome)
    }

    async fn query(&self, sql: &str) -> OrmResult<RowSet> {
        self.record(sql)?;
        Ok(self.rows.lock().unwrap().pop_front().unwrap_or_default())
    }
}
