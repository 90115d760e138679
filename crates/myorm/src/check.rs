//! Syntax checking of raw queries.
//!
//! Raw SQL handed to a querier is checked before it runs: it must parse and it must be a
//! read. Generated statements skip the check.

use std::fmt;
use std::sync::Arc;

use crate::error::{OrmError, OrmResult};

/// Verdict of a [`SyntaxChecker`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyntaxCheck {
    pub passed: bool,
    /// Upper-cased command keyword, e.g. `SELECT`.
    pub command: String,
    pub error: Option<String>,
}

impl SyntaxCheck {
    /// Turn the verdict into a result: failed checks and non-SELECT commands are rejected.
    pub fn require_select(&self, sql: &str) -> OrmResult<()> {
        if !self.passed {
            let reason = self.error.as_deref().unwrap_or("check failed");
            return Err(OrmError::syntax_check(format!("{reason}: {sql}")));
        }
        if !self.command.eq_ignore_ascii_case("SELECT") {
            return Err(OrmError::syntax_check(format!(
                "only SELECT is allowed, got {}",
                if self.command.is_empty() { "unknown command" } else { &self.command }
            )));
        }
        Ok(())
    }
}

/// Checks raw SQL before execution.
pub trait SyntaxChecker: Send + Sync {
    fn check(&self, sql: &str) -> SyntaxCheck;
}

impl<F> SyntaxChecker for F
where
    F: Fn(&str) -> SyntaxCheck + Send + Sync,
{
    fn check(&self, sql: &str) -> SyntaxCheck {
        self(sql)
    }
}

/// Shared handle to a checker.
#[derive(Clone)]
pub struct SharedChecker(pub Arc<dyn SyntaxChecker>);

impl SharedChecker {
    pub fn new(checker: impl SyntaxChecker + 'static) -> Self {
        Self(Arc::new(checker))
    }

    pub fn check(&self, sql: &str) -> SyntaxCheck {
        self.0.check(sql)
    }
}

impl fmt::Debug for SharedChecker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedChecker")
    }
}

/// The checker installed by default: `myorm-check`'s MySQL parser.
#[cfg(feature = "check")]
#[derive(Debug, Clone, Copy, Default)]
pub struct ParserChecker;

#[cfg(feature = "check")]
impl SyntaxChecker for ParserChecker {
    fn check(&self, sql: &str) -> SyntaxCheck {
        let report = myorm_check::check(sql);
        SyntaxCheck {
            passed: report.passed,
            command: report.command,
            error: report.error.map(|e| e.to_string()),
        }
    }
}

/// The default checker, if one is compiled in.
pub fn default_checker() -> Option<SharedChecker> {
    #[cfg(feature = "check")]
    {
        Some(SharedChecker::new(ParserChecker))
    }
    #[cfg(not(feature = "check"))]
    {
        None
    }
}
