//! myorm-check
//!
//! Syntax pre-validation for raw SQL executed through myorm's querier.
//!
//! Queries are split and parsed with the MySQL dialect of `sqlparser`. A string holding
//! more than one statement fails the check, and the report exposes the command keyword so
//! the caller can refuse anything that is not a `SELECT`.
//!
//! # Example
//!
//! ```
//! use myorm_check::{check, StatementKind};
//!
//! let report = check("SELECT * FROM `user`");
//! assert!(report.passed);
//! assert_eq!(report.kind(), Some(StatementKind::Select));
//!
//! assert!(!check("SELEC nope").passed);
//! assert!(!check("SELECT 1; DELETE FROM `user`").passed);
//! ```

pub mod error;
pub mod sql_check;

pub use error::{CheckError, CheckResult};
pub use sql_check::{
    CheckReport, StatementKind, check, detect_statement_kind, normalize_query, split_statements,
};
