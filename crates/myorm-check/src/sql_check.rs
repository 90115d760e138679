//! Syntax checking for raw SQL handed to the querier.
//!
//! A query is split into statements with the MySQL tokenizer and must hold exactly one.
//! That statement is parsed with the MySQL dialect. The report carries the normalized text
//! (line breaks folded into spaces, surrounding whitespace trimmed) and the upper-cased
//! command so callers can reject anything that is not a read.

use serde::Serialize;
use sqlparser::ast::Statement;
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::{Location, Token, TokenWithSpan, Tokenizer};

use crate::error::{CheckError, CheckResult};

/// Coarse statement classification derived from the checked command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    Select,
    Insert,
    Replace,
    Update,
    Delete,
    Other,
}

impl StatementKind {
    fn from_command(command: &str) -> Self {
        match command {
            "SELECT" => StatementKind::Select,
            "INSERT" => StatementKind::Insert,
            "REPLACE" => StatementKind::Replace,
            "UPDATE" => StatementKind::Update,
            "DELETE" => StatementKind::Delete,
            _ => StatementKind::Other,
        }
    }
}

/// Outcome of [`check`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    /// The normalized statement (empty when splitting failed).
    pub sql: String,
    /// Upper-cased command keyword, e.g. `SELECT`.
    pub command: String,
    /// Whether the statement parsed.
    pub passed: bool,
    /// Failure detail when `passed` is false.
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<CheckError>,
}

fn serialize_error<S>(error: &Option<CheckError>, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match error {
        Some(e) => s.serialize_some(&e.to_string()),
        None => s.serialize_none(),
    }
}

impl CheckReport {
    fn failed(sql: String, error: CheckError) -> Self {
        Self {
            sql,
            command: String::new(),
            passed: false,
            error: Some(error),
        }
    }

    /// Statement kind of a passed report; `None` when the check failed.
    pub fn kind(&self) -> Option<StatementKind> {
        self.passed
            .then(|| StatementKind::from_command(&self.command))
    }

    /// Returns true if the statement passed and is a read.
    pub fn is_select(&self) -> bool {
        self.kind() == Some(StatementKind::Select)
    }
}

/// Check a raw SQL string.
///
/// # Example
/// ```
/// use myorm_check::check;
///
/// let report = check("SELECT * FROM `user` WHERE `id` = 1");
/// assert!(report.passed);
/// assert_eq!(report.command, "SELECT");
/// ```
pub fn check(query: &str) -> CheckReport {
    let statement = match single_statement(query) {
        Ok(statement) => statement,
        Err(e) => return CheckReport::failed(String::new(), e),
    };
    let sql = match normalize_query(statement) {
        Ok(sql) => sql,
        Err(e) => return CheckReport::failed(String::new(), e),
    };

    // Parse the unfolded text: folding would pull the rest of a line into a `--` comment.
    let statements = match Parser::parse_sql(&MySqlDialect {}, statement) {
        Ok(statements) => statements,
        Err(e) => return CheckReport::failed(sql, CheckError::Parse(e.to_string())),
    };

    let command = match statements.as_slice() {
        [Statement::Query(_)] => "SELECT".to_string(),
        [_] => leading_keyword(&sql),
        [] => return CheckReport::failed(sql, CheckError::Empty),
        many => return CheckReport::failed(sql, CheckError::MultipleStatements(many.len())),
    };

    CheckReport {
        sql,
        command,
        passed: true,
        error: None,
    }
}

/// Detect the statement kind of a query, or `None` when it does not parse.
pub fn detect_statement_kind(query: &str) -> Option<StatementKind> {
    check(query).kind()
}

/// Fold line breaks into spaces and trim.
pub fn normalize_query(query: &str) -> CheckResult<String> {
    let folded = query.replace(['\n', '\r'], " ");
    let trimmed = folded.trim();
    if trimmed.is_empty() {
        return Err(CheckError::Empty);
    }
    Ok(trimmed.to_string())
}

/// Split `sql` on top-level `;` tokens, returning slices of the original text.
///
/// Semicolons inside literals, quoted identifiers and comments belong to their token and
/// do not split. Segments holding only whitespace or comments are dropped.
pub fn split_statements(sql: &str) -> CheckResult<Vec<&str>> {
    let tokens = Tokenizer::new(&MySqlDialect {}, sql)
        .tokenize_with_location()
        .map_err(|e| CheckError::Tokenize(e.to_string()))?;
    let lines = line_starts(sql);

    let mut statements = Vec::new();
    let mut start = 0;
    let mut has_content = false;
    for TokenWithSpan { token, span } in tokens {
        match token {
            Token::SemiColon => {
                let end = byte_offset(sql, &lines, span.start);
                if has_content {
                    statements.push(sql[start..end].trim());
                }
                start = end + 1;
                has_content = false;
            }
            Token::Whitespace(_) | Token::EOF => {}
            _ => has_content = true,
        }
    }
    if has_content {
        statements.push(sql[start..].trim());
    }
    Ok(statements)
}

fn single_statement(query: &str) -> CheckResult<&str> {
    match split_statements(query)?.as_slice() {
        [] => Err(CheckError::Empty),
        [statement] => Ok(*statement),
        many => Err(CheckError::MultipleStatements(many.len())),
    }
}

/// Byte offset of each line start.
fn line_starts(sql: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(sql.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

/// Byte offset of a 1-based tokenizer location (columns count chars).
fn byte_offset(sql: &str, lines: &[usize], at: Location) -> usize {
    let Some(&line_start) = lines.get((at.line as usize).saturating_sub(1)) else {
        return sql.len();
    };
    sql[line_start..]
        .char_indices()
        .nth((at.column as usize).saturating_sub(1))
        .map_or(sql.len(), |(i, _)| line_start + i)
}

fn leading_keyword(sql: &str) -> String {
    sql.trim_start_matches('(')
        .split(|c: char| !c.is_ascii_alphabetic())
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_passes() {
        let report = check("SELECT `id`,`name` FROM `user` WHERE (`id` = 1) LIMIT 0,10");
        assert!(report.passed, "{:?}", report.error);
        assert_eq!(report.command, "SELECT");
        assert!(report.is_select());
    }

    #[test]
    fn lowercase_select_reports_upper_command() {
        let report = check("select count(0) from user");
        assert!(report.passed);
        assert_eq!(report.command, "SELECT");
    }

    #[test]
    fn delete_reports_delete() {
        let report = check("DELETE FROM `user` WHERE `id` = 3");
        assert!(report.passed);
        assert_eq!(report.command, "DELETE");
        assert_eq!(report.kind(), Some(StatementKind::Delete));
        assert!(!report.is_select());
    }

    #[test]
    fn update_reports_update() {
        assert_eq!(
            detect_statement_kind("UPDATE user SET name = 'x' WHERE id = 1"),
            Some(StatementKind::Update)
        );
    }

    #[test]
    fn garbage_fails() {
        let report = check("SELEC * FORM user");
        assert!(!report.passed);
        assert!(matches!(report.error, Some(CheckError::Parse(_))));
        assert_eq!(report.kind(), None);
    }

    #[test]
    fn empty_query_fails() {
        let report = check(" \n\r ");
        assert!(!report.passed);
        assert_eq!(report.error, Some(CheckError::Empty));
    }

    #[test]
    fn multiple_statements_fail() {
        let report = check("SELECT * FROM user; DELETE FROM user");
        assert!(!report.passed);
        assert_eq!(report.error, Some(CheckError::MultipleStatements(2)));
        assert_eq!(report.kind(), None);
    }

    #[test]
    fn trailing_semicolon_and_comment_are_one_statement() {
        let report = check("SELECT 1 FROM t; -- done\n");
        assert!(report.passed, "{:?}", report.error);
        assert_eq!(report.sql, "SELECT 1 FROM t");
    }

    #[test]
    fn statement_after_line_comment_is_counted() {
        let report = check("SELECT 1 FROM t -- note\n; DELETE FROM t");
        assert_eq!(report.error, Some(CheckError::MultipleStatements(2)));
    }

    #[test]
    fn line_comment_spans_lines_before_parsing() {
        let report = check("SELECT id -- primary key\nFROM t");
        assert!(report.passed, "{:?}", report.error);
        assert_eq!(report.command, "SELECT");
    }

    #[test]
    fn newlines_are_folded() {
        assert_eq!(
            normalize_query("SELECT *\nFROM user\r\nWHERE id = 1").unwrap(),
            "SELECT * FROM user  WHERE id = 1"
        );
    }

    #[test]
    fn semicolon_inside_quotes_does_not_split() {
        assert_eq!(
            split_statements("SELECT 'a;b' FROM t; SELECT `c;d` FROM t").unwrap(),
            ["SELECT 'a;b' FROM t", "SELECT `c;d` FROM t"]
        );
        assert_eq!(
            split_statements("SELECT 1 /* ; */ FROM t;;").unwrap(),
            ["SELECT 1 /* ; */ FROM t"]
        );
    }

    #[test]
    fn statements_keep_their_original_text() {
        assert_eq!(
            split_statements("SELECT 'it\\'s;' FROM t;\nSELECT 'é'").unwrap(),
            ["SELECT 'it\\'s;' FROM t", "SELECT 'é'"]
        );
        let report = check("SELECT * FROM t WHERE name = 'it\\'s'");
        assert!(report.passed, "{:?}", report.error);
    }

    #[test]
    fn unterminated_literal_is_a_tokenize_error() {
        assert!(matches!(
            split_statements("SELECT 'oops FROM t"),
            Err(CheckError::Tokenize(_))
        ));
        assert!(matches!(
            check("SELECT 1 /* never closed").error,
            Some(CheckError::Tokenize(_))
        ));
    }

    #[test]
    fn report_serializes_error_as_text() {
        let json = serde_json::to_value(check("")).unwrap();
        assert_eq!(json["passed"], false);
        assert_eq!(json["error"], "invalid or empty query");
    }
}
