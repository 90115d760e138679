use std::collections::HashMap;

use super::QueryResult;
use crate::check::{SharedChecker, default_checker};
use crate::client::SqlExecutor;
use crate::condition::{Cond, Logic, build};
use crate::error::{OrmError, OrmResult};
use crate::ident::quote_ident;
use crate::options::Options;
use crate::trace;

/// How a joined table is combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

impl JoinKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
            JoinKind::Right => "RIGHT",
        }
    }
}

#[derive(Debug, Clone)]
struct Join {
    kind: JoinKind,
    table: String,
    on: String,
}

/// SELECT assembly and execution.
///
/// A querier either assembles its statement from parts (table, projection, joins, WHERE,
/// GROUP BY / HAVING, ORDER BY, LIMIT) or runs a raw statement verbatim. Raw statements are
/// syntax checked and must be a `SELECT`; assembled statements are not checked.
///
/// # Example
/// ```
/// use myorm::{Querier, field_map};
///
/// let mut q = Querier::new();
/// q.select("id, name")
///     .from("user")
///     .filter(field_map! { "status" => 1 })
///     .order_by("id DESC")
///     .limit(10);
/// assert_eq!(
///     q.build_sql().unwrap(),
///     "SELECT id, name FROM `user` WHERE ((`status` = 1)) ORDER BY id DESC LIMIT 0,10"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Querier {
    table: String,
    fields: String,
    joins: Vec<Join>,
    filter: Option<Cond>,
    group_by: String,
    having: Option<Cond>,
    order_by: String,
    offset: u64,
    limit: u64,
    raw: Option<String>,
    syntax_check: bool,
    checker: Option<SharedChecker>,
}

impl Default for Querier {
    fn default() -> Self {
        Self::new()
    }
}

impl Querier {
    /// An empty querier with default options and the default syntax checker.
    pub fn new() -> Self {
        Self {
            table: String::new(),
            fields: String::new(),
            joins: Vec::new(),
            filter: None,
            group_by: String::new(),
            having: None,
            order_by: String::new(),
            offset: 0,
            limit: 0,
            raw: None,
            syntax_check: Options::default().syntax_check,
            checker: default_checker(),
        }
    }

    /// A querier that runs `sql` verbatim.
    pub fn raw(sql: impl Into<String>) -> Self {
        let mut q = Self::new();
        q.raw = Some(sql.into());
        q
    }

    /// Apply manager options.
    pub fn with_options(mut self, options: &Options) -> Self {
        self.syntax_check = options.syntax_check;
        self
    }

    /// Replace the syntax checker; `None` disables raw query checking.
    pub fn with_checker(mut self, checker: Option<SharedChecker>) -> Self {
        self.checker = checker;
        self
    }

    /// Projection, e.g. `"id, name"`. Empty means `*`.
    pub fn select(&mut self, fields: impl Into<String>) -> &mut Self {
        self.fields = fields.into();
        self
    }

    pub fn from(&mut self, table: impl Into<String>) -> &mut Self {
        self.table = table.into();
        self
    }

    pub fn join(&mut self, table: impl Into<String>, on: impl Into<String>) -> &mut Self {
        self.push_join(JoinKind::Inner, table.into(), on.into())
    }

    pub fn left_join(&mut self, table: impl Into<String>, on: impl Into<String>) -> &mut Self {
        self.push_join(JoinKind::Left, table.into(), on.into())
    }

    pub fn right_join(&mut self, table: impl Into<String>, on: impl Into<String>) -> &mut Self {
        self.push_join(JoinKind::Right, table.into(), on.into())
    }

    fn push_join(&mut self, kind: JoinKind, table: String, on: String) -> &mut Self {
        self.joins.push(Join { kind, table, on });
        self
    }

    /// WHERE specification, combined with AND at the top level.
    pub fn filter(&mut self, cond: impl Into<Cond>) -> &mut Self {
        self.filter = Some(cond.into());
        self
    }

    pub fn group_by(&mut self, expr: impl Into<String>) -> &mut Self {
        self.group_by = expr.into();
        self
    }

    /// HAVING specification; only rendered with a GROUP BY.
    pub fn having(&mut self, cond: impl Into<Cond>) -> &mut Self {
        self.having = Some(cond.into());
        self
    }

    pub fn order_by(&mut self, expr: impl Into<String>) -> &mut Self {
        self.order_by = expr.into();
        self
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.offset = offset;
        self
    }

    /// Row limit; 0 means unlimited.
    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.limit = limit;
        self
    }

    pub fn is_raw(&self) -> bool {
        self.raw.is_some()
    }

    fn check_raw(&self, sql: &str) -> OrmResult<()> {
        if !self.syntax_check {
            return Ok(());
        }
        match &self.checker {
            Some(checker) => checker.check(sql).require_select(sql),
            None => Ok(()),
        }
    }

    fn build_where(&self) -> OrmResult<String> {
        match &self.filter {
            Some(cond) => build(cond, Logic::And),
            None => Ok(String::new()),
        }
    }

    /// `FROM table [JOIN ...] [WHERE ...]`, shared by the row and count statements.
    fn build_from_where(&self, sql: &mut String) -> OrmResult<()> {
        let table = self.table.trim();
        if table.is_empty() {
            return Err(OrmError::validation("query table not specified"));
        }
        sql.push_str(" FROM ");
        sql.push_str(&quote_ident(table));

        for join in &self.joins {
            if join.table.trim().is_empty() {
                return Err(OrmError::validation("empty join table name"));
            }
            if join.on.trim().is_empty() {
                return Err(OrmError::validation("join condition empty"));
            }
            sql.push(' ');
            sql.push_str(join.kind.as_str());
            sql.push_str(" JOIN ");
            sql.push_str(&quote_ident(&join.table));
            sql.push_str(" ON ");
            sql.push_str(join.on.trim());
        }

        let condition = self.build_where()?;
        if !condition.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&condition);
        }
        Ok(())
    }

    /// The statement [`Querier::query`] will run.
    pub fn build_sql(&self) -> OrmResult<String> {
        if let Some(raw) = &self.raw {
            self.check_raw(raw)?;
            return Ok(self.raw_with_limit(raw));
        }

        let mut sql = String::from("SELECT ");
        let fields = self.fields.trim();
        sql.push_str(if fields.is_empty() { "*" } else { fields });
        self.build_from_where(&mut sql)?;

        let group_by = self.group_by.trim();
        if !group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(group_by);
            if let Some(having) = &self.having {
                let having = build(having, Logic::And)?;
                if !having.is_empty() {
                    sql.push_str(" HAVING ");
                    sql.push_str(&having);
                }
            }
        }

        let order_by = self.order_by.trim();
        if !order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(order_by);
        }

        if self.limit > 0 {
            sql.push_str(&format!(" LIMIT {},{}", self.offset, self.limit));
        }
        Ok(sql)
    }

    /// Raw statements run verbatim unless a limit was set and they carry none of their own.
    fn raw_with_limit(&self, raw: &str) -> String {
        let raw = raw.trim().trim_end_matches(';').trim_end();
        if self.limit > 0 && !raw.to_ascii_lowercase().contains(" limit ") {
            format!("{raw} LIMIT {},{}", self.offset, self.limit)
        } else {
            raw.to_string()
        }
    }

    /// The `SELECT COUNT(0)` statement matching this query's rows, ignoring pagination.
    ///
    /// Raw statements without a separate filter are cut textually from the first ` from `
    /// up to the earliest of the last ` order `, ` group ` and ` limit `. The cut does not
    /// understand subqueries or literals containing those words.
    pub fn build_count_sql(&self) -> OrmResult<String> {
        match &self.raw {
            Some(raw) if self.filter.is_none() => {
                self.check_raw(raw)?;
                count_from_raw(raw)
            }
            _ => {
                let mut sql = String::from("SELECT COUNT(0)");
                self.build_from_where(&mut sql)?;
                Ok(sql)
            }
        }
    }

    fn built(&self, op: &'static str, result: OrmResult<String>) -> OrmResult<String> {
        if let Err(e) = &result {
            trace::build_failed(op, e);
        }
        result
    }

    /// Run the query.
    pub async fn query<X: SqlExecutor>(&self, exec: &X) -> OrmResult<QueryResult> {
        let sql = self.built("query", self.build_sql())?;
        let rows = trace::traced("query", &sql, exec.query(&sql)).await?;
        Ok(QueryResult::from(rows))
    }

    /// Run the query with `LIMIT 1` and return the first row.
    pub async fn query_row<X: SqlExecutor>(
        &mut self,
        exec: &X,
    ) -> OrmResult<Option<HashMap<String, String>>> {
        self.limit(1);
        let mut result = self.query(exec).await?;
        if result.rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(result.rows.swap_remove(0)))
    }

    /// First column of the first row; `None` when nothing matched.
    pub async fn query_scalar<X: SqlExecutor>(&self, exec: &X) -> OrmResult<Option<String>> {
        let sql = self.built("query_scalar", self.build_sql())?;
        let rows = trace::traced("query_scalar", &sql, exec.query(&sql)).await?;
        Ok(rows.first_cell().map(|cell| cell.unwrap_or_default().to_string()))
    }

    /// Number of rows matching the query, ignoring pagination.
    pub async fn count<X: SqlExecutor>(&self, exec: &X) -> OrmResult<u64> {
        let sql = self.built("count", self.build_count_sql())?;
        let rows = trace::traced("count", &sql, exec.query(&sql)).await?;
        parse_count(rows.first_cell())
    }

    /// Fetch page `page` (1-based) of `page_size` rows.
    ///
    /// A page whose offset overflows is a validation error and issues no SQL.
    /// The total is counted first, then the page is read. The two statements are separate
    /// round trips and are not consistent with each other under concurrent writes.
    pub async fn query_page<X: SqlExecutor>(
        &mut self,
        exec: &X,
        page: u64,
        page_size: u64,
    ) -> OrmResult<QueryResult> {
        let offset = (page.max(1) - 1).checked_mul(page_size).ok_or_else(|| {
            OrmError::validation(format!("page {page} of size {page_size} is out of range"))
        })?;
        self.offset(offset).limit(page_size);
        let total = self.count(exec).await?;
        let mut result = self.query(exec).await?;
        result.total_count = total;
        Ok(result)
    }
}

fn count_from_raw(raw: &str) -> OrmResult<String> {
    let raw = raw.trim().trim_end_matches(';').trim_end();
    // ASCII lowering keeps byte offsets aligned with `raw`.
    let lower = raw.to_ascii_lowercase();
    let Some(from) = lower.find(" from ") else {
        return Err(OrmError::validation(format!(
            "cannot derive a count query without FROM: {raw}"
        )));
    };
    let end = [" order ", " group ", " limit "]
        .iter()
        .filter_map(|kw| lower.rfind(kw))
        .filter(|&pos| pos > from)
        .min()
        .unwrap_or(raw.len());
    Ok(format!("SELECT COUNT(0){}", &raw[from..end]))
}

fn parse_count(cell: Option<Option<&str>>) -> OrmResult<u64> {
    match cell {
        Some(Some(text)) => text
            .trim()
            .parse()
            .map_err(|_| OrmError::decode("COUNT(0)", format!("not a count: {text:?}"))),
        Some(None) => Err(OrmError::decode("COUNT(0)", "NULL count")),
        None => Err(OrmError::decode("COUNT(0)", "count query returned no rows")),
    }
}
