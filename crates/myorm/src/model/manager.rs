use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::hooks::Hooks;
use crate::check::{SharedChecker, default_checker};
use crate::client::{ExecOutcome, SqlExecutor};
use crate::condition::{Cond, Condition, Logic, build};
use crate::entity::{ColumnDef, Entity, EntityDescriptor};
use crate::error::{OrmError, OrmResult};
use crate::ident::{quote_field, quote_ident};
use crate::options::Options;
use crate::query::{Querier, QueryResult};
use crate::trace;
use crate::value::Value;

/// Statement generation, execution and row mapping for one entity kind.
///
/// The manager never holds a connection: every executing method takes the executor to run
/// against. Statement builders (`build_*_sql`) are public so SQL can be produced without one.
///
/// # Example
/// ```
/// use myorm::{Entity, ModelManager, field_map};
///
/// #[derive(Debug, Default, Entity)]
/// #[orm(table = "user", auto_increment = "id")]
/// struct User {
///     #[orm(db = "id")]
///     id: i64,
///     #[orm(db = "name")]
///     name: String,
/// }
///
/// let users = ModelManager::<User>::new();
/// let user = User { id: 0, name: "Jack".into() };
/// assert_eq!(
///     users.build_insert_sql(&user).unwrap(),
///     "INSERT INTO `user`(`name`) VALUES('Jack')"
/// );
/// assert_eq!(
///     users.build_delete_sql(field_map! { "id" => 3 }).unwrap(),
///     "DELETE FROM `user` WHERE ((`id` = 3))"
/// );
/// ```
pub struct ModelManager<E: Entity> {
    descriptor: Arc<EntityDescriptor>,
    options: Options,
    checker: Option<SharedChecker>,
    hooks: Hooks<E>,
}

impl<E: Entity> Clone for ModelManager<E> {
    fn clone(&self) -> Self {
        Self {
            descriptor: Arc::clone(&self.descriptor),
            options: self.options,
            checker: self.checker.clone(),
            hooks: self.hooks.clone(),
        }
    }
}

impl<E: Entity> fmt::Debug for ModelManager<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelManager")
            .field("table", &self.descriptor.table())
            .field("options", &self.options)
            .field("checker", &self.checker)
            .field("hooks", &self.hooks)
            .finish()
    }
}

impl<E: Entity> Default for ModelManager<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> ModelManager<E> {
    /// A manager with default options.
    pub fn new() -> Self {
        Self::with_options(Options::default())
    }

    pub fn with_options(options: Options) -> Self {
        Self {
            descriptor: EntityDescriptor::of::<E>(),
            options,
            checker: default_checker(),
            hooks: Hooks::default(),
        }
    }

    /// Replace the syntax checker used by raw queriers; `None` disables checking.
    pub fn with_checker(mut self, checker: Option<SharedChecker>) -> Self {
        self.checker = checker;
        self
    }

    /// Transform every entity before it is written.
    pub fn on_pre_write(mut self, f: impl Fn(&E) -> E + Send + Sync + 'static) -> Self {
        self.hooks.pre_write = Some(Arc::new(f));
        self
    }

    /// Transform every entity after it is decoded from a row.
    pub fn on_post_read(
        mut self,
        f: impl Fn(E, &HashMap<String, String>) -> E + Send + Sync + 'static,
    ) -> Self {
        self.hooks.post_read = Some(Arc::new(f));
        self
    }

    /// Render `column`'s values with `f` instead of the default literal coercion.
    pub fn sql_value(
        mut self,
        column: impl Into<String>,
        f: impl Fn(&Value) -> String + Send + Sync + 'static,
    ) -> Self {
        self.hooks.sql_values.insert(column.into(), Arc::new(f));
        self
    }

    /// Rewrite each column into its SELECT expression, e.g. `HEX(uid) AS uid`.
    pub fn query_field(mut self, f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.hooks.query_field = Some(Arc::new(f));
        self
    }

    pub fn descriptor(&self) -> &EntityDescriptor {
        &self.descriptor
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn table_name(&self) -> &str {
        self.descriptor.table()
    }

    pub fn database(&self) -> &str {
        self.descriptor.database()
    }

    pub fn new_and_condition(&self) -> Condition {
        Condition::and()
    }

    pub fn new_or_condition(&self) -> Condition {
        Condition::or()
    }

    /// Whether `entity` declares the managed table.
    pub fn matches(&self, entity: &E) -> bool {
        entity.table_name() == self.descriptor.table()
    }

    fn check_identity(&self, entity: &E) -> OrmResult<()> {
        if self.matches(entity) {
            Ok(())
        } else {
            Err(OrmError::identity(self.descriptor.table(), entity.table_name()))
        }
    }

    /// Quoted SELECT projection of every persisted column.
    pub fn query_fields_sql(&self) -> String {
        self.descriptor
            .column_names()
            .map(|c| quote_ident(&self.hooks.query_field(c)))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// A querier over the managed table, projecting every persisted column.
    pub fn new_querier(&self) -> Querier {
        self.querier_in(self.table_name())
    }

    /// A querier running `sql` verbatim.
    pub fn new_raw_querier(&self, sql: impl Into<String>) -> Querier {
        Querier::raw(sql)
            .with_options(&self.options)
            .with_checker(self.checker.clone())
    }

    pub(crate) fn querier_in(&self, table: &str) -> Querier {
        let mut q = Querier::new()
            .with_options(&self.options)
            .with_checker(self.checker.clone());
        q.from(table).select(self.query_fields_sql());
        q
    }

    /// Run `f` over the entity as the pre-write hook leaves it.
    fn with_written<T>(&self, entity: &E, f: impl FnOnce(&E) -> T) -> T {
        match &self.hooks.pre_write {
            Some(pre_write) => f(&pre_write(entity)),
            None => f(entity),
        }
    }

    fn column_value(&self, entity: &E, column: &ColumnDef) -> String {
        let value = entity.field_value(column.ident).unwrap_or_default();
        self.hooks.sql_value(&column.column, &value)
    }

    fn row_values<'a>(&self, entity: &E, columns: impl Iterator<Item = &'a ColumnDef>) -> String {
        columns
            .map(|c| self.column_value(entity, c))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn column_list<'a>(columns: impl Iterator<Item = &'a ColumnDef>) -> String {
        columns
            .map(|c| quote_ident(&c.column))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn require_writable(&self) -> OrmResult<()> {
        if self.descriptor.writable_columns().next().is_none() {
            return Err(OrmError::policy(format!(
                "`{}` has no writable columns",
                self.descriptor.table()
            )));
        }
        Ok(())
    }

    /// `INSERT INTO table(cols) VALUES(vals)` over every persisted non-autoincrement column.
    pub fn build_insert_sql(&self, entity: &E) -> OrmResult<String> {
        self.build_insert_sql_in(self.table_name(), entity)
    }

    pub(crate) fn build_insert_sql_in(&self, table: &str, entity: &E) -> OrmResult<String> {
        self.check_identity(entity)?;
        self.require_writable()?;
        let values = self.with_written(entity, |e| {
            self.row_values(e, self.descriptor.writable_columns())
        });
        Ok(format!(
            "INSERT INTO {}({}) VALUES({values})",
            quote_ident(table),
            Self::column_list(self.descriptor.writable_columns()),
        ))
    }

    /// Multi-row INSERT. Rows of another table are skipped; at least one must remain.
    pub fn build_batch_insert_sql(&self, entities: &[E]) -> OrmResult<String> {
        self.build_batch_insert_sql_in(self.table_name(), entities)
    }

    pub(crate) fn build_batch_insert_sql_in(&self, table: &str, entities: &[E]) -> OrmResult<String> {
        self.require_writable()?;
        let rows = self.batch_rows(entities, || self.descriptor.writable_columns())?;
        Ok(format!(
            "INSERT INTO {}({}) VALUES{rows}",
            quote_ident(table),
            Self::column_list(self.descriptor.writable_columns()),
        ))
    }

    /// `(vals),(vals)` for every matching entity.
    pub(crate) fn batch_rows<'a, I>(
        &'a self,
        entities: &[E],
        columns: impl Fn() -> I,
    ) -> OrmResult<String>
    where
        I: Iterator<Item = &'a ColumnDef>,
    {
        if entities.is_empty() {
            return Err(OrmError::policy("empty batch"));
        }
        let rows: Vec<String> = entities
            .iter()
            .filter(|e| self.matches(e))
            .map(|e| self.with_written(e, |e| format!("({})", self.row_values(e, columns()))))
            .collect();
        if rows.is_empty() {
            return Err(OrmError::policy(format!(
                "no row of the batch belongs to `{}`",
                self.descriptor.table()
            )));
        }
        Ok(rows.join(","))
    }

    /// `UPDATE table SET ... WHERE autoincrement = id` over every persisted non-autoincrement column.
    pub fn build_update_sql(&self, entity: &E) -> OrmResult<String> {
        self.build_update_sql_in(self.table_name(), entity)
    }

    pub(crate) fn build_update_sql_in(&self, table: &str, entity: &E) -> OrmResult<String> {
        self.check_identity(entity)?;
        self.require_writable()?;
        let Some(id) = self.descriptor.auto_increment_column() else {
            return Err(OrmError::policy(format!(
                "`{}` has no autoincrement column to update by",
                self.descriptor.table()
            )));
        };
        self.with_written(entity, |e| {
            let assignments = self
                .descriptor
                .writable_columns()
                .map(|c| format!("{} = {}", quote_ident(&c.column), self.column_value(e, c)))
                .collect::<Vec<_>>()
                .join(", ");
            Ok(format!(
                "UPDATE {} SET {assignments} WHERE {} = {}",
                quote_ident(table),
                quote_ident(&id.column),
                self.column_value(e, id),
            ))
        })
    }

    /// `UPDATE table SET col = val, ... WHERE cond`; refuses an empty assignment list or condition.
    pub fn build_update_sql_by_cond<K, V>(
        &self,
        params: impl IntoIterator<Item = (K, V)>,
        cond: impl Into<Cond>,
    ) -> OrmResult<String>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.build_update_sql_by_cond_in(self.table_name(), params, cond)
    }

    pub(crate) fn build_update_sql_by_cond_in<K, V>(
        &self,
        table: &str,
        params: impl IntoIterator<Item = (K, V)>,
        cond: impl Into<Cond>,
    ) -> OrmResult<String>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        let assignments: Vec<String> = params
            .into_iter()
            .map(|(column, value)| {
                let column = column.as_ref();
                let value = value.into();
                format!(
                    "{} = {}",
                    quote_field(column),
                    self.hooks.sql_value(column, &value)
                )
            })
            .collect();
        if assignments.is_empty() {
            return Err(OrmError::policy("nothing to update"));
        }
        let condition = build(&cond.into(), Logic::And)?;
        if condition.trim().is_empty() {
            return Err(OrmError::policy("update condition can not be empty"));
        }
        Ok(format!(
            "UPDATE {} SET {} WHERE {condition}",
            quote_ident(table),
            assignments.join(", ")
        ))
    }

    /// `DELETE FROM table WHERE cond`; refuses an empty condition.
    pub fn build_delete_sql(&self, cond: impl Into<Cond>) -> OrmResult<String> {
        self.build_delete_sql_in(self.table_name(), cond)
    }

    pub(crate) fn build_delete_sql_in(&self, table: &str, cond: impl Into<Cond>) -> OrmResult<String> {
        let condition = build(&cond.into(), Logic::And)?;
        if condition.trim().is_empty() {
            return Err(OrmError::policy("delete condition can not be empty"));
        }
        Ok(format!("DELETE FROM {} WHERE {condition}", quote_ident(table)))
    }

    /// Decode a text row into an entity. Unknown columns are ignored; `None` for an empty row.
    pub fn map_to_entity(&self, row: &HashMap<String, String>) -> Option<E> {
        if row.is_empty() {
            return None;
        }
        let mut entity = E::default();
        for (column, raw) in row {
            let Some(def) = self.descriptor.column(column) else {
                continue;
            };
            if let Some(value) = def.kind.decode(raw) {
                entity.set_field(def.ident, &value);
            }
        }
        Some(match &self.hooks.post_read {
            Some(post_read) => post_read(entity, row),
            None => entity,
        })
    }

    /// Live values of every persisted field, keyed by column.
    pub fn to_map(&self, entity: &E) -> OrmResult<HashMap<String, Value>> {
        self.check_identity(entity)?;
        Ok(self
            .descriptor
            .columns()
            .iter()
            .map(|c| {
                (
                    c.column.clone(),
                    entity.field_value(c.ident).unwrap_or_default(),
                )
            })
            .collect())
    }

    pub(crate) async fn run_exec<X: SqlExecutor>(
        &self,
        exec: &X,
        op: &'static str,
        sql: OrmResult<String>,
    ) -> OrmResult<ExecOutcome> {
        let sql = sql.inspect_err(|e| trace::build_failed(op, e))?;
        trace::traced(op, &sql, exec.exec(&sql)).await
    }

    /// Insert one entity; returns the generated id when the executor reports one.
    pub async fn insert<X: SqlExecutor>(&self, exec: &X, entity: &E) -> OrmResult<Option<u64>> {
        let outcome = self
            .run_exec(exec, "insert", self.build_insert_sql(entity))
            .await?;
        Ok(outcome.last_insert_id)
    }

    /// Insert every entity of the managed table in one statement; returns rows affected.
    pub async fn insert_batch<X: SqlExecutor>(&self, exec: &X, entities: &[E]) -> OrmResult<u64> {
        let outcome = self
            .run_exec(exec, "insert_batch", self.build_batch_insert_sql(entities))
            .await?;
        Ok(outcome.rows_affected)
    }

    pub async fn update<X: SqlExecutor>(&self, exec: &X, entity: &E) -> OrmResult<u64> {
        let outcome = self
            .run_exec(exec, "update", self.build_update_sql(entity))
            .await?;
        Ok(outcome.rows_affected)
    }

    pub async fn update_by_cond<X, K, V>(
        &self,
        exec: &X,
        params: impl IntoIterator<Item = (K, V)>,
        cond: impl Into<Cond>,
    ) -> OrmResult<u64>
    where
        X: SqlExecutor,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let sql = self.build_update_sql_by_cond(params, cond);
        let outcome = self.run_exec(exec, "update_by_cond", sql).await?;
        Ok(outcome.rows_affected)
    }

    pub async fn delete<X: SqlExecutor>(&self, exec: &X, cond: impl Into<Cond>) -> OrmResult<u64> {
        let outcome = self
            .run_exec(exec, "delete", self.build_delete_sql(cond))
            .await?;
        Ok(outcome.rows_affected)
    }

    fn filtered(&self, table: &str, cond: Cond, order_by: &str) -> Querier {
        let mut q = self.querier_in(table);
        q.filter(cond).order_by(order_by);
        q
    }

    /// First entity matching `cond` in `order_by` order.
    pub async fn find_one<X: SqlExecutor>(
        &self,
        exec: &X,
        cond: impl Into<Cond>,
        order_by: &str,
    ) -> OrmResult<Option<E>> {
        self.find_one_in(exec, self.table_name(), cond.into(), order_by)
            .await
    }

    pub(crate) async fn find_one_in<X: SqlExecutor>(
        &self,
        exec: &X,
        table: &str,
        cond: Cond,
        order_by: &str,
    ) -> OrmResult<Option<E>> {
        let row = self.filtered(table, cond, order_by).query_row(exec).await?;
        Ok(row.and_then(|row| self.map_to_entity(&row)))
    }

    /// Every entity matching `cond`.
    pub async fn find_all<X: SqlExecutor>(
        &self,
        exec: &X,
        cond: impl Into<Cond>,
        order_by: &str,
    ) -> OrmResult<Vec<E>> {
        self.find_all_in(exec, self.table_name(), cond.into(), order_by)
            .await
    }

    pub(crate) async fn find_all_in<X: SqlExecutor>(
        &self,
        exec: &X,
        table: &str,
        cond: Cond,
        order_by: &str,
    ) -> OrmResult<Vec<E>> {
        let result = self.filtered(table, cond, order_by).query(exec).await?;
        Ok(result
            .rows
            .iter()
            .filter_map(|row| self.map_to_entity(row))
            .collect())
    }

    /// One page of raw rows matching `cond`, with the total match count.
    pub async fn find_page<X: SqlExecutor>(
        &self,
        exec: &X,
        cond: impl Into<Cond>,
        order_by: &str,
        page: u64,
        page_size: u64,
    ) -> OrmResult<QueryResult> {
        self.find_page_in(exec, self.table_name(), cond.into(), order_by, (page, page_size))
            .await
    }

    pub(crate) async fn find_page_in<X: SqlExecutor>(
        &self,
        exec: &X,
        table: &str,
        cond: Cond,
        order_by: &str,
        (page, page_size): (u64, u64),
    ) -> OrmResult<QueryResult> {
        self.filtered(table, cond, order_by)
            .query_page(exec, page, page_size)
            .await
    }

    /// Number of rows matching `cond`.
    pub async fn count<X: SqlExecutor>(&self, exec: &X, cond: impl Into<Cond>) -> OrmResult<u64> {
        self.count_in(exec, self.table_name(), cond.into()).await
    }

    pub(crate) async fn count_in<X: SqlExecutor>(
        &self,
        exec: &X,
        table: &str,
        cond: Cond,
    ) -> OrmResult<u64> {
        self.filtered(table, cond, "").count(exec).await
    }

    /// Run a raw read and return every row.
    pub async fn query_all<X: SqlExecutor>(&self, exec: &X, sql: &str) -> OrmResult<QueryResult> {
        self.new_raw_querier(sql).query(exec).await
    }

    /// Run a raw read limited to one row.
    pub async fn query_row<X: SqlExecutor>(
        &self,
        exec: &X,
        sql: &str,
    ) -> OrmResult<Option<HashMap<String, String>>> {
        self.new_raw_querier(sql).query_row(exec).await
    }
}
