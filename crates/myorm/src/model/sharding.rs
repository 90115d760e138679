use std::collections::HashMap;
use std::fmt;

use super::ModelManager;
use crate::client::SqlExecutor;
use crate::condition::Cond;
use crate::entity::Entity;
use crate::error::{OrmError, OrmResult};
use crate::ident::quote_ident;
use crate::options::Options;
use crate::query::{Querier, QueryResult};
use crate::value::Value;

/// A [`ModelManager`] whose table and database are partitioned by a shard key.
///
/// With key `K`, `T` table shards and `D` database shards the target is table
/// `{table}_{K mod T}` in database `{database}_{(K mod T) / D}`. The target is resolved on
/// every call, so changing the key redirects the next statement. There is no fallback to the
/// unsharded name: a disabled configuration or a non-positive key is an error.
///
/// ```
/// use myorm::{Entity, Options, ShardingModelManager};
///
/// #[derive(Default, Entity)]
/// #[orm(table = "log", database = "app")]
/// struct Log {
///     #[orm(db = "id")]
///     id: i64,
/// }
///
/// let mut logs = ShardingModelManager::<Log>::new(Options::sharding(4, 2));
/// logs.use_sharding(7);
/// assert_eq!(logs.table_name().unwrap(), "log_3");
/// assert_eq!(logs.database().unwrap(), "app_1");
/// ```
pub struct ShardingModelManager<E: Entity> {
    inner: ModelManager<E>,
    shard_key: i64,
}

impl<E: Entity> Clone for ShardingModelManager<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            shard_key: self.shard_key,
        }
    }
}

impl<E: Entity> fmt::Debug for ShardingModelManager<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardingModelManager")
            .field("inner", &self.inner)
            .field("shard_key", &self.shard_key)
            .finish()
    }
}

impl<E: Entity> ShardingModelManager<E> {
    pub fn new(options: Options) -> Self {
        Self::from_manager(ModelManager::with_options(options))
    }

    /// Wrap a configured manager; its options decide the shard layout.
    pub fn from_manager(manager: ModelManager<E>) -> Self {
        Self {
            inner: manager,
            shard_key: 0,
        }
    }

    /// Select the shard for subsequent calls.
    pub fn use_sharding(&mut self, key: i64) -> &mut Self {
        self.shard_key = key;
        self
    }

    pub fn shard_key(&self) -> i64 {
        self.shard_key
    }

    /// The wrapped manager, addressing the unsharded table.
    pub fn manager(&self) -> &ModelManager<E> {
        &self.inner
    }

    pub fn manager_mut(&mut self) -> &mut ModelManager<E> {
        &mut self.inner
    }

    /// `(table_index, db_index)` for the current key.
    pub fn resolve(&self) -> OrmResult<(i64, i64)> {
        let sharding = self.inner.options().sharding;
        if !sharding.enabled || sharding.db_count <= 0 || sharding.table_count <= 0 {
            return Err(OrmError::sharding("SHARDING_UNAVAILABLE"));
        }
        if self.shard_key <= 0 {
            return Err(OrmError::sharding("SHARDING_VALUE_INVALID"));
        }
        let table = self.shard_key % sharding.table_count;
        Ok((table, table / sharding.db_count))
    }

    pub fn table_name(&self) -> OrmResult<String> {
        let (table, _) = self.resolve()?;
        Ok(format!("{}_{table}", self.inner.table_name()))
    }

    pub fn database(&self) -> OrmResult<String> {
        let (_, db) = self.resolve()?;
        Ok(format!("{}_{db}", self.inner.database()))
    }

    pub fn matches(&self, entity: &E) -> bool {
        self.inner.matches(entity)
    }

    /// A querier over the shard table.
    pub fn new_querier(&self) -> OrmResult<Querier> {
        Ok(self.inner.querier_in(&self.table_name()?))
    }

    pub fn new_raw_querier(&self, sql: impl Into<String>) -> Querier {
        self.inner.new_raw_querier(sql)
    }

    pub fn build_insert_sql(&self, entity: &E) -> OrmResult<String> {
        self.inner.build_insert_sql_in(&self.table_name()?, entity)
    }

    pub fn build_batch_insert_sql(&self, entities: &[E]) -> OrmResult<String> {
        self.inner
            .build_batch_insert_sql_in(&self.table_name()?, entities)
    }

    /// `REPLACE INTO` over every persisted column, the autoincrement column included.
    ///
    /// Rows of another table are skipped; at least one must remain.
    pub fn build_replace_into_sql(&self, entities: &[E]) -> OrmResult<String> {
        let table = self.table_name()?;
        let descriptor = self.inner.descriptor();
        let rows = self
            .inner
            .batch_rows(entities, || descriptor.columns().iter())?;
        let columns = descriptor
            .column_names()
            .map(quote_ident)
            .collect::<Vec<_>>()
            .join(",");
        Ok(format!(
            "REPLACE INTO {}({columns}) VALUES{rows}",
            quote_ident(&table)
        ))
    }

    pub fn build_update_sql(&self, entity: &E) -> OrmResult<String> {
        self.inner.build_update_sql_in(&self.table_name()?, entity)
    }

    pub fn build_update_sql_by_cond<K, V>(
        &self,
        params: impl IntoIterator<Item = (K, V)>,
        cond: impl Into<Cond>,
    ) -> OrmResult<String>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.inner
            .build_update_sql_by_cond_in(&self.table_name()?, params, cond)
    }

    pub fn build_delete_sql(&self, cond: impl Into<Cond>) -> OrmResult<String> {
        self.inner.build_delete_sql_in(&self.table_name()?, cond)
    }

    pub fn map_to_entity(&self, row: &HashMap<String, String>) -> Option<E> {
        self.inner.map_to_entity(row)
    }

    pub fn to_map(&self, entity: &E) -> OrmResult<HashMap<String, Value>> {
        self.inner.to_map(entity)
    }

    pub async fn insert<X: SqlExecutor>(&self, exec: &X, entity: &E) -> OrmResult<Option<u64>> {
        let outcome = self
            .inner
            .run_exec(exec, "insert", self.build_insert_sql(entity))
            .await?;
        Ok(outcome.last_insert_id)
    }

    pub async fn insert_batch<X: SqlExecutor>(&self, exec: &X, entities: &[E]) -> OrmResult<u64> {
        let sql = self.build_batch_insert_sql(entities);
        let outcome = self.inner.run_exec(exec, "insert_batch", sql).await?;
        Ok(outcome.rows_affected)
    }

    /// Upsert every entity of the managed table into the shard table.
    pub async fn replace_into<X: SqlExecutor>(&self, exec: &X, entities: &[E]) -> OrmResult<u64> {
        let sql = self.build_replace_into_sql(entities);
        let outcome = self.inner.run_exec(exec, "replace_into", sql).await?;
        Ok(outcome.rows_affected)
    }

    pub async fn update<X: SqlExecutor>(&self, exec: &X, entity: &E) -> OrmResult<u64> {
        let outcome = self
            .inner
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
        let outcome = self.inner.run_exec(exec, "update_by_cond", sql).await?;
        Ok(outcome.rows_affected)
    }

    pub async fn delete<X: SqlExecutor>(&self, exec: &X, cond: impl Into<Cond>) -> OrmResult<u64> {
        let outcome = self
            .inner
            .run_exec(exec, "delete", self.build_delete_sql(cond))
            .await?;
        Ok(outcome.rows_affected)
    }

    pub async fn find_one<X: SqlExecutor>(
        &self,
        exec: &X,
        cond: impl Into<Cond>,
        order_by: &str,
    ) -> OrmResult<Option<E>> {
        let table = self.table_name()?;
        self.inner
            .find_one_in(exec, &table, cond.into(), order_by)
            .await
    }

    pub async fn find_all<X: SqlExecutor>(
        &self,
        exec: &X,
        cond: impl Into<Cond>,
        order_by: &str,
    ) -> OrmResult<Vec<E>> {
        let table = self.table_name()?;
        self.inner
            .find_all_in(exec, &table, cond.into(), order_by)
            .await
    }

    pub async fn find_page<X: SqlExecutor>(
        &self,
        exec: &X,
        cond: impl Into<Cond>,
        order_by: &str,
        page: u64,
        page_size: u64,
    ) -> OrmResult<QueryResult> {
        let table = self.table_name()?;
        self.inner
            .find_page_in(exec, &table, cond.into(), order_by, (page, page_size))
            .await
    }

    pub async fn count<X: SqlExecutor>(&self, exec: &X, cond: impl Into<Cond>) -> OrmResult<u64> {
        let table = self.table_name()?;
        self.inner.count_in(exec, &table, cond.into()).await
    }

    pub async fn query_all<X: SqlExecutor>(&self, exec: &X, sql: &str) -> OrmResult<QueryResult> {
        self.inner.query_all(exec, sql).await
    }

    pub async fn query_row<X: SqlExecutor>(
        &self,
        exec: &X,
        sql: &str,
    ) -> OrmResult<Option<HashMap<String, String>>> {
        self.inner.query_row(exec, sql).await
    }
}
