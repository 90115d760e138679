//! # myorm
//!
//! A metadata-driven MySQL mapping and SQL generation engine.
//!
//! ## Features
//!
//! - **Declared entities**: `#[derive(Entity)]` maps tagged struct fields to columns, and the
//!   column mapping is introspected once per type
//! - **Condition specs**: raw fragments, field maps (`"age >" => 18`), map lists and nested
//!   AND/OR trees compile into parenthesized WHERE / HAVING expressions
//! - **CRUD statements**: INSERT, batch INSERT, UPDATE by id or by condition, DELETE, and
//!   REPLACE INTO for sharded tables
//! - **Safe defaults**: DELETE and condition UPDATE refuse an empty WHERE
//! - **Querier**: SELECT assembly with joins, grouping, ordering and `LIMIT offset,limit`
//!   pagination, or raw reads validated by a syntax checker
//! - **Sharding**: `{table}_{key mod tables}` / `{database}_{index}` resolution per call
//! - **Executor agnostic**: every operation takes a [`SqlExecutor`]; no driver is bundled
//!
//! ## Example
//!
//! ```
//! use myorm::{Entity, ModelManager, Condition};
//!
//! #[derive(Debug, Default, Entity)]
//! #[orm(table = "user", auto_increment = "id")]
//! struct User {
//!     #[orm(db = "id")]
//!     id: i64,
//!     #[orm(db = "name")]
//!     name: String,
//!     #[orm(db = "age")]
//!     age: i32,
//! }
//!
//! let users = ModelManager::<User>::new();
//!
//! let mut adults = Condition::and();
//! adults.add("age >=", 18);
//! assert_eq!(
//!     users.build_update_sql_by_cond([("name", "anon")], adults).unwrap(),
//!     "UPDATE `user` SET `name` = 'anon' WHERE (((`age` >= 18)))"
//! );
//!
//! let mut q = users.new_querier();
//! q.filter(myorm::field_map! { "id IN" => [1, 2, 3] }).limit(10);
//! assert_eq!(
//!     q.build_sql().unwrap(),
//!     "SELECT `id`,`name`,`age` FROM `user` WHERE ((`id` IN (1, 2, 3))) LIMIT 0,10"
//! );
//! ```

extern crate self as myorm;

pub mod check;
pub mod client;
pub mod condition;
pub mod entity;
pub mod error;
pub mod ident;
pub mod model;
pub mod options;
pub mod prelude;
pub mod query;
pub mod trace;
pub mod value;

#[cfg(test)]
mod testing;

pub use check::{SharedChecker, SyntaxCheck, SyntaxChecker};
pub use client::{ExecOutcome, RowSet, SqlExecutor};
pub use condition::{Arg, Cond, Condition, FieldMap, Logic, Op};
pub use entity::{ColumnDef, Entity, EntityDescriptor, FieldDef, FieldKind};
pub use error::{BoxError, OrmError, OrmResult};
pub use ident::{quote_field, quote_ident};
pub use model::{ModelManager, ShardingModelManager};
pub use options::{Options, ShardConfig};
pub use query::{JoinKind, Querier, QueryResult};
pub use value::{FromValue, Value, escape_sql_value};

#[cfg(feature = "check")]
pub use check::ParserChecker;

#[cfg(feature = "derive")]
pub use myorm_derive::Entity;
