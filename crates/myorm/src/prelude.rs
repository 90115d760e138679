//! Convenient imports for typical `myorm` usage.
//!
//! ```ignore
//! use myorm::prelude::*;
//! ```

pub use crate::{
    Cond, Condition, Entity, FieldMap, Logic, ModelManager, Options, OrmError, OrmResult,
    Querier, QueryResult, ShardingModelManager, SqlExecutor, Value, field_map,
};
