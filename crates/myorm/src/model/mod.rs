//! Entity-level CRUD: statement generation, execution and row mapping.
//!
//! [`ModelManager`] addresses the entity's declared table; [`ShardingModelManager`] addresses
//! the shard table selected by a key. Both generate MySQL statements from the cached
//! [`EntityDescriptor`](crate::EntityDescriptor) and run them through a caller-supplied
//! [`SqlExecutor`](crate::SqlExecutor).

mod hooks;
mod manager;
mod sharding;

#[cfg(test)]
mod tests;

pub use hooks::{PostReadFn, PreWriteFn, QueryFieldFn, SqlValueFn};
pub use manager::ModelManager;
pub use sharding::ShardingModelManager;
