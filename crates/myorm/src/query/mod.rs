//! SELECT assembly, pagination and execution.
//!
//! See [`Querier`] for the builder and [`QueryResult`] for the text-only result shape.

mod querier;
mod result;


pub use querier::{JoinKind, Querier};
pub use result::QueryResult;
