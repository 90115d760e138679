//! Derive macros for myorm
//!
//! Provides `#[derive(Entity)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod entity;

/// Derive the `Entity` capability contract for a struct.
///
/// # Example
///
/// ```ignore
/// use myorm::Entity;
///
/// #[derive(Debug, Default, Entity)]
/// #[orm(table = "user", database = "shop", auto_increment = "id")]
/// struct User {
///     #[orm(db = "id")]
///     id: i64,
///     #[orm(db = "user_name", json = "name")]
///     name: String,
///     // not persisted: no `db` tag
///     cache_hits: u32,
/// }
/// ```
///
/// # Attributes
///
/// Struct level:
/// - `#[orm(table = "name")]` - table name (defaults to the snake_case struct name)
/// - `#[orm(database = "name")]` - database name (defaults to empty)
/// - `#[orm(auto_increment = "column")]` - autoincrement column (defaults to empty)
/// - `#[orm(tag = "key")]` - tag key selecting persisted fields (defaults to `db`)
///
/// Field level:
/// - `#[orm(key = "value", ...)]` - arbitrary tag pairs; the value under the entity's tag
///   key is the column name. Fields without it are not persisted.
///
/// Persisted fields must be convertible into `myorm::Value`. Fields of type `String`, `bool`,
/// or a primitive integer/float are decoded from rows; other types are left at their default.
#[proc_macro_derive(Entity, attributes(orm))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    entity::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
