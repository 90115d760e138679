//! Entity capability contract and cached column descriptors.
//!
//! Every persisted record type implements [`Entity`], usually via `#[derive(Entity)]`.
//! [`EntityDescriptor::of`] introspects the type's zero value once and caches the result,
//! keyed by `TypeId`, for the rest of the process.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use crate::value::Value;

/// Storage family of a field, used to decode row text back into the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Bool,
    Int,
    UInt,
    Float,
    /// Not decoded from rows; left at its default.
    Other,
}

impl FieldKind {
    /// Coerce raw row text into this kind. `None` for [`FieldKind::Other`].
    pub fn decode(self, raw: &str) -> Option<Value> {
        let raw = Value::Text(raw.to_string());
        Some(match self {
            FieldKind::Text => raw,
            FieldKind::Bool => Value::Bool(raw.as_bool()),
            FieldKind::Int => Value::Int(raw.as_i64()),
            FieldKind::UInt => Value::UInt(raw.as_u64()),
            FieldKind::Float => Value::Float(raw.as_f64()),
            FieldKind::Other => return None,
        })
    }
}

/// Static description of one struct field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Rust field name.
    pub ident: &'static str,
    pub kind: FieldKind,
    /// Declared `key = "value"` tag pairs.
    pub tags: &'static [(&'static str, &'static str)],
}

impl FieldDef {
    /// Value of the tag `key`, if declared.
    pub fn tag(&self, key: &str) -> Option<&'static str> {
        self.tags.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }
}

/// The capability contract of a persisted record type.
///
/// Instance methods describe the table a particular value belongs to; the manager compares
/// them with the cached descriptor before writing.
pub trait Entity: Default + Send + Sync + 'static {
    /// Table the value belongs to.
    fn table_name(&self) -> &str;

    /// Database the table lives in; empty for the connection default.
    fn database(&self) -> &str {
        ""
    }

    /// Autoincrement column, empty if none.
    fn auto_increment_field(&self) -> &str {
        ""
    }

    /// Tag key whose value names a field's column.
    fn field_tag(&self) -> &str {
        "db"
    }

    /// All fields in declaration order.
    fn fields() -> &'static [FieldDef];

    /// Live value of a persisted field.
    fn field_value(&self, ident: &str) -> Option<Value>;

    /// Assign a persisted field from an already coerced value.
    fn set_field(&mut self, ident: &str, value: &Value);
}

/// One persisted column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub column: String,
    pub ident: &'static str,
    pub kind: FieldKind,
}

/// Table metadata and the column <-> field mapping of one entity kind.
#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    table: String,
    database: String,
    auto_increment: String,
    tag: String,
    columns: Vec<ColumnDef>,
    by_column: HashMap<String, usize>,
}

impl EntityDescriptor {
    /// Cached descriptor of `E`, built on first use.
    pub fn of<E: Entity>() -> Arc<EntityDescriptor> {
        static CACHE: OnceLock<Mutex<HashMap<TypeId, Arc<EntityDescriptor>>>> = OnceLock::new();
        let cache = CACHE.get_or_init(|| Mutex::new(HashMap::new()));
        let key = TypeId::of::<E>();
        if let Some(found) = cache.lock().unwrap_or_else(PoisonError::into_inner).get(&key) {
            return found.clone();
        }

        // Built unlocked: `E::default()` may itself describe other entities.
        let built = Arc::new(Self::build::<E>());
        cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert(built)
            .clone()
    }

    /// Introspect `E::default()` without caching.
    ///
    /// Fields without a non-empty value under the entity's tag key are not persisted.
    pub fn build<E: Entity>() -> Self {
        let zero = E::default();
        let tag = zero.field_tag().to_string();

        let mut columns = Vec::new();
        let mut by_column = HashMap::new();
        for def in E::fields() {
            let Some(column) = def.tag(&tag).map(str::trim).filter(|c| !c.is_empty()) else {
                continue;
            };
            by_column.insert(column.to_string(), columns.len());
            columns.push(ColumnDef {
                column: column.to_string(),
                ident: def.ident,
                kind: def.kind,
            });
        }

        Self {
            table: zero.table_name().to_string(),
            database: zero.database().to_string(),
            auto_increment: zero.auto_increment_field().to_string(),
            tag,
            columns,
            by_column,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn auto_increment(&self) -> &str {
        &self.auto_increment
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Persisted columns in declaration order.
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.column.as_str())
    }

    /// Persisted columns except the autoincrement column.
    pub fn writable_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns
            .iter()
            .filter(move |c| !self.is_auto_increment(&c.column))
    }

    /// Look up a column by name.
    pub fn column(&self, column: &str) -> Option<&ColumnDef> {
        self.by_column.get(column).map(|&i| &self.columns[i])
    }

    /// The autoincrement column's definition, if declared and persisted.
    pub fn auto_increment_column(&self) -> Option<&ColumnDef> {
        if self.auto_increment.is_empty() {
            return None;
        }
        self.column(&self.auto_increment)
    }

    pub fn is_auto_increment(&self, column: &str) -> bool {
        !self.auto_increment.is_empty() && self.auto_increment == column
    }
}
